//! Identity Resolution
//!
//! For each roster member, queries the directory's person search and keeps
//! the candidates that pass two rule tables:
//! - **Name test**: the candidate display name must contain the member's
//!   first and last name (case-insensitive substrings), which tolerates
//!   middle initials, name-order variants, and honorifics in the
//!   directory's free-text name field.
//! - **Affiliation test**: the candidate affiliation text must contain at
//!   least one allow-list entry (case-insensitive).
//!
//! A member yielding zero identities is a normal outcome, not an error.
//! One member's search failure is contained: it is logged, recorded in the
//! run report, and the remaining members proceed.

use crate::directory::Directory;
use crate::types::{
    AuthorIdentity, CandidateMatch, FailureStage, PipelineError, PipelineResult, RosterRecord,
    RunReport,
};
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;

/// Name rule: candidate display name contains both roster names
///
/// Case-insensitive on both sides. Substring containment (rather than
/// equality) is what catches "Doe, Jane A." and "Dr. Jane Doe" alike.
pub fn display_name_matches(record: &RosterRecord, display_name: &str) -> bool {
    let name = display_name.to_lowercase();
    name.contains(&record.last_name.to_lowercase())
        && name.contains(&record.first_name.to_lowercase())
}

/// Affiliation rule: text contains at least one allow-list entry
///
/// Case-insensitive throughout. The allow-list carries every spelling and
/// abbreviation the institution (and closely-affiliated ones) appears
/// under; a single exact-substring entry also covers a specific external
/// organization.
pub fn affiliation_allowed(allow_list: &[String], affiliation_text: &str) -> bool {
    let affiliation = affiliation_text.to_lowercase();
    allow_list
        .iter()
        .any(|entry| affiliation.contains(&entry.to_lowercase()))
}

/// Resolve one roster member against the directory
///
/// Issues a single search (first result page only) and filters candidates
/// through the name and affiliation rules. Identities are deduplicated by
/// profile ref within this member: the directory lists the same person
/// once per co-authorship, all pointing at the same profile.
///
/// # Errors
/// Propagates the search's transport error; the caller decides whether to
/// contain it.
pub async fn resolve_member<D: Directory + ?Sized>(
    directory: &D,
    record: &RosterRecord,
    allow_list: &[String],
) -> Result<Vec<AuthorIdentity>, crate::directory::DirectoryError> {
    let query = record.search_query();
    let candidates = directory.search_people(&query).await?;

    if candidates.is_empty() {
        tracing::info!("{} isn't returning any search results", record.full_name);
        return Ok(vec![]);
    }

    let mut seen_profiles: HashSet<String> = HashSet::new();
    let mut identities = Vec::new();

    for CandidateMatch {
        display_name,
        affiliation_text,
        profile_ref,
    } in candidates
    {
        if !display_name_matches(record, &display_name) {
            tracing::debug!(
                "Skipping candidate '{}' for {}: name mismatch",
                display_name,
                record.full_name
            );
            continue;
        }
        if !affiliation_allowed(allow_list, &affiliation_text) {
            tracing::debug!(
                "Skipping candidate '{}' for {}: affiliation '{}' not in allow-list",
                display_name,
                record.full_name,
                affiliation_text
            );
            continue;
        }
        if !seen_profiles.insert(profile_ref.clone()) {
            continue;
        }

        tracing::info!("{} - {}", display_name, profile_ref);
        identities.push(AuthorIdentity::new(display_name, profile_ref));
    }

    Ok(identities)
}

/// Resolve the whole roster into a deduplicated author-identity set
///
/// Members are processed in roster order; identities keep the order they
/// were found in. Cancellation is checked between members.
///
/// # Errors
/// Only `PipelineError::Cancelled`; per-member search failures are
/// contained and recorded in the report.
pub async fn resolve_identities<D: Directory + ?Sized>(
    directory: &D,
    roster: &[RosterRecord],
    allow_list: &[String],
    cancel_token: &CancellationToken,
    report: &mut RunReport,
) -> PipelineResult<Vec<AuthorIdentity>> {
    let mut identities = Vec::new();

    for record in roster {
        if cancel_token.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let query = record.search_query();
        tracing::info!("Searching directory for '{}'", query);

        match resolve_member(directory, record, allow_list).await {
            Ok(found) if found.is_empty() => {
                tracing::info!(
                    "{} doesn't appear to be an author on anything this year",
                    record.full_name
                );
                report
                    .members_without_presentations
                    .push(record.full_name.clone());
            }
            Ok(found) => identities.extend(found),
            Err(e) => {
                tracing::warn!("Search failed for '{}': {}", query, e);
                report.push_failure(FailureStage::Resolution, query, e.to_string());
                report
                    .members_without_presentations
                    .push(record.full_name.clone());
            }
        }
    }

    report.identities_resolved = identities.len();
    Ok(identities)
}
