//! Talk Discovery & Classification
//!
//! Walks each resolved identity's profile listing and turns it into
//! `TalkRecord`s:
//! - Convened sessions are attributed unconditionally (chairing is
//!   unambiguous) and typed `ConveningSession`.
//! - Paper items count only when the identity is the primary author: the
//!   rendered top-author text must contain the identity's display name.
//!   Co-authored items are out of scope for a presenter schedule.
//!
//! Paper types come from the item code in the link text via an ordered
//! rule table; the code itself is stripped from the stored title.

use crate::directory::{Directory, PaperListItem, ProfileListing, SessionListItem};
use crate::types::{
    AuthorIdentity, FailureStage, PipelineError, PipelineResult, RunReport, TalkRecord, TalkType,
};
use tokio_util::sync::CancellationToken;

/// Ordered classification rules; first match wins
///
/// Codes are section identifiers like "T51A-0345" or "PP43C-1234". "T" is
/// checked first, so any code containing a T classifies as a Talk even
/// when another fragment also appears.
const CODE_RULES: &[(&str, TalkType)] = &[
    ("T", TalkType::Talk),
    ("PP", TalkType::Poster),
    ("EP", TalkType::ElectronicPoster),
    ("U", TalkType::Poster),
    ("HH", TalkType::Talk),
];

/// Classify a paper item by its code fragment
pub fn classify_item_code(code: &str) -> TalkType {
    for (fragment, talk_type) in CODE_RULES {
        if code.contains(fragment) {
            return *talk_type;
        }
    }
    TalkType::Presentation
}

/// Remove the item code from link text to form the title
pub fn strip_item_code(link_text: &str, code: &str) -> String {
    link_text.replace(code, "").trim().to_string()
}

fn talk_from_session(identity: &AuthorIdentity, item: &SessionListItem) -> TalkRecord {
    TalkRecord::new(
        &item.item_ref,
        &item.link_text,
        TalkType::ConveningSession,
        &identity.display_name,
    )
}

fn talk_from_paper(identity: &AuthorIdentity, item: &PaperListItem) -> Option<TalkRecord> {
    // The first presenter's name in the rendered author line is the only
    // visible primary-authorship signal the directory exposes.
    if !item.top_author_text.contains(&identity.display_name) {
        return None;
    }

    let (talk_type, title) = match &item.item_code {
        Some(code) => (classify_item_code(code), strip_item_code(&item.link_text, code)),
        None => (TalkType::Event, item.link_text.trim().to_string()),
    };

    Some(TalkRecord::new(
        &item.item_ref,
        title,
        talk_type,
        &identity.display_name,
    ))
}

/// Turn one profile listing into talk records for its identity
pub fn collect_talks(identity: &AuthorIdentity, listing: &ProfileListing) -> Vec<TalkRecord> {
    let mut talks = Vec::new();

    for session in &listing.sessions {
        talks.push(talk_from_session(identity, session));
    }
    for paper in &listing.papers {
        if let Some(talk) = talk_from_paper(identity, paper) {
            talks.push(talk);
        } else {
            tracing::debug!(
                "Skipping '{}': {} is not the primary author",
                paper.link_text,
                identity.display_name
            );
        }
    }

    talks
}

/// Discover talks for every identity, enriching `identity.talks` in place
///
/// Cancellation is checked between identities. A listing fetch failure is
/// contained: the identity contributes zero talks and the rest proceed.
///
/// # Errors
/// Only `PipelineError::Cancelled`.
pub async fn discover_talks<D: Directory + ?Sized>(
    directory: &D,
    identities: &mut [AuthorIdentity],
    cancel_token: &CancellationToken,
    report: &mut RunReport,
) -> PipelineResult<()> {
    for identity in identities.iter_mut() {
        if cancel_token.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        tracing::info!(
            "Retrieving primary author submissions for {}",
            identity.display_name
        );

        let listing = match directory.fetch_profile(&identity.profile_ref).await {
            Ok(listing) => listing,
            Err(e) => {
                tracing::warn!("Profile fetch failed for {}: {}", identity.profile_ref, e);
                report.push_failure(
                    FailureStage::Discovery,
                    identity.profile_ref.clone(),
                    e.to_string(),
                );
                continue;
            }
        };

        for talk in collect_talks(identity, &listing) {
            tracing::debug!("{}: {} - {}", identity.display_name, talk.talk_type, talk.title);
            identity.talks.insert(talk.talk_ref.clone(), talk);
        }
    }

    report.talks_discovered = identities.iter().map(|i| i.talks.len()).sum();
    Ok(())
}
