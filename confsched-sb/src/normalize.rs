//! Schedule Normalization
//!
//! Fetches each discovered talk's detail page and turns its raw date and
//! time-range text into a canonical, sortable timestamp. The directory
//! renders dates like "Friday, 17 December 2021" and time ranges like
//! "14:10 - 14:25"; the start time is concatenated onto the date and
//! parsed with one fixed pattern.
//!
//! Best-effort contract: a fetch or parse failure leaves the talk without
//! a timestamp (excluded from the sorted schedule, visible in
//! diagnostics) and never aborts the run.

use crate::directory::Directory;
use crate::types::{AuthorIdentity, FailureStage, PipelineError, PipelineResult, RunReport};
use chrono::NaiveDateTime;
use tokio_util::sync::CancellationToken;

/// Canonical pattern the concatenated date + start time must match
const DATE_TIME_PATTERN: &str = "%A, %d %B %Y %H:%M";

/// Extract the start time from a time-range string
///
/// Takes the text before the range separator, e.g. "14:10 - 14:25" →
/// "14:10". A range with no separator is treated as a bare start time.
pub fn extract_start_time(time_text: &str) -> Option<String> {
    let start = match time_text.split_once('-') {
        Some((before, _)) => before.trim(),
        None => time_text.trim(),
    };
    if start.is_empty() {
        None
    } else {
        Some(start.to_string())
    }
}

/// Parse raw date and time-range text into the canonical timestamp
///
/// # Errors
/// Returns a human-readable reason when the start time cannot be
/// extracted or the concatenated text does not match
/// "<weekday>, <day> <month> <year> <HH:MM>". chrono also rejects a
/// weekday that contradicts the date, which catches scrambled pages.
pub fn parse_canonical_timestamp(
    date_text: &str,
    time_text: &str,
) -> Result<NaiveDateTime, String> {
    let start_time = extract_start_time(time_text)
        .ok_or_else(|| format!("no start time in '{}'", time_text))?;
    let raw_date_time = format!("{} {}", date_text.trim(), start_time);

    NaiveDateTime::parse_from_str(&raw_date_time, DATE_TIME_PATTERN)
        .map_err(|e| format!("'{}' did not match expected format: {}", raw_date_time, e))
}

/// Fetch detail pages and fill timing fields for every talk lacking one
///
/// Raw date, time, and location are stored on the record whether or not
/// the parse succeeds. Cancellation is checked before each detail fetch.
///
/// # Errors
/// Only `PipelineError::Cancelled`.
pub async fn normalize_schedule<D: Directory + ?Sized>(
    directory: &D,
    identities: &mut [AuthorIdentity],
    cancel_token: &CancellationToken,
    report: &mut RunReport,
) -> PipelineResult<()> {
    for identity in identities.iter_mut() {
        for talk in identity.talks.values_mut() {
            if talk.canonical_timestamp.is_some() {
                continue;
            }
            if cancel_token.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }

            let detail = match directory.fetch_talk_detail(&talk.talk_ref).await {
                Ok(detail) => detail,
                Err(e) => {
                    tracing::warn!("Detail fetch failed for {}: {}", talk.talk_ref, e);
                    report.push_failure(
                        FailureStage::Normalization,
                        talk.talk_ref.clone(),
                        e.to_string(),
                    );
                    continue;
                }
            };

            talk.raw_date = detail.date_text;
            talk.raw_time = detail.time_text;
            talk.location = detail.location;

            match parse_canonical_timestamp(&talk.raw_date, &talk.raw_time) {
                Ok(timestamp) => {
                    talk.canonical_timestamp = Some(timestamp);
                    tracing::info!(
                        "{} {} - {}: {}",
                        talk.raw_date,
                        talk.raw_time,
                        talk.talk_type,
                        talk.title
                    );
                }
                Err(reason) => {
                    tracing::warn!(
                        "Unparseable schedule for {} (date '{}', time '{}'): {}",
                        talk.talk_ref,
                        talk.raw_date,
                        talk.raw_time,
                        reason
                    );
                    report.push_failure(
                        FailureStage::Normalization,
                        talk.talk_ref.clone(),
                        format!(
                            "date '{}', time '{}': {}",
                            talk.raw_date, talk.raw_time, reason
                        ),
                    );
                }
            }
        }
    }

    Ok(())
}
