//! Roster loading and validation
//!
//! The roster is the authoritative list of people whose presentations are
//! sought: a TOML file with one `[[member]]` table per person. Validation
//! is exhaustive — every missing or empty field across the whole file is
//! collected before failing — and a failed validation aborts the run
//! before any network activity. No partial roster is ever passed
//! downstream.

use crate::types::{PipelineError, PipelineResult, RosterDefect, RosterRecord, ValidationError};
use serde::Deserialize;
use std::path::Path;

/// One roster row as read from the file, before validation
///
/// Fields are optional here so that a missing key and an empty value
/// produce the same defect report instead of a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRosterRow {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_initial: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RosterFile {
    #[serde(default)]
    member: Vec<RawRosterRow>,
}

/// Validate raw roster rows into `RosterRecord`s
///
/// # Errors
/// Returns `ValidationError` carrying every `(row, field)` defect found.
/// Row numbers are 1-based over the record sequence.
pub fn validate(rows: &[RawRosterRow]) -> Result<Vec<RosterRecord>, ValidationError> {
    let mut defects = Vec::new();
    let mut records = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        let row_number = index + 1;
        let mut field = |name: &'static str, value: &Option<String>| -> String {
            match value {
                Some(text) if !text.trim().is_empty() => text.clone(),
                _ => {
                    defects.push(RosterDefect {
                        row: row_number,
                        field: name,
                    });
                    String::new()
                }
            }
        };

        let record = RosterRecord {
            full_name: field("full_name", &row.full_name),
            first_name: field("first_name", &row.first_name),
            last_initial: field("last_initial", &row.last_initial),
            last_name: field("last_name", &row.last_name),
        };
        records.push(record);
    }

    if defects.is_empty() {
        Ok(records)
    } else {
        Err(ValidationError { defects })
    }
}

/// Load and validate the roster file
///
/// # Errors
/// - `PipelineError::Roster` when the file cannot be read or parsed
/// - `PipelineError::Validation` when any row has a missing/empty field
pub fn load_roster(path: &Path) -> PipelineResult<Vec<RosterRecord>> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        PipelineError::Roster(format!("Failed to read roster {}: {}", path.display(), e))
    })?;
    let file: RosterFile = toml::from_str(&text).map_err(|e| {
        PipelineError::Roster(format!("Failed to parse roster {}: {}", path.display(), e))
    })?;

    tracing::info!(
        "Roster loaded: {} member(s) from {}",
        file.member.len(),
        path.display()
    );

    let records = validate(&file.member)?;
    tracing::info!("Roster validation passed: {} record(s)", records.len());
    Ok(records)
}
