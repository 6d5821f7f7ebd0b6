//! Core Types for the Schedule Builder
//!
//! Defines the entity model handed between the pipeline stages:
//! - **Roster Validator** produces `RosterRecord`
//! - **Identity Resolver** consumes `CandidateMatch`, produces `AuthorIdentity`
//! - **Talk Discovery** and the **Normalizer** enrich `AuthorIdentity.talks`
//! - **Aggregator** and **Renderer** produce the final `ScheduleDocument`
//!
//! Each record is owned by the stage that creates it; later stages receive
//! it by value or immutable reference and never reach back into a prior
//! stage's data.

use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

// ============================================================================
// Roster Types
// ============================================================================

/// One validated roster member
///
/// All fields are non-empty once validation has passed; the record is
/// immutable after load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterRecord {
    /// Full name as written in the roster (may carry middle names)
    pub full_name: String,
    /// First name, used for directory queries and candidate matching
    pub first_name: String,
    /// Last-name initial, kept for roster cross-checks
    pub last_initial: String,
    /// Last name, used for directory queries and candidate matching
    pub last_name: String,
}

impl RosterRecord {
    /// Directory search query for this member
    ///
    /// First and last name only: middle names and initials in `full_name`
    /// cause false negatives in the directory's person search.
    pub fn search_query(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// ============================================================================
// Directory Candidate Types
// ============================================================================

/// One entry from a directory person search
///
/// Ephemeral: consumed during identity resolution and not kept afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateMatch {
    /// Name as the directory renders it (free text, may embed honorifics)
    pub display_name: String,
    /// Affiliation as the directory renders it (free text)
    pub affiliation_text: String,
    /// Stable reference to the person's profile page
    pub profile_ref: String,
}

// ============================================================================
// Author Identity Types
// ============================================================================

/// A directory profile matched to a roster member
///
/// The same physical person may appear under several directory profiles
/// with different display-name spellings; identities are never merged.
/// Duplicate *talks* across identities collapse later, keyed by talk ref.
#[derive(Debug, Clone)]
pub struct AuthorIdentity {
    /// Name as the directory renders it
    pub display_name: String,
    /// Surname extracted from `display_name`, for the index sort
    pub last_name: String,
    /// Stable reference to the profile page
    pub profile_ref: String,
    /// Talks discovered for this identity, keyed by talk ref (keys unique)
    pub talks: BTreeMap<String, TalkRecord>,
}

impl AuthorIdentity {
    /// Create an identity for a candidate that passed the filters
    pub fn new(display_name: impl Into<String>, profile_ref: impl Into<String>) -> Self {
        let display_name = display_name.into();
        let last_name = derive_last_name(&display_name);
        Self {
            display_name,
            last_name,
            profile_ref: profile_ref.into(),
            talks: BTreeMap::new(),
        }
    }
}

/// Extract the surname from a directory display name
///
/// Takes the trailing run of word characters and hyphens, so
/// "Jane A. Doe-Smith" yields "Doe-Smith" and trailing punctuation is
/// ignored.
pub fn derive_last_name(display_name: &str) -> String {
    let trimmed = display_name.trim_end_matches(|c: char| !c.is_alphanumeric() && c != '-');
    let tail: String = trimmed
        .chars()
        .rev()
        .take_while(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    tail.chars().rev().collect()
}

// ============================================================================
// Talk Types
// ============================================================================

/// Presentation format, derived from the item code in the listing link text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TalkType {
    /// Chairing or convening a session or workshop
    ConveningSession,
    Talk,
    Poster,
    ElectronicPoster,
    /// Paper item whose code matched no classification rule
    Presentation,
    /// Paper item carrying no code at all
    Event,
}

impl fmt::Display for TalkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ConveningSession => "Convening Session",
            Self::Talk => "Talk",
            Self::Poster => "Poster",
            Self::ElectronicPoster => "Electronic Poster",
            Self::Presentation => "Presentation",
            Self::Event => "Event",
        };
        f.write_str(label)
    }
}

/// One presentation, session, or poster
///
/// `canonical_timestamp` stays `None` until the Normalizer parses the raw
/// date/time text; records without it are excluded from the sorted schedule
/// but remain visible in diagnostics.
#[derive(Debug, Clone)]
pub struct TalkRecord {
    /// Detail-page reference; globally stable, the deduplication key
    pub talk_ref: String,
    /// Title with any item code stripped out
    pub title: String,
    pub talk_type: TalkType,
    /// Name of the presenting author as shown on the identity that found it
    pub first_author_name: String,
    /// Date text exactly as the detail page renders it
    pub raw_date: String,
    /// Time-range text exactly as the detail page renders it
    pub raw_time: String,
    /// Room or venue text from the detail page
    pub location: String,
    /// Parsed, sortable start time; no timezone conversion is applied
    pub canonical_timestamp: Option<NaiveDateTime>,
}

impl TalkRecord {
    /// Create a talk as Discovery finds it, before detail enrichment
    pub fn new(
        talk_ref: impl Into<String>,
        title: impl Into<String>,
        talk_type: TalkType,
        first_author_name: impl Into<String>,
    ) -> Self {
        Self {
            talk_ref: talk_ref.into(),
            title: title.into(),
            talk_type,
            first_author_name: first_author_name.into(),
            raw_date: String::new(),
            raw_time: String::new(),
            location: String::new(),
            canonical_timestamp: None,
        }
    }
}

// ============================================================================
// Schedule Document Types
// ============================================================================

/// Talks for one calendar day of the schedule
#[derive(Debug, Clone)]
pub struct DayGroup {
    /// Day header, e.g. "Friday, 17 December 2021"
    pub header: String,
    pub talks: Vec<TalkRecord>,
}

/// One line of the author index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorIndexEntry {
    pub display_name: String,
    pub profile_ref: String,
}

/// The terminal artifact: a chronologically grouped schedule plus an
/// alphabetical author index
#[derive(Debug, Clone)]
pub struct ScheduleDocument {
    /// Introductory paragraph placed before the schedule table
    pub intro_text: String,
    /// Descriptive timezone label printed next to every time
    pub timezone_label: String,
    /// Day groups in chronological order
    pub days: Vec<DayGroup>,
    /// Authors sorted by surname
    pub author_index: Vec<AuthorIndexEntry>,
}

// ============================================================================
// Failure Taxonomy
// ============================================================================

/// One missing or empty field in the roster file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterDefect {
    /// 1-based record number in the roster file
    pub row: usize,
    /// Field name that was missing or empty
    pub field: &'static str,
}

/// Fatal roster validation error
///
/// Carries every defect found, not just the first, so the whole roster can
/// be fixed in one pass. Raised before any network activity.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub defects: Vec<RosterDefect>,
}

impl std::error::Error for ValidationError {}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "roster validation failed with {} defect(s):", self.defects.len())?;
        for defect in &self.defects {
            write!(f, " [row {} field '{}']", defect.row, defect.field)?;
        }
        Ok(())
    }
}

/// Pipeline stage in which a contained, per-unit failure occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// One person's directory search failed; they contribute no identities
    Resolution,
    /// One identity's profile listing fetch failed; it contributes no talks
    Discovery,
    /// One talk's detail fetch or date/time parse failed; it is excluded
    /// from the sorted schedule only
    Normalization,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Resolution => "resolution",
            Self::Discovery => "discovery",
            Self::Normalization => "normalization",
        };
        f.write_str(label)
    }
}

/// Structured record of one contained failure
///
/// Every per-unit failure produces one of these in the run report, in
/// addition to the tracing line emitted where it happened.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub stage: FailureStage,
    /// The entity that failed: a query, profile ref, or talk ref
    pub subject: String,
    pub reason: String,
}

/// Fatal pipeline errors; everything else is isolated-and-continue
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Whole-run cancellation; no partial document is emitted
    #[error("run cancelled")]
    Cancelled,

    #[error("roster error: {0}")]
    Roster(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

// ============================================================================
// Run Report
// ============================================================================

/// Counters and diagnostics accumulated across one run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub roster_members: usize,
    pub identities_resolved: usize,
    pub talks_discovered: usize,
    /// Talks that parsed cleanly and made it into the sorted schedule
    pub talks_scheduled: usize,
    /// Members whose search returned nothing usable (a normal outcome)
    pub members_without_presentations: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl RunReport {
    /// Record a contained failure with its tracing line already emitted
    pub fn push_failure(
        &mut self,
        stage: FailureStage,
        subject: impl Into<String>,
        reason: impl Into<String>,
    ) {
        self.diagnostics.push(Diagnostic {
            stage,
            subject: subject.into(),
            reason: reason.into(),
        });
    }
}
