//! # confsched-sb - Schedule Builder
//!
//! Builds a consolidated presenter schedule from a roster of people and an
//! external conference-directory service: who is presenting, what, when,
//! and where, rendered as a chronological schedule plus an author index.
//!
//! Stage modules, leaves first:
//! - [`types`] - entity model and failure taxonomy
//! - [`roster`] - roster loading and exhaustive validation
//! - [`directory`] - the directory capability trait and its HTTP client
//! - [`resolver`] - roster members → author identities
//! - [`discovery`] - identities → classified talk records
//! - [`normalize`] - raw date/time text → canonical timestamps
//! - [`aggregate`] - deduplication and sorting
//! - [`render`] - the final document and its HTML form
//! - [`pipeline`] - stage orchestration and the run report

pub mod aggregate;
pub mod directory;
pub mod discovery;
pub mod normalize;
pub mod pipeline;
pub mod render;
pub mod resolver;
pub mod roster;
pub mod types;

pub use pipeline::Pipeline;
pub use types::{PipelineError, RunReport, ScheduleDocument};
