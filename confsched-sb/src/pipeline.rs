//! Pipeline Orchestration
//!
//! Runs the five stages in order and carries the run report across them:
//!
//! 1. Validation - load and exhaustively validate the roster (fatal on
//!    defects, before any network activity)
//! 2. Resolution - roster members → deduplicated author identities
//! 3. Discovery - identities → classified talk records
//! 4. Normalization - talk records → canonical timestamps
//! 5. Aggregation & Rendering - one deduplicated, sorted schedule document
//!
//! Per-unit failures inside stages 2-4 are contained and recorded; only
//! roster validation and whole-run cancellation abort. A cancelled run
//! emits no partial document.

use crate::aggregate::{sorted_authors, sorted_talks};
use crate::directory::Directory;
use crate::render::build_document;
use crate::types::{PipelineError, PipelineResult, RunReport, ScheduleDocument};
use crate::{discovery, normalize, resolver, roster};
use confsched_common::config::TomlConfig;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Schedule-building pipeline over a directory implementation
pub struct Pipeline<D: Directory> {
    directory: D,
    config: TomlConfig,
}

impl<D: Directory> Pipeline<D> {
    pub fn new(directory: D, config: TomlConfig) -> Self {
        Self { directory, config }
    }

    /// Execute the full pipeline for one roster file
    ///
    /// # Returns
    /// The finished document and the run report (counters plus one
    /// structured diagnostic per contained failure).
    ///
    /// # Errors
    /// - `PipelineError::Roster` / `PipelineError::Validation` - the
    ///   roster could not be read, parsed, or validated
    /// - `PipelineError::Cancelled` - the token fired; nothing is emitted
    pub async fn execute(
        &self,
        roster_path: &Path,
        cancel_token: CancellationToken,
    ) -> PipelineResult<(ScheduleDocument, RunReport)> {
        let mut report = RunReport::default();

        tracing::info!("Phase 1: VALIDATION");
        let roster = roster::load_roster(roster_path)?;
        report.roster_members = roster.len();

        if cancel_token.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        tracing::info!("Phase 2: RESOLUTION ({} roster member(s))", roster.len());
        let mut identities = resolver::resolve_identities(
            &self.directory,
            &roster,
            &self.config.matching.affiliation_allow_list,
            &cancel_token,
            &mut report,
        )
        .await?;
        tracing::info!("Resolved {} author identit(ies)", identities.len());

        tracing::info!("Phase 3: DISCOVERY");
        discovery::discover_talks(&self.directory, &mut identities, &cancel_token, &mut report)
            .await?;
        tracing::info!("Discovered {} talk(s)", report.talks_discovered);

        tracing::info!("Phase 4: NORMALIZATION");
        normalize::normalize_schedule(&self.directory, &mut identities, &cancel_token, &mut report)
            .await?;

        tracing::info!("Phase 5: AGGREGATION");
        let talks = sorted_talks(&identities);
        let authors = sorted_authors(&identities);
        report.talks_scheduled = talks.len();

        let document = build_document(&talks, &authors, &self.config.output);

        tracing::info!(
            "Run complete: {} member(s), {} identit(ies), {} talk(s) discovered, {} scheduled, {} contained failure(s)",
            report.roster_members,
            report.identities_resolved,
            report.talks_discovered,
            report.talks_scheduled,
            report.diagnostics.len()
        );

        Ok((document, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::testing::MockDirectory;
    use crate::directory::{PaperListItem, ProfileListing, TalkDetail};
    use crate::types::{CandidateMatch, FailureStage, TalkType};
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn write_roster(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("roster.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    const JANE_ROSTER: &str = r#"
        [[member]]
        full_name = "Jane A. Doe"
        first_name = "Jane"
        last_initial = "A"
        last_name = "Doe"
    "#;

    fn config() -> TomlConfig {
        TomlConfig::from_toml_str(
            r#"
            [matching]
            affiliation_allow_list = ["mass", "whoi"]
            "#,
        )
        .unwrap()
    }

    fn jane_directory() -> MockDirectory {
        let mut mock = MockDirectory::default();
        mock.search_results.insert(
            "Jane Doe".to_string(),
            vec![CandidateMatch {
                display_name: "Jane Doe".to_string(),
                affiliation_text: "Example University, UMass Campus".to_string(),
                profile_ref: "P1".to_string(),
            }],
        );
        mock.profiles.insert(
            "P1".to_string(),
            ProfileListing {
                sessions: vec![],
                papers: vec![PaperListItem {
                    item_ref: "https://x/talk/1".to_string(),
                    link_text: "PP123 Holocene Records".to_string(),
                    item_code: Some("PP123".to_string()),
                    top_author_text: "Jane Doe".to_string(),
                }],
            },
        );
        mock.details.insert(
            "https://x/talk/1".to_string(),
            TalkDetail {
                date_text: "Friday, 17 December 2021".to_string(),
                time_text: "14:10 - 14:25".to_string(),
                location: "Hall B".to_string(),
            },
        );
        mock
    }

    #[tokio::test]
    async fn end_to_end_single_presenter() {
        let dir = tempfile::tempdir().unwrap();
        let roster_path = write_roster(&dir, JANE_ROSTER);

        let pipeline = Pipeline::new(jane_directory(), config());
        let (document, report) = pipeline
            .execute(&roster_path, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.roster_members, 1);
        assert_eq!(report.identities_resolved, 1);
        assert_eq!(report.talks_discovered, 1);
        assert_eq!(report.talks_scheduled, 1);
        assert!(report.diagnostics.is_empty());

        assert_eq!(document.days.len(), 1);
        assert_eq!(document.days[0].header, "Friday, 17 December 2021");
        let talk = &document.days[0].talks[0];
        assert_eq!(talk.talk_type, TalkType::Poster);
        assert_eq!(talk.title, "Holocene Records");
        assert_eq!(
            talk.canonical_timestamp.unwrap(),
            NaiveDate::from_ymd_opt(2021, 12, 17)
                .unwrap()
                .and_hms_opt(14, 10, 0)
                .unwrap()
        );

        assert_eq!(document.author_index.len(), 1);
        assert_eq!(document.author_index[0].display_name, "Jane Doe");
    }

    #[tokio::test]
    async fn invalid_roster_aborts_before_any_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let roster_path = write_roster(
            &dir,
            r#"
            [[member]]
            full_name = "Jane A. Doe"
            first_name = ""
            last_initial = "A"
            last_name = "Doe"
            "#,
        );

        let pipeline = Pipeline::new(jane_directory(), config());
        let result = pipeline.execute(&roster_path, CancellationToken::new()).await;
        assert!(matches!(result, Err(PipelineError::Validation(_))));
    }

    #[tokio::test]
    async fn unparseable_detail_excludes_only_that_talk() {
        let mut mock = jane_directory();
        mock.profiles.get_mut("P1").unwrap().papers.push(PaperListItem {
            item_ref: "https://x/talk/2".to_string(),
            link_text: "T21B-09 Second Paper".to_string(),
            item_code: Some("T21B-09".to_string()),
            top_author_text: "Jane Doe".to_string(),
        });
        mock.details.insert(
            "https://x/talk/2".to_string(),
            TalkDetail {
                date_text: "To Be Announced".to_string(),
                time_text: "14:10 - 14:25".to_string(),
                location: String::new(),
            },
        );

        let dir = tempfile::tempdir().unwrap();
        let roster_path = write_roster(&dir, JANE_ROSTER);

        let pipeline = Pipeline::new(mock, config());
        let (document, report) = pipeline
            .execute(&roster_path, CancellationToken::new())
            .await
            .unwrap();

        // the bad talk is excluded, the run still completes
        assert_eq!(report.talks_discovered, 2);
        assert_eq!(report.talks_scheduled, 1);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].stage, FailureStage::Normalization);
        assert_eq!(document.days.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_identities_collapse_to_one_schedule_entry() {
        let mut mock = jane_directory();
        // second directory identity for the same person, same talk ref
        mock.search_results.get_mut("Jane Doe").unwrap().push(CandidateMatch {
            display_name: "Jane R. Doe".to_string(),
            affiliation_text: "WHOI".to_string(),
            profile_ref: "P2".to_string(),
        });
        mock.profiles.insert(
            "P2".to_string(),
            ProfileListing {
                sessions: vec![],
                papers: vec![PaperListItem {
                    item_ref: "https://x/talk/1".to_string(),
                    link_text: "PP123 Holocene Records".to_string(),
                    item_code: Some("PP123".to_string()),
                    top_author_text: "Jane R. Doe".to_string(),
                }],
            },
        );

        let dir = tempfile::tempdir().unwrap();
        let roster_path = write_roster(&dir, JANE_ROSTER);

        let pipeline = Pipeline::new(mock, config());
        let (document, report) = pipeline
            .execute(&roster_path, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.identities_resolved, 2);
        assert_eq!(report.talks_scheduled, 1);
        assert_eq!(document.days[0].talks.len(), 1);
        // lexicographically first author string wins the attribution
        assert_eq!(document.days[0].talks[0].first_author_name, "Jane Doe");
        // both identities stay in the index
        assert_eq!(document.author_index.len(), 2);
    }

    #[tokio::test]
    async fn unaffiliated_member_contributes_nothing_without_error() {
        let mut mock = MockDirectory::default();
        mock.search_results.insert(
            "Jane Doe".to_string(),
            vec![CandidateMatch {
                display_name: "Jane Doe".to_string(),
                affiliation_text: "Unrelated Institute".to_string(),
                profile_ref: "P1".to_string(),
            }],
        );

        let dir = tempfile::tempdir().unwrap();
        let roster_path = write_roster(&dir, JANE_ROSTER);

        let pipeline = Pipeline::new(mock, config());
        let (document, report) = pipeline
            .execute(&roster_path, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.identities_resolved, 0);
        assert!(report.diagnostics.is_empty());
        assert_eq!(report.members_without_presentations, vec!["Jane A. Doe"]);
        assert!(document.days.is_empty());
        assert!(document.author_index.is_empty());
    }

    #[tokio::test]
    async fn cancelled_run_emits_no_document() {
        let dir = tempfile::tempdir().unwrap();
        let roster_path = write_roster(&dir, JANE_ROSTER);

        let cancel = CancellationToken::new();
        cancel.cancel();

        let pipeline = Pipeline::new(jane_directory(), config());
        let result = pipeline.execute(&roster_path, cancel).await;
        assert!(matches!(result, Err(PipelineError::Cancelled)));
    }
}
