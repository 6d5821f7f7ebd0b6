//! Conference directory service access
//!
//! The directory is the external conference service exposing person search
//! and profile/detail lookups. The pipeline consumes it through the
//! `Directory` trait so every stage can be tested against mock data; the
//! `DirectoryClient` maps the service's JSON endpoints onto the trait.

use crate::types::CandidateMatch;
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Result Model
// ============================================================================

/// A session or workshop the person is convening
///
/// Chairing is unambiguous, so no authorship test is associated with these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionListItem {
    /// Detail-page reference for the session
    pub item_ref: String,
    /// Link text; used verbatim as the title
    pub link_text: String,
}

/// A paper, talk, or poster the person is listed on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperListItem {
    /// Detail-page reference for the item
    pub item_ref: String,
    /// Link text; carries the item code followed by the title
    pub link_text: String,
    /// Item code embedded in the link text (e.g. "PP43C-1234"), when present
    pub item_code: Option<String>,
    /// Rendered top-author text; the only visible primary-authorship signal
    pub top_author_text: String,
}

/// Everything a profile page lists for one identity
#[derive(Debug, Clone, Default)]
pub struct ProfileListing {
    pub sessions: Vec<SessionListItem>,
    pub papers: Vec<PaperListItem>,
}

/// Raw scheduling fields from a talk detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TalkDetail {
    /// e.g. "Friday, 17 December 2021"
    pub date_text: String,
    /// e.g. "14:10 - 14:25"
    pub time_text: String,
    /// Room or venue text
    pub location: String,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Transport failure, including connect and read timeouts
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status { status: StatusCode, url: String },

    #[error("failed to decode response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;

// ============================================================================
// Capability Trait
// ============================================================================

/// The three directory capabilities the pipeline needs
///
/// One search per roster member, one profile listing per identity, one
/// detail fetch per talk. Implementations make at most one attempt per
/// call; retry policy is the caller's concern (and the pipeline's policy
/// is no retries at all).
#[async_trait]
pub trait Directory: Send + Sync {
    /// Search people by name; first result page only
    async fn search_people(&self, query: &str) -> DirectoryResult<Vec<CandidateMatch>>;

    /// Fetch the listing of items a profile is attached to
    async fn fetch_profile(&self, profile_ref: &str) -> DirectoryResult<ProfileListing>;

    /// Fetch the scheduling fields of one talk's detail page
    async fn fetch_talk_detail(&self, talk_ref: &str) -> DirectoryResult<TalkDetail>;
}

// ============================================================================
// Wire Format
// ============================================================================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResultEntry>,
}

#[derive(Debug, Deserialize)]
struct SearchResultEntry {
    name: String,
    #[serde(default)]
    affiliation: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    #[serde(default)]
    sessions: Vec<SessionEntry>,
    #[serde(default)]
    papers: Vec<PaperEntry>,
}

#[derive(Debug, Deserialize)]
struct SessionEntry {
    url: String,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct PaperEntry {
    url: String,
    #[serde(default)]
    title: String,
    /// Item code rendered inside the link, absent for codeless items
    #[serde(default)]
    number: Option<String>,
    #[serde(default)]
    first_author: String,
}

#[derive(Debug, Deserialize)]
struct DetailResponse {
    #[serde(default)]
    date: String,
    #[serde(default)]
    time: String,
    #[serde(default)]
    location: String,
}

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP-backed directory client
///
/// - Search and profile listings use the short timeout; detail pages are
///   much slower to render and use the long one.
/// - Requests are rate limited to 1/second across all endpoints out of
///   politeness to the third-party service.
/// - Every request carries the standard User-Agent.
pub struct DirectoryClient {
    /// HTTP client with configured connect timeout
    client: Client,
    /// Base URL of the directory service
    base_url: String,
    user_agent: String,
    search_timeout: Duration,
    detail_timeout: Duration,
    /// Rate limiter: 1 request per second
    rate_limiter: RateLimiter<
        governor::state::direct::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl DirectoryClient {
    /// Create a client from directory configuration
    ///
    /// # Panics
    /// Panics if the HTTP client cannot be built (should not happen with
    /// valid config)
    pub fn new(config: &confsched_common::config::DirectoryConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .expect("Failed to build HTTP client");

        let rate_limiter =
            RateLimiter::direct(Quota::per_second(NonZeroU32::new(1).expect("1 is non-zero")));

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            user_agent: confsched_common::user_agent(),
            search_timeout: Duration::from_secs(config.search_timeout_seconds),
            detail_timeout: Duration::from_secs(config.detail_timeout_seconds),
            rate_limiter,
        }
    }

    /// GET a JSON document with the given per-request timeout
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        timeout: Duration,
    ) -> DirectoryResult<T> {
        // Wait for a rate-limit permit before touching the network
        self.rate_limiter.until_ready().await;

        tracing::debug!("Fetching {}", url);

        let response = self
            .client
            .get(url)
            .query(query)
            .timeout(timeout)
            .header("User-Agent", &self.user_agent)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::Status {
                status,
                url: url.to_string(),
            });
        }

        response.json::<T>().await.map_err(|e| DirectoryError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    fn search_url(&self) -> String {
        format!("{}/Search/0", self.base_url)
    }
}

#[async_trait]
impl Directory for DirectoryClient {
    async fn search_people(&self, query: &str) -> DirectoryResult<Vec<CandidateMatch>> {
        let url = self.search_url();
        let response: SearchResponse = self
            .get_json(
                &url,
                &[
                    ("sort", "Relevance"),
                    ("size", "10"),
                    ("page", "1"),
                    ("searchterm", query),
                    ("ModelType", "Person"),
                ],
                self.search_timeout,
            )
            .await?;

        Ok(response
            .results
            .into_iter()
            .map(|entry| CandidateMatch {
                display_name: entry.name,
                affiliation_text: entry.affiliation,
                profile_ref: entry.url,
            })
            .collect())
    }

    async fn fetch_profile(&self, profile_ref: &str) -> DirectoryResult<ProfileListing> {
        let response: ProfileResponse = self
            .get_json(profile_ref, &[], self.search_timeout)
            .await?;

        Ok(ProfileListing {
            sessions: response
                .sessions
                .into_iter()
                .map(|entry| SessionListItem {
                    item_ref: entry.url,
                    link_text: entry.title,
                })
                .collect(),
            papers: response
                .papers
                .into_iter()
                .map(|entry| PaperListItem {
                    item_ref: entry.url,
                    link_text: entry.title,
                    item_code: entry.number.filter(|code| !code.is_empty()),
                    top_author_text: entry.first_author,
                })
                .collect(),
        })
    }

    async fn fetch_talk_detail(&self, talk_ref: &str) -> DirectoryResult<TalkDetail> {
        let response: DetailResponse = self
            .get_json(talk_ref, &[], self.detail_timeout)
            .await?;

        Ok(TalkDetail {
            date_text: response.date,
            time_text: response.time,
            location: response.location,
        })
    }
}

// ============================================================================
// Test Support
// ============================================================================

/// In-memory `Directory` used by the stage unit tests
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::{HashMap, HashSet};

    #[derive(Default)]
    pub struct MockDirectory {
        pub search_results: HashMap<String, Vec<CandidateMatch>>,
        pub profiles: HashMap<String, ProfileListing>,
        pub details: HashMap<String, TalkDetail>,
        /// Queries / refs that simulate a transport failure
        pub failing: HashSet<String>,
    }

    impl MockDirectory {
        fn check_failure(&self, key: &str) -> DirectoryResult<()> {
            if self.failing.contains(key) {
                return Err(DirectoryError::Status {
                    status: StatusCode::REQUEST_TIMEOUT,
                    url: key.to_string(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Directory for MockDirectory {
        async fn search_people(&self, query: &str) -> DirectoryResult<Vec<CandidateMatch>> {
            self.check_failure(query)?;
            Ok(self.search_results.get(query).cloned().unwrap_or_default())
        }

        async fn fetch_profile(&self, profile_ref: &str) -> DirectoryResult<ProfileListing> {
            self.check_failure(profile_ref)?;
            Ok(self.profiles.get(profile_ref).cloned().unwrap_or_default())
        }

        async fn fetch_talk_detail(&self, talk_ref: &str) -> DirectoryResult<TalkDetail> {
            self.check_failure(talk_ref)?;
            self.details
                .get(talk_ref)
                .cloned()
                .ok_or_else(|| DirectoryError::Status {
                    status: StatusCode::NOT_FOUND,
                    url: talk_ref.to_string(),
                })
        }
    }
}
