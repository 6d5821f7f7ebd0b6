//! Configuration loading and config file resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Directory-service settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Base URL of the conference directory service
    pub base_url: String,
    /// Timeout for search and profile listing pages (seconds)
    pub search_timeout_seconds: u64,
    /// Timeout for talk detail pages, which render far more slowly (seconds)
    pub detail_timeout_seconds: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://directory.example.org/meetingapp.cgi".to_string(),
            search_timeout_seconds: 30,
            detail_timeout_seconds: 300,
        }
    }
}

/// Candidate-filtering settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Case-insensitive substrings; a candidate's affiliation text must
    /// contain at least one of them to be accepted. Include every spelling
    /// and abbreviation your institution appears under.
    pub affiliation_allow_list: Vec<String>,
}

/// Output document settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Timezone label printed next to every time. The directory serves
    /// times in the viewer's local timezone; this label is descriptive
    /// only, no conversion is performed.
    pub timezone_label: String,
    /// Introductory paragraph placed at the top of the schedule document
    pub intro_text: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            timezone_label: "EST".to_string(),
            intro_text: None,
        }
    }
}

/// TOML configuration file contents
///
/// Every section and field is optional in the file; missing values fall
/// back to the defaults above.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub directory: DirectoryConfig,
    pub matching: MatchingConfig,
    pub output: OutputConfig,
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load configuration from a file path
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Validate settings that have no usable default
    ///
    /// An empty affiliation allow-list would silently filter out every
    /// candidate, so it is rejected up front.
    pub fn validate(&self) -> Result<()> {
        if self.matching.affiliation_allow_list.is_empty() {
            return Err(Error::Config(
                "matching.affiliation_allow_list is empty; no candidate could ever match"
                    .to_string(),
            ));
        }
        if self.directory.base_url.is_empty() {
            return Err(Error::Config("directory.base_url is empty".to_string()));
        }
        Ok(())
    }
}

/// Resolve the configuration file path in priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable CONFSCHED_CONFIG
/// 3. Per-user config directory ({config dir}/confsched/config.toml)
///
/// Returns None when no file exists at any tier; callers then run on
/// compiled defaults.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var("CONFSCHED_CONFIG") {
        return Some(PathBuf::from(path));
    }

    let user_config = dirs::config_dir().map(|d| d.join("confsched").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    None
}

/// Load configuration, falling back to compiled defaults when no file is found
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    match resolve_config_path(cli_arg) {
        Some(path) => {
            tracing::info!("Loading configuration from {}", path.display());
            TomlConfig::load(&path)
        }
        None => {
            tracing::info!("No configuration file found, using compiled defaults");
            Ok(TomlConfig::default())
        }
    }
}
