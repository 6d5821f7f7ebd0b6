//! # confsched Common Library
//!
//! Shared code for the confsched tools including:
//! - Error types
//! - Configuration loading
//! - Outbound HTTP identification

pub mod config;
pub mod error;

pub use error::{Error, Result};

/// Standard User-Agent string for outbound HTTP requests
///
/// Directory sites ask automated clients to identify themselves; every
/// HTTP client in the workspace uses this value.
pub fn user_agent() -> String {
    format!(
        "confsched/{} ( https://github.com/confsched/confsched )",
        env!("CARGO_PKG_VERSION")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_carries_version_and_contact() {
        let ua = user_agent();
        assert!(ua.starts_with("confsched/"));
        assert!(ua.contains("github.com/confsched"));
    }
}
