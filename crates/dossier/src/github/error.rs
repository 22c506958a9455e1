//! GitHub API error types.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::http::HttpError;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("Unable to parse GitHub URL: {0}")]
    InvalidUrl(String),

    #[error("Authentication required")]
    AuthRequired,

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Rate limit exceeded. Resets in {wait_secs}s")]
    RateLimited {
        reset_at: DateTime<Utc>,
        wait_secs: u64,
    },

    #[error("GitHub API error ({status}): {message}")]
    Status { status: u16, message: String },

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("Invalid content at {path}: {message}")]
    InvalidContent { path: String, message: String },

    #[error("Failed to decode response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl GitHubError {
    #[inline]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    #[inline]
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Server errors and flaky connections; everything else is final.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_transient(),
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// First line of an error, for progress output.
pub fn short_error_message(err: &GitHubError) -> String {
    let msg = err.to_string();
    msg.lines().next().unwrap_or(&msg).to_string()
}

pub type Result<T> = std::result::Result<T, GitHubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(GitHubError::status(502, "bad gateway").is_transient());
        assert!(GitHubError::Http(HttpError::Timeout("read".into())).is_transient());
        assert!(!GitHubError::status(422, "invalid").is_transient());
        assert!(!GitHubError::AuthRequired.is_transient());
        assert!(
            !GitHubError::RateLimited {
                reset_at: Utc::now(),
                wait_secs: 10
            }
            .is_transient()
        );
    }

    #[test]
    fn rate_limited_message_mentions_wait() {
        let err = GitHubError::RateLimited {
            reset_at: Utc::now(),
            wait_secs: 1200,
        };
        assert!(err.is_rate_limited());
        assert_eq!(err.to_string(), "Rate limit exceeded. Resets in 1200s");
    }

    #[test]
    fn short_message_keeps_first_line() {
        let err = GitHubError::status(500, "line one\nline two");
        assert_eq!(
            short_error_message(&err),
            "GitHub API error (500): line one"
        );
    }

    #[test]
    fn not_found_constructor() {
        let err = GitHubError::not_found("repos/o/r");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Not found: repos/o/r");
    }
}
