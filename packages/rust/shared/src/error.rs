//! Error types for nightbrief.
//!
//! Library crates use [`NightbriefError`] via `thiserror`.
//! The CLI app wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all nightbrief operations.
#[derive(Debug, thiserror::Error)]
pub enum NightbriefError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error talking to a backend (search, reader, completion).
    #[error("network error: {0}")]
    Network(String),

    /// Search backend returned an unusable response.
    #[error("search error: {message}")]
    Search { message: String },

    /// Summarization backend error (API failure or unparseable response).
    #[error("summarize error: {0}")]
    Summarize(String),

    /// Notification channel error.
    #[error("notify error: {0}")]
    Notify(String),

    /// Cron expression or scheduler error.
    #[error("schedule error: {message}")]
    Schedule { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (invalid URL, bad concurrency, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, NightbriefError>;

impl NightbriefError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a search error from any displayable message.
    pub fn search(msg: impl Into<String>) -> Self {
        Self::Search {
            message: msg.into(),
        }
    }

    /// Create a schedule error from any displayable message.
    pub fn schedule(msg: impl Into<String>) -> Self {
        Self::Schedule {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = NightbriefError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = NightbriefError::validation("concurrency must be >= 1");
        assert!(err.to_string().contains("concurrency"));
    }
}
