//! Error types for newapi-export.

use std::fmt;

use thiserror::Error;

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Export phase that drives a primary batch fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Channels → providers.
    Channels,
    /// Users and tokens → masters and keys.
    UsersAndTokens,
    /// Abilities → bindings.
    Abilities,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Channels => "channels",
            Self::UsersAndTokens => "users/tokens",
            Self::Abilities => "abilities",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while exporting.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration or command-line flags.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The source database could not be reached.
    #[error("Source connection error: {0}")]
    SourceConnection(String),

    /// A query against the source database failed.
    #[error("Query error: {0}")]
    Query(#[from] sqlx::Error),

    /// A phase could not read its driving entity batch.
    #[error("failed to export {phase}: {source}")]
    Phase {
        /// Phase that failed.
        phase: Phase,
        /// Underlying failure.
        source: Box<Error>,
    },

    /// JSON serialization or parsing error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML configuration parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An export file does not have the expected structure.
    #[error("Invalid export file: {0}")]
    InvalidExport(String),
}

impl Error {
    /// Wraps an error as the failure of `phase`.
    #[must_use]
    pub fn in_phase(self, phase: Phase) -> Self {
        Self::Phase {
            phase,
            source: Box::new(self),
        }
    }

    /// Returns true for connection-class failures worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::SourceConnection(_) => true,
            Self::Io(_) => true,
            Self::Query(e) => matches!(
                e,
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::Tls(_)
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_error_display() {
        let err = Error::SourceConnection("refused".to_string()).in_phase(Phase::Channels);
        assert_eq!(
            err.to_string(),
            "failed to export channels: Source connection error: refused"
        );
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(Phase::UsersAndTokens.to_string(), "users/tokens");
        assert_eq!(Phase::Abilities.to_string(), "abilities");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(Error::SourceConnection("timeout".to_string()).is_retryable());
        assert!(Error::Query(sqlx::Error::PoolTimedOut).is_retryable());
        assert!(!Error::Query(sqlx::Error::RowNotFound).is_retryable());
        assert!(!Error::Config("bad".to_string()).is_retryable());
        assert!(!Error::InvalidExport("x".to_string()).is_retryable());
    }
}
