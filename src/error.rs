//! Error types for OpsDeck
//!
//! This module defines all error types used throughout the crate.
//! Uses `thiserror` for ergonomic error handling with automatic `Display` and
//! `Error` trait implementations.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

// ============================================================================
// Error Classification
// ============================================================================

/// Coarse error classification shared by every operation boundary.
///
/// Callers use this to decide how to report a failure: validation and
/// not-found failures are ordinary results, I/O and external failures are
/// surfaced with their message, anything else is reported as unexpected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Empty or missing required input
    Validation,
    /// Unknown id or record
    NotFound,
    /// Store or reference file could not be read or written
    Io,
    /// A collaborator (prober, script executor) failed
    External,
    /// Anything else
    Unexpected,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Io => "io",
            ErrorKind::External => "external",
            ErrorKind::Unexpected => "unexpected",
        };
        f.write_str(label)
    }
}

// ============================================================================
// Primary Error Type
// ============================================================================

/// The primary error type for OpsDeck operations.
#[derive(Error, Debug)]
pub enum DeckError {
    /// Configuration-related errors (missing key, bad script path, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rejected input (empty name, empty id, etc.)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Record or server id not present in the registry
    #[error("Not found: {0}")]
    NotFound(String),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Registry content the reader cannot interpret; rewriting it would lose rows
    #[error("Registry needs repair: {0}")]
    Corrupt(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV encoding errors while rewriting the registry
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Collaborator failure; the message is the collaborator's own output
    #[error("{0}")]
    External(String),

    /// Catch-all for failures that fit no other category
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl DeckError {
    /// Map this error onto the shared classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeckError::Validation(_) => ErrorKind::Validation,
            DeckError::NotFound(_) => ErrorKind::NotFound,
            DeckError::Io(_) | DeckError::Csv(_) | DeckError::Corrupt(_) => ErrorKind::Io,
            DeckError::External(_) | DeckError::Http(_) => ErrorKind::External,
            DeckError::Config(_) | DeckError::Json(_) | DeckError::Unexpected(_) => {
                ErrorKind::Unexpected
            }
        }
    }
}

/// A specialized `Result` type for OpsDeck operations.
pub type Result<T> = std::result::Result<T, DeckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DeckError::Config("missing fixed key".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing fixed key");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let deck_err: DeckError = io_err.into();
        assert!(matches!(deck_err, DeckError::Io(_)));
        assert_eq!(deck_err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_external_message_is_verbatim() {
        let err = DeckError::External("bash: start.sh: line 3: nope".to_string());
        assert_eq!(err.to_string(), "bash: start.sh: line 3: nope");
        assert_eq!(err.kind(), ErrorKind::External);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            DeckError::Validation("x".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(DeckError::NotFound("x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(
            DeckError::Unexpected("x".into()).kind(),
            ErrorKind::Unexpected
        );
        assert_eq!(DeckError::Config("x".into()).kind(), ErrorKind::Unexpected);
        assert_eq!(DeckError::Corrupt("x".into()).kind(), ErrorKind::Io);
    }

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::NotFound.to_string(), "not_found");
        assert_eq!(ErrorKind::External.to_string(), "external");
    }
}
