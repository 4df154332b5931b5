//! Store error types
//!
//! Defines all errors that can occur in the persistence layer, for both
//! the remote and the local backend.

use thiserror::Error;

/// Errors that can occur in the persistence layer
#[derive(Error, Debug)]
pub enum StoreError {
    /// Remote endpoint could not be reached
    #[error("endpoint unreachable")]
    Unreachable,

    /// Remote request timed out
    #[error("request timeout")]
    Timeout,

    /// Other transport-level failure
    #[error("request failed: {0}")]
    Request(reqwest::Error),

    /// Remote endpoint answered with a non-success status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Persisted local record is not valid JSON. Fatal for that record;
    /// the profile directory is user-clearable.
    #[error("corrupt record {key:?}: {error}")]
    Corrupt { key: String, error: String },

    /// I/O operation on the local store failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Input rejected before any I/O
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl StoreError {
    /// Classify a reqwest failure into the transport taxonomy.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StoreError::Timeout
        } else if err.is_connect() {
            StoreError::Unreachable
        } else {
            StoreError::Request(err)
        }
    }

    /// Whether this error came from the remote side of an operation.
    ///
    /// Only remote-side failures are eligible for the local read fallback;
    /// a local `Corrupt` or `Io` error always propagates.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            StoreError::Unreachable
                | StoreError::Timeout
                | StoreError::Request(_)
                | StoreError::Api { .. }
        )
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "API error 500: boom");

        let err = StoreError::InvalidInput("message text is empty".to_string());
        assert_eq!(err.to_string(), "invalid input: message text is empty");
    }

    #[test]
    fn test_remote_classification() {
        assert!(StoreError::Unreachable.is_remote());
        assert!(StoreError::Api {
            status: 404,
            message: String::new()
        }
        .is_remote());

        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(!StoreError::from(io_err).is_remote());
        assert!(!StoreError::Corrupt {
            key: "messages".to_string(),
            error: "trailing comma".to_string()
        }
        .is_remote());
    }
}
