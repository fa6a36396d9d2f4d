//! Error types for cimport
//!
//! Every pipeline stage fails with exactly one of these kinds. None of them
//! are retried; the caller reports the message and stops.

use std::path::PathBuf;
use thiserror::Error;

/// Pipeline error type
#[derive(Debug, Error)]
pub enum ImportError {
    /// Path does not resolve to a readable file
    #[error("File {} not found.", .0.display())]
    FileNotFound(PathBuf),

    /// Extension is not one of the accepted spreadsheet formats
    #[error("Only CSV or XLSX files accepted (got {0}).")]
    UnsupportedFileType(String),

    /// Upload intent could not be registered with the contact service
    #[error("Upload registration failed: {0}")]
    RegistrationFailed(String),

    /// Storage endpoint did not accept the file
    ///
    /// `status` is absent when no response was received.
    #[error("{}", transfer_message(.status, .body))]
    TransferFailed { status: Option<u16>, body: String },

    /// Import job could not be created
    #[error("Import submission failed: {0}")]
    SubmissionFailed(String),

    /// Settings are missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),
}

fn transfer_message(status: &Option<u16>, body: &str) -> String {
    match status {
        Some(code) if body.is_empty() => format!("File transfer failed with status {}", code),
        Some(code) => format!("File transfer failed with status {}: {}", code, body),
        None => format!("File transfer failed: {}", body),
    }
}

/// Convenience Result type using ImportError
pub type Result<T> = std::result::Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_not_found_message() {
        let err = ImportError::FileNotFound(PathBuf::from("/tmp/missing.csv"));
        assert_eq!(err.to_string(), "File /tmp/missing.csv not found.");
    }

    #[test]
    fn test_transfer_failed_message_includes_status_and_body() {
        let err = ImportError::TransferFailed {
            status: Some(403),
            body: "<Error>AccessDenied</Error>".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "File transfer failed with status 403: <Error>AccessDenied</Error>"
        );
    }

    #[test]
    fn test_transfer_failed_without_response() {
        let err = ImportError::TransferFailed {
            status: None,
            body: "connection refused".to_string(),
        };
        assert_eq!(err.to_string(), "File transfer failed: connection refused");
    }
}
