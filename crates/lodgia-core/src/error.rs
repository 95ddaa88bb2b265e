//! Error types module
//!
//! This module provides the core error type used throughout Lodgia. Every failure
//! the gallery can surface (structural edit errors, upload, persistence and
//! deletion failures) is expressed as a `GalleryError` variant. Failures never
//! abort the gallery; callers decide how to present them through `ErrorMetadata`.

use std::io;

use crate::models::{MediaItemId, UploadState};
use crate::validation::ValidationError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like stale indices from the interface
    Debug,
    /// Warning level - for recoverable issues like a failed upload or save
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be presented to an operator.
///
/// Every gallery failure is surfaced as a non-blocking notification; this trait
/// lets the notification layer pick wording and severity without matching on
/// concrete variants.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "UPLOAD_FAILED")
    fn error_code(&self) -> &'static str;

    /// Whether the operator can recover (retry, edit again) without reloading
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the operator
    fn suggested_action(&self) -> Option<&'static str>;

    /// Operator-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum GalleryError {
    #[error("Media item not found: {0}")]
    ItemNotFound(MediaItemId),

    #[error("Index {index} out of range for collection of {len} items")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid upload transition: {from} -> {to}")]
    InvalidTransition { from: UploadState, to: UploadState },

    #[error("Collection is full: {max} items maximum")]
    CapacityExceeded { max: usize },

    #[error("Rejected file: {0}")]
    Validation(#[from] ValidationError),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Persistence failed: {0}")]
    Persistence(String),

    #[error("Asset deletion failed: {0}")]
    Deletion(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for GalleryError {
    fn from(err: anyhow::Error) -> Self {
        GalleryError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for GalleryError {
    fn from(err: io::Error) -> Self {
        GalleryError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for GalleryError {
    fn from(err: serde_json::Error) -> Self {
        GalleryError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

/// Static metadata for each variant: (error_code, recoverable, suggested_action, log_level).
fn gallery_error_static_metadata(
    err: &GalleryError,
) -> (&'static str, bool, Option<&'static str>, LogLevel) {
    match err {
        GalleryError::ItemNotFound(_) => (
            "ITEM_NOT_FOUND",
            true,
            Some("Refresh the gallery and try again"),
            LogLevel::Debug,
        ),
        GalleryError::IndexOutOfRange { .. } => (
            "INDEX_OUT_OF_RANGE",
            true,
            Some("Refresh the gallery and try again"),
            LogLevel::Debug,
        ),
        GalleryError::InvalidTransition { .. } => (
            "INVALID_TRANSITION",
            true,
            Some("Only failed uploads can be retried or dismissed"),
            LogLevel::Warn,
        ),
        GalleryError::CapacityExceeded { .. } => (
            "CAPACITY_EXCEEDED",
            false,
            Some("Remove some photos before adding more"),
            LogLevel::Debug,
        ),
        GalleryError::Validation(_) => (
            "FILE_REJECTED",
            false,
            Some("Choose a supported image under the size limit"),
            LogLevel::Debug,
        ),
        GalleryError::Upload(_) => (
            "UPLOAD_FAILED",
            true,
            Some("Retry the upload"),
            LogLevel::Warn,
        ),
        GalleryError::Persistence(_) => (
            "PERSISTENCE_FAILED",
            true,
            Some("Changes will be saved with your next edit"),
            LogLevel::Warn,
        ),
        GalleryError::Deletion(_) => (
            "DELETION_FAILED",
            true,
            None,
            LogLevel::Warn,
        ),
        GalleryError::InvalidInput(_) => (
            "INVALID_INPUT",
            false,
            Some("Check the value and try again"),
            LogLevel::Debug,
        ),
        GalleryError::Config(_) => (
            "CONFIG_ERROR",
            false,
            Some("Check the gallery configuration"),
            LogLevel::Error,
        ),
        GalleryError::Internal(_) | GalleryError::InternalWithSource { .. } => (
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
    }
}

impl GalleryError {
    /// Get the error type name for detailed error reports
    pub fn error_type(&self) -> &str {
        match self {
            GalleryError::ItemNotFound(_) => "ItemNotFound",
            GalleryError::IndexOutOfRange { .. } => "IndexOutOfRange",
            GalleryError::InvalidTransition { .. } => "InvalidTransition",
            GalleryError::CapacityExceeded { .. } => "CapacityExceeded",
            GalleryError::Validation(_) => "Validation",
            GalleryError::Upload(_) => "Upload",
            GalleryError::Persistence(_) => "Persistence",
            GalleryError::Deletion(_) => "Deletion",
            GalleryError::InvalidInput(_) => "InvalidInput",
            GalleryError::Config(_) => "Config",
            GalleryError::Internal(_) => "Internal",
            GalleryError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for GalleryError {
    fn error_code(&self) -> &'static str {
        gallery_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        gallery_error_static_metadata(self).1
    }

    fn suggested_action(&self) -> Option<&'static str> {
        gallery_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        gallery_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            GalleryError::ItemNotFound(_) => "This photo is no longer in the gallery".to_string(),
            GalleryError::IndexOutOfRange { .. } => {
                "The gallery changed while you were editing".to_string()
            }
            GalleryError::InvalidTransition { from, .. } => {
                format!("This photo is {} and cannot do that right now", from)
            }
            GalleryError::CapacityExceeded { max } => {
                format!("A gallery can hold at most {} photos", max)
            }
            GalleryError::Validation(ref err) => err.to_string(),
            GalleryError::Upload(ref msg) => msg.clone(),
            GalleryError::Persistence(_) => "Could not save the photo order".to_string(),
            GalleryError::Deletion(_) => {
                "The photo was removed but its file could not be cleaned up".to_string()
            }
            GalleryError::InvalidInput(ref msg) => msg.clone(),
            GalleryError::Config(ref msg) => msg.clone(),
            GalleryError::Internal(_) | GalleryError::InternalWithSource { .. } => {
                "Internal gallery error".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_upload() {
        let err = GalleryError::Upload("connection reset".to_string());
        assert_eq!(err.error_code(), "UPLOAD_FAILED");
        assert!(err.is_recoverable());
        assert_eq!(err.client_message(), "connection reset");
        assert_eq!(err.log_level(), LogLevel::Warn);
    }

    #[test]
    fn test_error_metadata_persistence_is_recoverable() {
        let err = GalleryError::Persistence("timeout".to_string());
        assert_eq!(err.error_code(), "PERSISTENCE_FAILED");
        assert!(err.is_recoverable());
        assert_eq!(
            err.suggested_action(),
            Some("Changes will be saved with your next edit")
        );
    }

    #[test]
    fn test_error_metadata_capacity() {
        let err = GalleryError::CapacityExceeded { max: 12 };
        assert!(!err.is_recoverable());
        assert!(err.client_message().contains("12"));
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_error_metadata_invalid_transition_is_an_operator_mistake() {
        let err = GalleryError::InvalidTransition {
            from: UploadState::Uploaded,
            to: UploadState::Uploading,
        };
        assert_eq!(err.error_code(), "INVALID_TRANSITION");
        assert!(err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Warn);
        assert!(err.client_message().contains("uploaded"));
    }

    #[test]
    fn test_detailed_message_includes_source_chain() {
        let err = GalleryError::from(anyhow::anyhow!("disk full").context("writing list"));
        let details = err.detailed_message();
        assert!(details.starts_with("Internal error with source"));
        assert!(details.contains("writing list"));
    }

    #[test]
    fn test_error_type_names() {
        assert_eq!(
            GalleryError::IndexOutOfRange { index: 3, len: 2 }.error_type(),
            "IndexOutOfRange"
        );
        assert_eq!(
            GalleryError::Internal("x".to_string()).error_type(),
            "Internal"
        );
    }
}
