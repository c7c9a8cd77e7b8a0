//! Error types for document loading and saving.

use thiserror::Error;

/// Errors surfaced while reading or writing label documents.
#[derive(Error, Debug)]
pub enum AnnoError {
    /// JSON parsing or serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document parsed but its contents are unusable.
    #[error("Invalid document: {message}")]
    InvalidDocument { message: String },
}

impl AnnoError {
    /// Create an invalid-document error.
    pub fn invalid_document(message: impl Into<String>) -> Self {
        AnnoError::InvalidDocument {
            message: message.into(),
        }
    }
}

/// Convenience result type for document operations.
pub type AnnoResult<T> = Result<T, AnnoError>;
