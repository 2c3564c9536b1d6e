// Domain errors - Error types for the domain layer

use thiserror::Error;

/// Domain-specific error types
///
/// Every failure of a clip operation ends up as exactly one of these; there
/// is no partial success and no retry at any layer.
#[derive(Error, Debug)]
pub enum DomainError {
    /// Request rejected before any external process was started
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The transcoder exited with a non-zero status
    #[error("Encoding failed: {reason}")]
    ProcessFailed { reason: String },

    /// The operation was cancelled through its cancellation token
    #[error("Operation cancelled")]
    Cancelled,

    /// Transport error or non-success response from an upload destination
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    /// Media duration could not be determined
    #[error("Probe failed: {0}")]
    Probe(String),

    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DomainError {
    /// Shorthand for a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }

    /// Shorthand for an upload error
    pub fn upload(message: impl Into<String>) -> Self {
        DomainError::UploadFailed(message.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, DomainError::Validation(_))
    }
}

impl From<reqwest::Error> for DomainError {
    fn from(error: reqwest::Error) -> Self {
        DomainError::UploadFailed(error.to_string())
    }
}

/// Result type alias for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
