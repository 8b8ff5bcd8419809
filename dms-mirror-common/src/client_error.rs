//! Errors raised by the remote collaborators (DMS, artifact repository,
//! relational store, registration queue)

use thiserror::Error;

use crate::retry::RetryableError;

/// Remote call failure
#[derive(Debug, Error)]
pub enum ClientError {
    /// Could not reach the service (refused, reset, timed out, DNS)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Service answered with a non-success status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Expected key absent from a response or descriptor
    #[error("Missing field: {0}")]
    MissingField(String),

    /// Requested object does not exist (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// Local buffer I/O failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The client does not offer this operation for its API version
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl ClientError {
    /// Build an error from an HTTP status and body, mapping 404 to `NotFound`
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status == 404 {
            ClientError::NotFound(message)
        } else {
            ClientError::Api { status, message }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }
}

impl RetryableError for ClientError {
    fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Connection(_) | ClientError::Api { .. })
    }

    fn is_missing_field(&self) -> bool {
        matches!(self, ClientError::MissingField(_))
    }
}
