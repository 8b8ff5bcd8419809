//! Error types for dms-mirror

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dms_mirror_common::ClientError;
use serde_json::json;
use thiserror::Error;

/// Failure while mirroring a component, version or artifact
#[derive(Debug, Error)]
pub enum MirrorError {
    /// Remote collaborator failed (after retries, where applicable)
    #[error(transparent)]
    Client(#[from] ClientError),

    /// GAV template could not be parsed or filled
    #[error("Template error: {0}")]
    Template(String),

    /// Malformed input (webhook payload, unexpected event type)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Mandatory field absent from an artifact or configuration entry
    #[error("Missing field: {0}")]
    MissingField(String),

    /// Configuration loading error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local I/O error (transfer buffer)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Worker task panicked or was cancelled
    #[error("Worker failed: {0}")]
    Join(String),

    /// A component of a batch run failed; carries the labeled message
    #[error("{0}")]
    Component(String),
}

impl From<dms_mirror_common::Error> for MirrorError {
    fn from(err: dms_mirror_common::Error) -> Self {
        match err {
            dms_mirror_common::Error::Io(e) => MirrorError::Io(e),
            dms_mirror_common::Error::Config(msg) => MirrorError::Config(msg),
            dms_mirror_common::Error::InvalidInput(msg) => MirrorError::Validation(msg),
        }
    }
}

/// Result type of the mirroring pipeline
pub type MirrorResult<T> = Result<T, MirrorError>;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Processing failed (400, the message is passed through)
    #[error(transparent)]
    Mirror(#[from] MirrorError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::Mirror(ref err) => {
                let code = match err {
                    MirrorError::Validation(_) => "VALIDATION_ERROR",
                    _ => "PROCESSING_ERROR",
                };
                (StatusCode::BAD_REQUEST, code, err.to_string())
            }
        };

        let body = Json(json!({
            "result": message,
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
