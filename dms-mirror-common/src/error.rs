//! Common error types for the DMS mirror

use thiserror::Error;

/// Common result type for DMS mirror operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the library and the service
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input (malformed coordinate, webhook payload, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
