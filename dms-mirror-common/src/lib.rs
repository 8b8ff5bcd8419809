//! # DMS Mirror Common Library
//!
//! Shared code for the DMS mirror service including:
//! - DMS data model (artifacts, components, relational-store records)
//! - Webhook event types
//! - Component configuration loading and synthesis
//! - GAV coordinates and sanitization
//! - Remote call errors and the retry wrapper

pub mod client_error;
pub mod config;
pub mod error;
pub mod events;
pub mod gav;
pub mod models;
pub mod retry;

pub use client_error::ClientError;
pub use error::{Error, Result};
pub use gav::{sanitize_gav, Gav};
pub use retry::{call_with_retries, RetryPolicy, RetryableError};
