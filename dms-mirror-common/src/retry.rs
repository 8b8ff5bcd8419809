//! Fixed-delay bounded retry for remote calls.
//!
//! Only transient failures are retried: connection failures, generic API
//! errors and (unless disabled in the policy) missing-field errors. Every
//! other failure is returned from the first attempt.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Default retry configuration values.
const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_DELAY_SECS: u64 = 30;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    pub max_attempts: u32,
    /// Sleep between two attempts.
    pub delay: Duration,
    /// Treat missing-field errors as transient.
    pub retry_missing_field: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: Duration::from_secs(DEFAULT_DELAY_SECS),
            retry_missing_field: true,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            ..Self::default()
        }
    }

    fn should_retry<E: RetryableError>(&self, err: &E) -> bool {
        err.is_retryable() || (self.retry_missing_field && err.is_missing_field())
    }
}

/// Trait for errors that can indicate whether a retry is appropriate.
pub trait RetryableError {
    /// Returns true for transient transport or upstream API failures.
    fn is_retryable(&self) -> bool;

    /// Returns true when an expected key was absent from a response.
    fn is_missing_field(&self) -> bool {
        false
    }
}

/// Call `operation` until it succeeds, fails with a non-retryable error, or
/// `policy.max_attempts` attempts have been made. The last error is returned.
pub async fn call_with_retries<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RetryableError + Display,
{
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        tracing::debug!(operation = operation_name, attempt, "Remote call");

        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !policy.should_retry(&err) || attempt >= policy.max_attempts {
                    return Err(err);
                }

                tracing::debug!(
                    operation = operation_name,
                    attempt,
                    error = %err,
                    "Transient failure, retrying in {:?}",
                    policy.delay
                );

                if !policy.delay.is_zero() {
                    tokio::time::sleep(policy.delay).await;
                }
            }
        }
    }
}
