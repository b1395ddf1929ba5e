//! Retry policy for idempotent requests.

use log::{debug, warn};
use std::future::Future;
use std::time::Duration;

use super::error::ApiError;

/// Maximum number of attempts, first try included.
pub const MAX_ATTEMPTS: usize = 3;

/// Delay before the first retry in milliseconds.
pub const BASE_DELAY_MS: u64 = 1000;

/// Factor applied to the delay after every failed attempt.
pub const BACKOFF_MULTIPLIER: u32 = 2;

/// How many times to try a request and how long to wait between tries.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub multiplier: u32,
    pub retryable: fn(&ApiError) -> bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            base_delay: Duration::from_millis(BASE_DELAY_MS),
            multiplier: BACKOFF_MULTIPLIER,
            retryable: ApiError::is_retryable,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes a single attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Delay after the failed attempt with 0-based index `attempt`.
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let exponent = u32::try_from(attempt).unwrap_or(u32::MAX);
        let factor = self.multiplier.saturating_pow(exponent);
        self.base_delay.saturating_mul(factor)
    }

    pub fn should_retry(&self, error: &ApiError) -> bool {
        (self.retryable)(error)
    }
}

/// Runs `operation` until it succeeds, fails with a terminal error, or the
/// attempt budget runs out. The last error is returned in the latter case.
pub async fn with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    operation_name: &str,
    operation: F,
) -> Result<T, ApiError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        let error = match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        if !policy.should_retry(&error) {
            debug!("{}: non-retryable error: {}", operation_name, error);
            return Err(error);
        }

        if attempt + 1 >= attempts {
            debug!(
                "{}: giving up after {} attempts: {}",
                operation_name, attempts, error
            );
            return Err(error);
        }

        let delay = policy.delay_for(attempt);
        warn!(
            "{}: attempt {}/{} failed ({}), retrying in {}ms...",
            operation_name,
            attempt + 1,
            attempts,
            error,
            delay.as_millis()
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
