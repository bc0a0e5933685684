//! Bounded retry with exponential backoff for transient provider errors.

use crate::ports::CallError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Retry behaviour for one provider call.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, first call included. Zero behaves like one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
    /// Add up to 25% random delay on top of the computed backoff.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Fail on the first error.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay before retrying after the given failed attempt (0-indexed).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.initial_backoff.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let capped = base.min(self.max_backoff.as_millis() as f64);

        let delay = if self.jitter {
            capped * (1.0 + rand::random::<f64>() * 0.25)
        } else {
            capped
        };

        Duration::from_millis(delay as u64)
    }
}

/// The last error of a call that did not succeed, with the attempts spent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryExhausted {
    pub error: CallError,
    pub attempts: u32,
}

/// Run `f` until it succeeds, fails permanently, or runs out of attempts.
///
/// Only [`CallError::Transient`] errors are retried.
pub async fn with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    operation: &str,
    stack: &str,
    f: F,
) -> Result<T, RetryExhausted>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, CallError>>,
{
    let max_attempts = policy.attempts();
    let mut attempt = 0;

    loop {
        match f().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(operation, stack, attempts = attempt + 1, "succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) => {
                let attempts = attempt + 1;
                if !error.is_transient() || attempts >= max_attempts {
                    if attempts > 1 {
                        warn!(operation, stack, attempts, error = %error, "giving up after retries");
                    }
                    return Err(RetryExhausted { error, attempts });
                }

                let delay = policy.delay_for(attempt);
                debug!(
                    operation,
                    stack,
                    attempt = attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "transient failure, retrying"
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
