//! Bounded retry with backoff for model calls

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

/// Delay schedule between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay before every retry
    Fixed(Duration),
    /// Doubling delay starting at `initial`, capped at `max`
    Exponential { initial: Duration, max: Duration },
}

impl Backoff {
    /// Delay to wait after the given (1-based) failed attempt
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { initial, max } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                initial.saturating_mul(factor).min(max)
            }
        }
    }
}

/// How many times to try one model and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::Fixed(Duration::from_secs(5)),
        }
    }
}

/// Run `op` until it succeeds or the policy's attempts are spent
///
/// Every error is treated as retryable. The delay is applied between
/// attempts only, never after the last one. On exhaustion the last error
/// is returned.
pub async fn invoke_with_retry<T, E, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    debug!(%label, max_attempts, "invoke_with_retry: called");

    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => {
                debug!(%label, attempt, "invoke_with_retry: success");
                return Ok(value);
            }
            Err(e) if attempt < max_attempts => {
                let delay = policy.backoff.delay(attempt);
                warn!(%label, attempt, max_attempts, error = %e, ?delay, "Attempt failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                warn!(%label, attempt, error = %e, "All attempts failed");
                return Err(e);
            }
        }
    }
}
