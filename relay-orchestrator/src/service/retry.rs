//! Bounded retry with exponential backoff

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// Attempt budget and backoff bounds for one operation class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            max_delay,
        }
    }

    /// A single attempt
    pub const fn once() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    /// Delay after the `attempt`-th failure (1-based), doubling up to `max_delay`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// Runs `op` until it succeeds, fails with a non-retryable error, or the
/// policy's attempts are used up.
pub async fn with_backoff<T, E, F, Fut, R>(
    policy: &RetryPolicy,
    operation: &str,
    mut op: F,
    retryable: R,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    E: Display,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    info!("{} succeeded after {} attempt(s)", operation, attempt);
                }
                return Ok(value);
            }
            Err(e) if attempt < policy.max_attempts && retryable(&e) => {
                let delay = policy.delay_for(attempt);
                warn!(
                    "{} failed (attempt {}/{}): {}. Retrying in {:?}",
                    operation, attempt, policy.max_attempts, e, delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
