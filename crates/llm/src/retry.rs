use longsum_common::{LongsumError, Result};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Attempt budget for one completion call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (0 is treated as 1)
    pub max_retries: u32,

    /// Per-attempt timeout
    pub timeout: Duration,

    /// Delay before the second attempt, doubled for every later one
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            timeout: Duration::from_millis(6000),
            backoff: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    /// Create policy without backoff
    pub fn new(max_retries: u32, timeout: Duration) -> Self {
        Self {
            max_retries,
            timeout,
            backoff: Duration::ZERO,
        }
    }

    /// Set base backoff delay
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff
            .checked_mul(2u32.saturating_pow(attempt - 1))
            .unwrap_or(Duration::MAX)
    }
}

/// Run `attempt` until it succeeds or the policy is exhausted
///
/// Each attempt is bounded by `policy.timeout`. Attempt errors are logged and
/// swallowed; exhaustion always yields `CallFailed`.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut attempt: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.attempts();

    for n in 1..=max_attempts {
        match tokio::time::timeout(policy.timeout, attempt()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => {
                warn!("{} request failed (attempt {}/{}): {}", label, n, max_attempts, e);
            }
            Err(_) => {
                warn!(
                    "{} request timed out after {:?} (attempt {}/{})",
                    label, policy.timeout, n, max_attempts
                );
            }
        }

        if n < max_attempts && !policy.backoff.is_zero() {
            let delay = policy.delay_after(n);
            warn!("Retrying {} request in {:?}...", label, delay);
            tokio::time::sleep(delay).await;
        }
    }

    Err(LongsumError::call_failed(format!(
        "{} request failed after {} attempts",
        label, max_attempts
    )))
}
