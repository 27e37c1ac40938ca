// Fixed-delay bounded retry
//
// Wraps a single appliance operation. Only errors that report themselves
// retryable are attempted again; everything else fails on the first try.
// Exhausting the budget surfaces the last error.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

/// Errors that know whether another attempt could succeed.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for nebula_api::Error {
    fn is_retryable(&self) -> bool {
        nebula_api::Error::is_retryable(self)
    }
}

/// Attempt budgets per operation. Authentication and teardown get fewer
/// attempts than the operations that move data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    pub authenticate: u32,
    pub delete_session: u32,
    pub transfer_bundle: u32,
    pub read_config: u32,
    pub patch_config: u32,
    pub trigger_rebuild: u32,
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self {
            authenticate: 3,
            delete_session: 3,
            transfer_bundle: 5,
            read_config: 5,
            patch_config: 5,
            trigger_rebuild: 5,
        }
    }
}

/// Retry with a fixed delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `op` up to `attempts` times (at least once).
    pub async fn run<T, E, F, Fut>(&self, operation: &str, attempts: u32, mut op: F) -> Result<T, E>
    where
        E: Retryable + std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let attempts = attempts.max(1);
        let mut attempt = 1;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= attempts || !e.is_retryable() => return Err(e),
                Err(e) => {
                    debug!(operation, attempt, error = %e, "retrying({})", attempt + 1);
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
