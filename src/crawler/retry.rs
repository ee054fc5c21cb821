//! Retry orchestration with exponential backoff
//!
//! An attempt succeeds only when it finishes without error and yields at least
//! one item. Empty results are retried like errors.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// Delay between attempts, swappable in tests
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Runs a crawl attempt up to `max_attempts` times
pub struct RetryOrchestrator<S: Sleeper = TokioSleeper> {
    max_attempts: u32,
    backoff_unit: Duration,
    sleeper: S,
}

impl RetryOrchestrator<TokioSleeper> {
    pub fn new(max_attempts: u32, backoff_unit: Duration) -> Self {
        Self::with_sleeper(max_attempts, backoff_unit, TokioSleeper)
    }
}

impl<S: Sleeper> RetryOrchestrator<S> {
    pub fn with_sleeper(max_attempts: u32, backoff_unit: Duration, sleeper: S) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_unit,
            sleeper,
        }
    }

    /// Delay after failed attempt `attempt` (1-based): unit × 2^attempt
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_unit
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Calls `attempt_fn(attempt)` until it yields a non-empty result
    ///
    /// When every attempt fails, the final attempt decides: its error is
    /// returned, or an empty list if it merely found nothing.
    pub async fn run<T, F, Fut>(&self, mut attempt_fn: F) -> crate::Result<Vec<T>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = crate::Result<Vec<T>>>,
    {
        let mut attempt = 1;
        loop {
            tracing::info!("Attempt {}/{}", attempt, self.max_attempts);

            let outcome = attempt_fn(attempt).await;
            match &outcome {
                Ok(items) if !items.is_empty() => {
                    tracing::info!("Attempt {} collected {} items", attempt, items.len());
                    return outcome;
                }
                Ok(_) => tracing::warn!("Attempt {} found nothing", attempt),
                Err(e) => tracing::error!("Attempt {} failed: {}", attempt, e),
            }

            if attempt >= self.max_attempts {
                tracing::error!("All {} attempts exhausted", self.max_attempts);
                return outcome;
            }

            let delay = self.backoff(attempt);
            tracing::info!("Retrying in {:?}", delay);
            self.sleeper.sleep(delay).await;
            attempt += 1;
        }
    }
}
