//! Retry policy for idempotent requests.
//!
//! Exponential backoff with full jitter over a bounded number of attempts.
//! Only transient failures (see [`crate::error::AppError::is_transient`]) are retried, and
//! only for requests marked idempotent; order placement and cancellation go
//! out exactly once.

use std::{future::Future, time::Duration};

use rand::Rng;
use tracing::warn;

use crate::error::Result;

/// Backoff configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay ceiling before the first retry.
    pub base_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    pub fn none() -> Self {
        Self { max_attempts: 1, ..Self::default() }
    }

    /// Backoff ceiling after `attempt` failed attempts (1-based).
    pub fn ceiling(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1u32 << exponent).min(self.max_delay)
    }

    /// Jittered delay in `[0, ceiling(attempt)]`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let ceiling = self.ceiling(attempt).as_millis() as u64;
        if ceiling == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=ceiling))
    }

    /// Run `operation`, retrying transient failures when `idempotent` is set.
    pub async fn run<T, F, Fut>(&self, idempotent: bool, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = if idempotent { self.max_attempts.max(1) } else { 1 };
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < max_attempts && err.is_transient() => {
                    let delay = self.delay(attempt);
                    warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    #[test]
    fn test_ceiling_grows_exponentially_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(1000),
        };

        assert_eq!(policy.ceiling(1), Duration::from_millis(100));
        assert_eq!(policy.ceiling(2), Duration::from_millis(200));
        assert_eq!(policy.ceiling(3), Duration::from_millis(400));
        assert_eq!(policy.ceiling(5), Duration::from_millis(1000));
        assert_eq!(policy.ceiling(40), Duration::from_millis(1000));
    }

    #[test]
    fn test_delay_within_ceiling() {
        let policy = RetryPolicy::default();
        for attempt in 1..6 {
            assert!(policy.delay(attempt) <= policy.ceiling(attempt));
        }
    }

    #[tokio::test]
    async fn test_retries_transient_idempotent_failures() {
        let calls = AtomicU32::new(0);

        let result = fast_policy(3)
            .run(true, || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(AppError::Transport { status: 503, reason: "busy".into() })
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);

        let result: Result<()> = fast_policy(2)
            .run(true, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::Network("connection reset".into()))
            })
            .await;

        assert!(matches!(result, Err(AppError::Network(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_idempotent_runs_once() {
        let calls = AtomicU32::new(0);

        let result: Result<()> = fast_policy(5)
            .run(false, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::Transport { status: 502, reason: "bad gateway".into() })
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_permanent_failure_not_retried() {
        let calls = AtomicU32::new(0);

        let result: Result<()> = fast_policy(5)
            .run(true, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::Transport { status: 404, reason: "not found".into() })
            })
            .await;

        assert_eq!(result.unwrap_err().status(), Some(404));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
