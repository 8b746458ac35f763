//! Transport-level retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::domain::models::RetryConfig;
use crate::domain::ports::FixServiceError;

/// Retries transient fix service errors with exponential backoff.
///
/// Backoff doubles per retry, capped at `max_backoff_ms`. Permanent errors
/// (bad request, auth failure, malformed response) return immediately.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    initial_backoff_ms: u64,
    max_backoff_ms: u64,
}

impl RetryPolicy {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_backoff_ms: config.initial_backoff_ms.max(1),
            max_backoff_ms: config.max_backoff_ms.max(config.initial_backoff_ms),
        }
    }

    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, FixServiceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FixServiceError>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        debug!(retries = attempt, "request succeeded after retries");
                    }
                    return Ok(result);
                }
                Err(err) => {
                    if !self.should_retry(&err, attempt) {
                        return Err(err);
                    }
                    let backoff = self.calculate_backoff(attempt);
                    warn!(
                        attempt = attempt + 1,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "transient error, retrying"
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }

    fn should_retry(&self, error: &FixServiceError, attempt: u32) -> bool {
        attempt < self.max_retries && error.is_transient()
    }

    fn calculate_backoff(&self, attempt: u32) -> Duration {
        let millis = self
            .initial_backoff_ms
            .saturating_mul(2_u64.saturating_pow(attempt))
            .min(self.max_backoff_ms);
        Duration::from_millis(millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(&RetryConfig {
            max_retries,
            initial_backoff_ms: 1,
            max_backoff_ms: 10,
        })
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::new(&RetryConfig {
            max_retries: 5,
            initial_backoff_ms: 1_000,
            max_backoff_ms: 4_000,
        });
        assert_eq!(policy.calculate_backoff(0), Duration::from_millis(1_000));
        assert_eq!(policy.calculate_backoff(1), Duration::from_millis(2_000));
        assert_eq!(policy.calculate_backoff(2), Duration::from_millis(4_000));
        assert_eq!(policy.calculate_backoff(3), Duration::from_millis(4_000));
    }

    #[tokio::test]
    async fn transient_errors_are_retried_until_success() {
        let policy = fast_policy(3);
        let calls = Arc::new(AtomicU32::new(0));

        let result = policy
            .execute(|| {
                let calls = Arc::clone(&calls);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(FixServiceError::Overloaded)
                    } else {
                        Ok(7)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_fail_immediately() {
        let policy = fast_policy(3);
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), _> = policy
            .execute(|| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(FixServiceError::AuthenticationFailed("bad key".to_string()))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_stop_after_max() {
        let policy = fast_policy(2);
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), _> = policy
            .execute(|| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(FixServiceError::RateLimitExceeded)
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
