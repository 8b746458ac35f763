//! Fixed-window rate limiter bounding calls to the paid fix service.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::warn;

use crate::domain::models::RateLimitConfig;

/// Decision returned by a rate limit check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Requests left in the current window (0 when rejected)
    pub remaining: u32,
    /// Wall-clock time the current window resets
    pub reset_time: DateTime<Utc>,
    /// How long to wait before retrying, present only when rejected
    pub retry_after: Option<Duration>,
}

struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window counter keyed by (project, optional user).
///
/// Checked once per externally-triggered fix attempt, not per internal retry,
/// so one session's retry loop consumes a single slot.
pub struct FixedWindowRateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl FixedWindowRateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window: Duration::from_secs(config.window_secs),
            windows: Mutex::new(HashMap::new()),
        }
    }

    fn composite_key(project_key: &str, user_key: Option<&str>) -> String {
        match user_key {
            Some(user) => format!("{project_key}:{user}"),
            None => project_key.to_string(),
        }
    }

    /// Check and consume one slot for the given key.
    pub async fn check(&self, project_key: &str, user_key: Option<&str>) -> RateLimitDecision {
        let key = Self::composite_key(project_key, user_key);
        let now = Instant::now();
        let mut windows = self.windows.lock().await;

        // Drop every elapsed window, the current key's included: an expired
        // window and a missing one are equivalent, and keys for projects that
        // stopped calling must not accumulate.
        windows.retain(|_, w| now.duration_since(w.started) < self.window);

        let window = windows.entry(key.clone()).or_insert(Window {
            started: now,
            count: 0,
        });

        let elapsed = now.duration_since(window.started);
        let reset_in = self.window.saturating_sub(elapsed);
        let reset_time = Utc::now() + chrono::Duration::from_std(reset_in).unwrap_or_default();

        if window.count >= self.max_requests {
            warn!(key = %key, limit = self.max_requests, "rate limit exceeded");
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_time,
                retry_after: Some(reset_in.max(Duration::from_secs(1))),
            };
        }

        window.count += 1;
        RateLimitDecision {
            allowed: true,
            remaining: self.max_requests - window.count,
            reset_time,
            retry_after: None,
        }
    }

    /// Number of live windows, for tests and monitoring.
    pub async fn tracked_keys(&self) -> usize {
        self.windows.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32, window_secs: u64) -> FixedWindowRateLimiter {
        FixedWindowRateLimiter::new(&RateLimitConfig {
            max_requests,
            window_secs,
        })
    }

    #[tokio::test]
    async fn allows_up_to_limit_then_rejects() {
        let limiter = limiter(3, 60);

        for expected_remaining in [2, 1, 0] {
            let decision = limiter.check("project-1", None).await;
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
        }

        let decision = limiter.check("project-1", None).await;
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
        assert!(decision.retry_after.unwrap() > Duration::ZERO);
    }

    #[tokio::test]
    async fn keys_are_isolated() {
        let limiter = limiter(1, 60);

        assert!(limiter.check("project-1", None).await.allowed);
        assert!(!limiter.check("project-1", None).await.allowed);
        // Different project and different user keys get their own windows.
        assert!(limiter.check("project-2", None).await.allowed);
        assert!(limiter.check("project-1", Some("user-a")).await.allowed);
    }

    #[tokio::test]
    async fn window_resets_after_elapsed() {
        let limiter = limiter(1, 1);

        assert!(limiter.check("p", None).await.allowed);
        assert!(!limiter.check("p", None).await.allowed);

        tokio::time::sleep(Duration::from_millis(1_100)).await;
        assert!(limiter.check("p", None).await.allowed);
    }

    #[tokio::test]
    async fn elapsed_windows_are_evicted() {
        let limiter = limiter(1, 1);

        limiter.check("p1", None).await;
        limiter.check("p2", None).await;
        assert_eq!(limiter.tracked_keys().await, 2);

        tokio::time::sleep(Duration::from_millis(1_100)).await;
        // The next check sweeps out both stale windows.
        limiter.check("p3", None).await;
        assert_eq!(limiter.tracked_keys().await, 1);
    }
}
