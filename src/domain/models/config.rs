//! Configuration model.
//!
//! Loaded hierarchically by the config loader (defaults, then `mender.yaml`,
//! then `MENDER_*` environment variables).

use serde::{Deserialize, Serialize};

/// Top-level configuration for the repair pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
    pub rate_limit: RateLimitConfig,
    pub engine: EngineConfig,
    pub fix_service: FixServiceConfig,
    pub transport_retry: RetryConfig,
    pub preview: PreviewConfig,
}

/// Logging output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace | debug | info | warn | error
    pub level: String,
    /// json | pretty
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// SQLite fix-history database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: ".mender/history.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Fixed-window rate limit on externally-triggered fix attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests allowed per window, per (project, user) key
    pub max_requests: u32,
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window_secs: 60,
        }
    }
}

/// Iterative fix engine bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum generation attempts per session
    pub max_attempts: u32,
    /// Base of the exponential backoff between attempts, in milliseconds.
    /// The sleep after attempt `n` is `backoff_base_ms * 2^n`.
    pub backoff_base_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base_ms: 1_000,
        }
    }
}

/// External AI code-fixing service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FixServiceConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f64,
    /// Environment variable holding the API key
    pub api_key_env: String,
}

impl Default for FixServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.anthropic.com".to_string(),
            model: "claude-3-5-sonnet-20241022".to_string(),
            max_tokens: 4096,
            temperature: 0.2,
            api_key_env: "MENDER_API_KEY".to_string(),
        }
    }
}

/// Transport-level retry policy for the fix service HTTP client.
///
/// Independent of the engine's semantic retry loop: this only covers
/// transient HTTP failures (rate limits, 5xx, timeouts).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 1_000,
            max_backoff_ms: 60_000,
        }
    }
}

/// Headless runtime probe target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Base URL of the live preview; the project id is appended
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/preview".to_string(),
            timeout_secs: 15,
        }
    }
}
