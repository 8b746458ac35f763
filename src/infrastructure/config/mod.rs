//! Hierarchical configuration loading.

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid rate limit max_requests: {0}. Must be at least 1")]
    InvalidMaxRequests(u32),

    #[error("Invalid rate limit window_secs: {0}. Must be at least 1")]
    InvalidWindow(u64),

    #[error("Invalid max_attempts: {0}. Must be between 1 and 10")]
    InvalidMaxAttempts(u32),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must not exceed max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Invalid temperature: {0}. Must be between 0.0 and 1.0")]
    InvalidTemperature(f64),

    #[error("Fix service base_url cannot be empty")]
    EmptyBaseUrl,
}

/// Loads configuration with hierarchical merging.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with precedence (lowest to highest):
    /// 1. Programmatic defaults
    /// 2. `mender.yaml` in the working directory
    /// 3. Environment variables (`MENDER_*` prefix)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file("mender.yaml"))
            .merge(Env::prefixed("MENDER_").split("__"))
            .extract()
            .context("Failed to extract configuration")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still layered over defaults.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading.
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        if config.rate_limit.max_requests == 0 {
            return Err(ConfigError::InvalidMaxRequests(config.rate_limit.max_requests));
        }
        if config.rate_limit.window_secs == 0 {
            return Err(ConfigError::InvalidWindow(config.rate_limit.window_secs));
        }

        if config.engine.max_attempts == 0 || config.engine.max_attempts > 10 {
            return Err(ConfigError::InvalidMaxAttempts(config.engine.max_attempts));
        }

        if config.transport_retry.initial_backoff_ms > config.transport_retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.transport_retry.initial_backoff_ms,
                config.transport_retry.max_backoff_ms,
            ));
        }

        if config.fix_service.base_url.is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        if !(0.0..=1.0).contains(&config.fix_service.temperature) {
            return Err(ConfigError::InvalidTemperature(config.fix_service.temperature));
        }

        Ok(())
    }
}
