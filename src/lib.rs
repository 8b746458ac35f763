//! Mender - Automated Code Repair Pipeline
//!
//! Mender takes a runtime or build error from a generated web application,
//! assembles the surrounding code context, asks an AI fix service for a
//! surgical patch, validates and applies it under a snapshot, verifies the
//! result at runtime, and rolls back anything that fails. Every attempt is
//! recorded in a durable history that feeds future confidence scoring.
//!
//! # Architecture
//!
//! The crate follows Hexagonal Architecture:
//!
//! - **Domain Layer** (`domain`): models, ports, and errors
//! - **Service Layer** (`services`): the repair pipeline proper
//! - **Infrastructure Layer** (`infrastructure`): adapters behind the ports
//! - **CLI Layer** (`cli`): command-line interface

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    AppError, ApplyOutcome, Config, DatabaseConfig, EngineConfig, ErrorCategory, ErrorContext,
    FixHistoryEntry, FixResult, FixSuggestion, FixType, LoggingConfig, RateLimitConfig,
    RetryConfig, ValidationResult,
};
pub use domain::ports::{
    FixHistoryRepository, FixService, ProjectStore, RuntimeProbe, StaticAnalyzer,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::RepairPipeline;
