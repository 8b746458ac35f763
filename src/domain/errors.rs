//! Domain errors for the Mender repair pipeline.

use thiserror::Error;

/// Domain-level errors that can occur during a repair session.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(String),

    #[error("Invalid fix: {0}")]
    InvalidFix(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Application failed: {0}")]
    ApplicationFailed(String),

    #[error("Fix generation failed: {0}")]
    GenerationFailed(String),

    #[error("Rate limit exceeded for {key}, retry after {retry_after_secs}s")]
    RateLimited { key: String, retry_after_secs: u64 },

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Probe error: {0}")]
    ProbeError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
