//! Error context models.
//!
//! An [`ErrorContext`] is the bundle the context builder assembles for the
//! fix generator: the error itself, surrounding code, project shape, and
//! what has already been tried.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::project::{ChangeEvent, ProjectMetadata};

/// The application error a repair session is resolving.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppError {
    pub id: Uuid,
    pub message: String,
    pub stack: Option<String>,
    /// Explicit location when the hosting app already knows it
    pub file: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

impl AppError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            message: message.into(),
            stack: None,
            file: None,
            line: None,
            column: None,
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }
}

/// A file related to the failing one by its import list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedFile {
    pub path: String,
    pub content: String,
}

/// A previously attempted fix for the same error, shown to the generator so
/// repeated failures are not retried blindly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptedFix {
    pub explanation: String,
    pub failure_reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Context bundle handed to the fix generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    pub error: AppError,
    pub project_id: String,
    /// Resolved target file path (empty = primary file)
    pub target_file: String,
    /// Full content of the target file
    pub file_content: String,
    /// Windowed excerpt around the failing line, with a marker on the line
    pub excerpt: String,
    /// Import specifiers detected in the target file
    pub imports: Vec<String>,
    pub metadata: ProjectMetadata,
    pub related_files: Vec<RelatedFile>,
    pub recent_changes: Vec<ChangeEvent>,
    /// Prior attempts for this error, oldest first
    pub previous_attempts: Vec<AttemptedFix>,
}

impl ErrorContext {
    /// Record a failed attempt so the next generation sees it.
    pub fn push_attempt(&mut self, explanation: String, failure_reason: Option<String>) {
        self.previous_attempts.push(AttemptedFix {
            explanation,
            failure_reason,
            timestamp: Utc::now(),
        });
    }
}
