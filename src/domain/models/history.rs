//! Fix history models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::fix::{AppliedFix, FixSuggestion};
use super::report::ErrorCategory;

/// Durable, append-only record of one repair attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixHistoryEntry {
    pub id: Uuid,
    pub project_id: String,
    pub error_id: Uuid,
    pub error_message: String,
    pub error_category: ErrorCategory,
    pub fix: FixSuggestion,
    pub applied_fix: Option<AppliedFix>,
    pub success: bool,
    /// Attempt number within the session this entry belongs to
    pub attempts: u32,
    pub timestamp: DateTime<Utc>,
}
