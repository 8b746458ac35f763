//! Fix history bookkeeping over the durable repository.

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    AppError, ErrorCategory, FixAttempt, FixHistoryEntry,
};
use crate::domain::ports::FixHistoryRepository;

/// Historical success rate assumed when a project has no history yet.
const DEFAULT_SUCCESS_RATE: f64 = 0.5;

/// Records every attempt and aggregates outcomes for the confidence scorer.
pub struct FixHistoryService {
    repository: Arc<dyn FixHistoryRepository>,
}

impl FixHistoryService {
    pub fn new(repository: Arc<dyn FixHistoryRepository>) -> Self {
        Self { repository }
    }

    /// Append one attempt to the log. Telemetry writes must not fail the
    /// repair session, so errors are logged and swallowed here.
    pub async fn record_attempt(&self, project_id: &str, error: &AppError, attempt: &FixAttempt) {
        let entry = FixHistoryEntry {
            id: Uuid::new_v4(),
            project_id: project_id.to_string(),
            error_id: error.id,
            error_message: error.message.clone(),
            error_category: ErrorCategory::classify(&error.message),
            fix: attempt.fix.clone(),
            applied_fix: attempt.outcome.applied_fix.clone(),
            success: attempt.success,
            attempts: attempt.attempt_number,
            timestamp: Utc::now(),
        };
        if let Err(err) = self.repository.append(&entry).await {
            warn!(project_id, error = %err, "failed to record fix history entry");
        }
    }

    /// Success rate for an error category, defaulting to 0.5 when the
    /// project has no relevant history.
    pub async fn success_rate(&self, project_id: &str, category: ErrorCategory) -> f64 {
        match self.repository.success_rate_by_category(project_id).await {
            Ok(rates) => rates.get(&category).copied().unwrap_or(DEFAULT_SUCCESS_RATE),
            Err(err) => {
                warn!(project_id, error = %err, "failed to load success rates");
                DEFAULT_SUCCESS_RATE
            }
        }
    }

    /// Entries recorded for a project, newest first.
    pub async fn entries(&self, project_id: &str) -> DomainResult<Vec<FixHistoryEntry>> {
        self.repository.for_project(project_id).await
    }

    /// Failed entries only, for audit review.
    pub async fn failed_entries(&self, project_id: &str) -> DomainResult<Vec<FixHistoryEntry>> {
        self.repository.failed_for_project(project_id).await
    }

    /// Prior entries matching a specific error, used by the context builder
    /// to show the generator what has already been tried.
    pub async fn entries_for_error(
        &self,
        project_id: &str,
        error: &AppError,
    ) -> DomainResult<Vec<FixHistoryEntry>> {
        let entries = self.repository.for_project(project_id).await?;
        Ok(entries
            .into_iter()
            .filter(|e| e.error_id == error.id || e.error_message == error.message)
            .collect())
    }
}
