//! Port trait for the durable fix-history log.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{ErrorCategory, FixHistoryEntry};

/// Append-only store of repair attempts, keyed by project.
///
/// The log feeds two consumers: the confidence scorer (historical success
/// rate per error category) and audit/telemetry dashboards. Entries are
/// never updated or deleted.
#[async_trait]
pub trait FixHistoryRepository: Send + Sync {
    /// Append one attempt record.
    async fn append(&self, entry: &FixHistoryEntry) -> DomainResult<()>;

    /// All entries for a project, newest first.
    async fn for_project(&self, project_id: &str) -> DomainResult<Vec<FixHistoryEntry>>;

    /// Failed entries only, for audit review.
    async fn failed_for_project(&self, project_id: &str) -> DomainResult<Vec<FixHistoryEntry>>;

    /// Success count / total count per error category across a project.
    async fn success_rate_by_category(
        &self,
        project_id: &str,
    ) -> DomainResult<HashMap<ErrorCategory, f64>>;
}
