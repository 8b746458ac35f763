//! Port trait for the external project store.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{ChangeEvent, ProjectState, ProjectUpdate};

/// External key-value store holding project file content and metadata.
///
/// The store is assumed to have last-writer-wins semantics; the pipeline adds
/// no optimistic concurrency control on top. Two concurrent sessions against
/// the same project therefore race, with the later write prevailing.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Fetch the full current state of a project.
    async fn get(&self, project_id: &str) -> DomainResult<ProjectState>;

    /// Push a partial update; `None` fields are left untouched.
    async fn update(&self, project_id: &str, update: ProjectUpdate) -> DomainResult<()>;

    /// Append an entry to the project's change journal.
    async fn record_change(&self, project_id: &str, event: ChangeEvent) -> DomainResult<()>;

    /// Most recent change journal entries, newest first.
    async fn recent_changes(
        &self,
        project_id: &str,
        limit: usize,
    ) -> DomainResult<Vec<ChangeEvent>>;
}
