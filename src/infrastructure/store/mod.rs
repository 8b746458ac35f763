//! In-memory project store.
//!
//! Backs unit tests and single-process deployments. Holds project state and
//! a bounded change journal per project behind one async mutex, giving the
//! same last-writer-wins behavior as the real external store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ChangeEvent, ProjectMetadata, ProjectState, ProjectUpdate};
use crate::domain::ports::ProjectStore;

const JOURNAL_CAP: usize = 100;

#[derive(Default)]
struct ProjectRecord {
    state: ProjectState,
    journal: Vec<ChangeEvent>,
}

/// Process-local [`ProjectStore`] implementation.
#[derive(Default)]
pub struct InMemoryProjectStore {
    projects: Mutex<HashMap<String, ProjectRecord>>,
}

impl InMemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a project with the given primary file content.
    pub async fn seed(&self, project_id: &str, file_content: &str, metadata: ProjectMetadata) {
        let mut projects = self.projects.lock().await;
        projects.insert(
            project_id.to_string(),
            ProjectRecord {
                state: ProjectState {
                    file_content: file_content.to_string(),
                    files: Default::default(),
                    metadata,
                },
                journal: Vec::new(),
            },
        );
    }

    /// Add or replace a named file on an already-seeded project.
    pub async fn seed_file(&self, project_id: &str, path: &str, content: &str) {
        let mut projects = self.projects.lock().await;
        if let Some(record) = projects.get_mut(project_id) {
            record
                .state
                .files
                .insert(path.to_string(), content.to_string());
        }
    }

    pub async fn get(&self, project_id: &str) -> DomainResult<ProjectState> {
        let projects = self.projects.lock().await;
        projects
            .get(project_id)
            .map(|record| record.state.clone())
            .ok_or_else(|| DomainError::ProjectNotFound(project_id.to_string()))
    }
}

#[async_trait]
impl ProjectStore for InMemoryProjectStore {
    async fn get(&self, project_id: &str) -> DomainResult<ProjectState> {
        InMemoryProjectStore::get(self, project_id).await
    }

    async fn update(&self, project_id: &str, update: ProjectUpdate) -> DomainResult<()> {
        let mut projects = self.projects.lock().await;
        let record = projects
            .get_mut(project_id)
            .ok_or_else(|| DomainError::ProjectNotFound(project_id.to_string()))?;
        if let Some(file_content) = update.file_content {
            record.state.file_content = file_content;
        }
        if let Some(files) = update.files {
            record.state.files = files;
        }
        if let Some(metadata) = update.metadata {
            record.state.metadata = metadata;
        }
        Ok(())
    }

    async fn record_change(&self, project_id: &str, event: ChangeEvent) -> DomainResult<()> {
        let mut projects = self.projects.lock().await;
        let record = projects
            .get_mut(project_id)
            .ok_or_else(|| DomainError::ProjectNotFound(project_id.to_string()))?;
        record.journal.push(event);
        if record.journal.len() > JOURNAL_CAP {
            let excess = record.journal.len() - JOURNAL_CAP;
            record.journal.drain(..excess);
        }
        Ok(())
    }

    async fn recent_changes(
        &self,
        project_id: &str,
        limit: usize,
    ) -> DomainResult<Vec<ChangeEvent>> {
        let projects = self.projects.lock().await;
        let record = projects
            .get(project_id)
            .ok_or_else(|| DomainError::ProjectNotFound(project_id.to_string()))?;
        Ok(record.journal.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_unknown_project_is_not_found() {
        let store = InMemoryProjectStore::new();
        assert!(matches!(
            store.get("missing").await,
            Err(DomainError::ProjectNotFound(_))
        ));
    }

    #[tokio::test]
    async fn partial_update_leaves_other_fields_untouched() {
        let store = InMemoryProjectStore::new();
        store.seed("p1", "original\n", Default::default()).await;
        store.seed_file("p1", "util.js", "export {};\n").await;

        ProjectStore::update(
            &store,
            "p1",
            ProjectUpdate {
                file_content: Some("changed\n".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let state = store.get("p1").await.unwrap();
        assert_eq!(state.file_content, "changed\n");
        assert_eq!(state.files.get("util.js").map(String::as_str), Some("export {};\n"));
    }

    #[tokio::test]
    async fn journal_returns_newest_first_and_respects_limit() {
        let store = InMemoryProjectStore::new();
        store.seed("p1", "x\n", Default::default()).await;
        for i in 0..5 {
            store
                .record_change("p1", ChangeEvent::now(format!("change {i}"), None))
                .await
                .unwrap();
        }

        let recent = store.recent_changes("p1", 2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].description, "change 4");
        assert_eq!(recent[1].description, "change 3");
    }
}
