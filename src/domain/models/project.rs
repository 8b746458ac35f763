//! Project state models.
//!
//! The project store is an external collaborator; these types describe the
//! slice of its state the pipeline reads, mutates, and snapshots.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Project metadata as held by the project store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub name: String,
    /// Framework label inferred from the dependency manifest
    pub framework: String,
    /// Declared dependencies: package name -> version requirement
    pub dependencies: BTreeMap<String, String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Full project state returned by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectState {
    /// Primary file content (the "main component" in single-file projects)
    pub file_content: String,
    /// Named files beyond the primary one, keyed by path
    pub files: BTreeMap<String, String>,
    pub metadata: ProjectMetadata,
}

impl ProjectState {
    /// Content of a named file, falling back to the primary file when the
    /// path is empty or unknown.
    pub fn content_of(&self, path: &str) -> &str {
        if path.is_empty() {
            return &self.file_content;
        }
        self.files
            .get(path)
            .map_or(&self.file_content, String::as_str)
    }
}

/// Partial update pushed back to the store; `None` fields are untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectUpdate {
    pub file_content: Option<String>,
    pub files: Option<BTreeMap<String, String>>,
    pub metadata: Option<ProjectMetadata>,
}

impl ProjectUpdate {
    /// Full-state update used by snapshot restore and fix application.
    pub fn from_state(state: &ProjectState) -> Self {
        Self {
            file_content: Some(state.file_content.clone()),
            files: Some(state.files.clone()),
            metadata: Some(state.metadata.clone()),
        }
    }
}

/// One entry in the project's change journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub description: String,
    pub file: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn now(description: impl Into<String>, file: Option<String>) -> Self {
        Self {
            description: description.into(),
            file,
            timestamp: Utc::now(),
        }
    }
}

/// Point-in-time capture of project state, enabling rollback.
///
/// Created immediately before every application attempt. Restore consumes the
/// snapshot; a successful commit discards it without restoring.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub id: String,
    pub state: ProjectState,
    pub taken_at: DateTime<Utc>,
}
