//! In-memory snapshot store backing the applicator's rollback guarantee.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ProjectState, Snapshot};

/// Owned component holding pre-application snapshots keyed by generated id.
///
/// Ids combine a millisecond timestamp with a random suffix so concurrent
/// sessions never collide. Restore consumes the snapshot: a second restore of
/// the same id fails cleanly with `SnapshotNotFound` rather than corrupting
/// state. In a multi-process deployment this would need to become an external
/// short-TTL keyed store so rollback can run anywhere.
#[derive(Default)]
pub struct SnapshotStore {
    snapshots: Mutex<HashMap<String, Snapshot>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the given state and return the snapshot id.
    pub async fn create(&self, state: &ProjectState) -> String {
        let id = format!(
            "snap_{}_{}",
            Utc::now().timestamp_millis(),
            &Uuid::new_v4().simple().to_string()[..8]
        );
        let snapshot = Snapshot {
            id: id.clone(),
            state: state.clone(),
            taken_at: Utc::now(),
        };
        self.snapshots.lock().await.insert(id.clone(), snapshot);
        debug!(snapshot_id = %id, "snapshot created");
        id
    }

    /// Remove and return the snapshot for a restore. Consuming semantics:
    /// the id is invalid afterwards.
    pub async fn take(&self, id: &str) -> DomainResult<Snapshot> {
        self.snapshots
            .lock()
            .await
            .remove(id)
            .ok_or_else(|| DomainError::SnapshotNotFound(id.to_string()))
    }

    /// Drop a snapshot without restoring (successful commit path).
    /// Returns false if the id was already gone.
    pub async fn discard(&self, id: &str) -> bool {
        let removed = self.snapshots.lock().await.remove(id).is_some();
        if removed {
            debug!(snapshot_id = %id, "snapshot discarded");
        }
        removed
    }

    /// Number of live snapshots, for tests and monitoring.
    pub async fn len(&self) -> usize {
        self.snapshots.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.snapshots.lock().await.is_empty()
    }
}
