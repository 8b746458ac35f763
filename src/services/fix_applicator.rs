//! Transactional fix application.
//!
//! The applicator walks a fix through the phases
//! idle → snapshotting → validating → applying → testing →
//! {committed | rolled_back}. A snapshot is taken before anything mutates,
//! and every failure path after that restores it, so a failed attempt leaves
//! the project exactly as it found it.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    AppliedFix, ApplyOutcome, ApplyPhase, ChangeEvent, FileOperation, FixSuggestion, FixType,
    PackageAction, ProjectState, ProjectUpdate,
};
use crate::domain::ports::ProjectStore;
use crate::services::fix_tester::FixTester;
use crate::services::fix_validator::FixValidator;
use crate::services::snapshot_store::SnapshotStore;

/// Per-application options.
#[derive(Debug, Clone, Copy)]
pub struct ApplyOptions {
    /// Capture a snapshot before mutating (disabled only in tests)
    pub snapshot: bool,
    /// Run the post-application test battery
    pub run_tests: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            snapshot: true,
            run_tests: true,
        }
    }
}

/// Applies fix suggestions to the project store with snapshot/rollback.
pub struct FixApplicator {
    store: Arc<dyn ProjectStore>,
    validator: FixValidator,
    tester: FixTester,
    snapshots: Arc<SnapshotStore>,
}

impl FixApplicator {
    pub fn new(
        store: Arc<dyn ProjectStore>,
        validator: FixValidator,
        tester: FixTester,
        snapshots: Arc<SnapshotStore>,
    ) -> Self {
        Self {
            store,
            validator,
            tester,
            snapshots,
        }
    }

    /// Apply a fix, returning the terminal outcome. Never returns `Err`:
    /// every internal failure is converted into a rolled-back outcome with
    /// the cause as the failure reason.
    pub async fn apply(
        &self,
        fix: &FixSuggestion,
        project_id: &str,
        original_error: &str,
        options: ApplyOptions,
    ) -> ApplyOutcome {
        // Input errors: malformed fixes are rejected before any state is
        // read, and are never retried by this layer.
        if let Err(reason) = fix.check_shape() {
            return failure(ApplyPhase::Idle, reason, false, None);
        }

        let state = match self.store.get(project_id).await {
            Ok(state) => state,
            Err(err) => {
                return failure(
                    ApplyPhase::Idle,
                    format!("project fetch failed: {err}"),
                    false,
                    None,
                )
            }
        };

        // snapshotting
        let snapshot_id = if options.snapshot {
            Some(self.snapshots.create(&state).await)
        } else {
            None
        };
        debug!(project_id, fix_id = %fix.id, phase = ApplyPhase::Snapshotting.as_str(), "snapshot taken");

        // validating: nothing has mutated yet, so a failed gate only needs
        // to release the snapshot, not restore it.
        let pre = self
            .validator
            .validate_pre_application(fix, state.content_of(&fix.target_file));
        if !pre.valid {
            if let Some(id) = &snapshot_id {
                self.snapshots.discard(id).await;
            }
            let reason = pre.failure_messages().join("; ");
            warn!(project_id, fix_id = %fix.id, reason, "pre-application validation rejected fix");
            return failure(ApplyPhase::RolledBack, reason, false, None);
        }

        // applying
        let applied = match self.apply_operations(fix, state, project_id, original_error).await {
            Ok(applied) => applied,
            Err(err) => {
                let rolled_back = self.rollback(project_id, snapshot_id.as_deref()).await;
                return failure(
                    ApplyPhase::RolledBack,
                    format!("application failed: {err}"),
                    rolled_back,
                    None,
                );
            }
        };

        // testing
        if options.run_tests {
            let report = self
                .tester
                .test_fix(&applied, project_id, original_error)
                .await;
            if !report.success {
                let rolled_back = self.rollback(project_id, snapshot_id.as_deref()).await;
                info!(project_id, fix_id = %fix.id, "tests failed, rolled back");
                return ApplyOutcome {
                    success: false,
                    phase: ApplyPhase::RolledBack,
                    applied_fix: None,
                    test_report: Some(report),
                    failure_reason: Some("post-application tests failed".to_string()),
                    rolled_back,
                };
            }

            // committed: the snapshot is no longer needed once the fix is
            // confirmed good.
            if let Some(id) = &snapshot_id {
                self.snapshots.discard(id).await;
            }
            info!(project_id, fix_id = %fix.id, phase = ApplyPhase::Committed.as_str(), "fix committed");
            return ApplyOutcome {
                success: true,
                phase: ApplyPhase::Committed,
                applied_fix: Some(applied),
                test_report: Some(report),
                failure_reason: None,
                rolled_back: false,
            };
        }

        if let Some(id) = &snapshot_id {
            self.snapshots.discard(id).await;
        }
        info!(project_id, fix_id = %fix.id, phase = ApplyPhase::Committed.as_str(), "fix committed without tests");
        ApplyOutcome {
            success: true,
            phase: ApplyPhase::Committed,
            applied_fix: Some(applied),
            test_report: None,
            failure_reason: None,
            rolled_back: false,
        }
    }

    /// Restore project state from a snapshot. Returns true when a restore
    /// actually happened.
    async fn rollback(&self, project_id: &str, snapshot_id: Option<&str>) -> bool {
        let Some(id) = snapshot_id else {
            return false;
        };
        match self.snapshots.take(id).await {
            Ok(snapshot) => {
                let update = ProjectUpdate::from_state(&snapshot.state);
                if let Err(err) = self.store.update(project_id, update).await {
                    error!(project_id, snapshot_id = id, error = %err, "snapshot restore failed");
                    return false;
                }
                info!(project_id, snapshot_id = id, "rolled back to snapshot");
                true
            }
            Err(err) => {
                error!(project_id, snapshot_id = id, error = %err, "rollback skipped");
                false
            }
        }
    }

    /// Translate the suggestion into file operations, apply them to a copy
    /// of the state, and persist the result.
    async fn apply_operations(
        &self,
        fix: &FixSuggestion,
        mut state: ProjectState,
        project_id: &str,
        original_error: &str,
    ) -> DomainResult<AppliedFix> {
        let operations = build_operations(fix)?;

        for operation in &operations {
            apply_operation(&mut state, operation)?;
        }
        state.metadata.updated_at = Some(Utc::now());

        self.store
            .update(project_id, ProjectUpdate::from_state(&state))
            .await?;
        // Journal writes are telemetry: log and keep going.
        if let Err(err) = self
            .store
            .record_change(
                project_id,
                ChangeEvent::now(
                    format!("applied {} fix: {}", fix.fix_type.as_str(), fix.explanation),
                    Some(fix.target_file.clone()).filter(|f| !f.is_empty()),
                ),
            )
            .await
        {
            warn!(project_id, error = %err, "failed to record change event");
        }

        Ok(AppliedFix {
            id: fix.id,
            fix_type: fix.fix_type,
            operations,
            applied_at: Utc::now(),
            original_error: original_error.to_string(),
        })
    }
}

fn failure(
    phase: ApplyPhase,
    reason: String,
    rolled_back: bool,
    applied_fix: Option<AppliedFix>,
) -> ApplyOutcome {
    ApplyOutcome {
        success: false,
        phase,
        applied_fix,
        test_report: None,
        failure_reason: Some(reason),
        rolled_back,
    }
}

/// Expand a suggestion into its concrete operations.
fn build_operations(fix: &FixSuggestion) -> DomainResult<Vec<FileOperation>> {
    let target = Some(fix.target_file.clone()).filter(|f| !f.is_empty());
    let ops = match fix.fix_type {
        FixType::Replace => vec![FileOperation::Update {
            file: target,
            old_content: fix.old_code.clone().unwrap_or_default(),
            new_content: fix.new_code.clone(),
        }],
        FixType::Insert => vec![FileOperation::Insert {
            content: fix.new_code.clone(),
            position: fix.position.unwrap_or(usize::MAX),
        }],
        FixType::Delete => vec![FileOperation::Delete {
            content: fix.old_code.clone().unwrap_or_default(),
        }],
        FixType::InstallPackage => vec![FileOperation::Package {
            action: PackageAction::Install,
            name: fix.package.clone().unwrap_or_default(),
            version: fix.version.clone(),
        }],
        FixType::UpdateImport => {
            let (old_import, new_import) = match (&fix.old_import, &fix.new_import) {
                (Some(old), Some(new)) => (old.clone(), new.clone()),
                _ => {
                    return Err(DomainError::InvalidFix(
                        "update_import requires old_import and new_import".to_string(),
                    ))
                }
            };
            vec![FileOperation::Update {
                file: target,
                old_content: old_import,
                new_content: new_import,
            }]
        }
    };
    Ok(ops)
}

/// Apply one operation to an in-memory state.
///
/// Update semantics: a verbatim match is substring-replaced; when the old
/// content is not found, only the primary file degrades to a full overwrite,
/// a named file is an application error.
fn apply_operation(state: &mut ProjectState, operation: &FileOperation) -> DomainResult<()> {
    match operation {
        FileOperation::Update {
            file,
            old_content,
            new_content,
        } => match file {
            Some(path) if state.files.contains_key(path) => {
                let content = state.files.get_mut(path).ok_or_else(|| {
                    DomainError::ApplicationFailed(format!("file disappeared: {path}"))
                })?;
                if content.contains(old_content.as_str()) {
                    *content = content.replacen(old_content.as_str(), new_content, 1);
                    Ok(())
                } else {
                    Err(DomainError::ApplicationFailed(format!(
                        "old content not found in {path}"
                    )))
                }
            }
            _ => {
                if !old_content.is_empty() && state.file_content.contains(old_content.as_str()) {
                    state.file_content =
                        state
                            .file_content
                            .replacen(old_content.as_str(), new_content, 1);
                } else {
                    // Primary file only: overwrite wholesale.
                    state.file_content = new_content.clone();
                }
                Ok(())
            }
        },
        FileOperation::Insert { content, position } => {
            let at = (*position).min(state.file_content.len());
            let at = floor_char_boundary(&state.file_content, at);
            state.file_content.insert_str(at, content);
            Ok(())
        }
        FileOperation::Delete { content } => {
            if state.file_content.contains(content.as_str()) {
                state.file_content = state.file_content.replacen(content.as_str(), "", 1);
                Ok(())
            } else {
                Err(DomainError::ApplicationFailed(
                    "content to delete not found".to_string(),
                ))
            }
        }
        FileOperation::Package {
            action,
            name,
            version,
        } => {
            match action {
                PackageAction::Install | PackageAction::Update => {
                    state.metadata.dependencies.insert(
                        name.clone(),
                        version.clone().unwrap_or_else(|| "latest".to_string()),
                    );
                }
                PackageAction::Remove => {
                    state.metadata.dependencies.remove(name);
                }
            }
            Ok(())
        }
    }
}

fn floor_char_boundary(s: &str, index: usize) -> usize {
    let mut at = index.min(s.len());
    while at > 0 && !s.is_char_boundary(at) {
        at -= 1;
    }
    at
}
