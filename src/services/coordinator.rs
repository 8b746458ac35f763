//! Multi-file fix coordination.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::models::{AppliedFix, FixSuggestion};
use crate::services::fix_applicator::{ApplyOptions, FixApplicator};

/// Result of applying a batch of fixes across files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinationResult {
    pub success: bool,
    pub applied_fixes: Vec<AppliedFix>,
    pub errors: Vec<String>,
}

/// Applies a batch of fixes spanning multiple files, one at a time, stopping
/// and unwinding on the first failure so a batch is never silently completed
/// out of order.
pub struct MultiFileCoordinator {
    applicator: Arc<FixApplicator>,
}

impl MultiFileCoordinator {
    pub fn new(applicator: Arc<FixApplicator>) -> Self {
        Self { applicator }
    }

    /// Apply fixes in dependency order with snapshot + auto-rollback per fix.
    pub async fn coordinate_fixes(
        &self,
        fixes: Vec<FixSuggestion>,
        project_id: &str,
        original_error: &str,
    ) -> CoordinationResult {
        let ordered = resolve_order(fixes);
        let mut applied_fixes = Vec::new();
        let mut errors = Vec::new();

        for fix in &ordered {
            let outcome = self
                .applicator
                .apply(fix, project_id, original_error, ApplyOptions::default())
                .await;

            if outcome.success {
                if let Some(applied) = outcome.applied_fix {
                    applied_fixes.push(applied);
                }
                continue;
            }

            // First failure stops the batch; the applicator already rolled
            // back the failing fix, and later fixes are never attempted.
            let reason = outcome
                .failure_reason
                .unwrap_or_else(|| "unknown failure".to_string());
            let file = display_file(&fix.target_file);
            warn!(project_id, file, reason, "multi-file batch stopped");
            errors.push(format!("failed to apply fix to {file}: {reason}"));
            break;
        }

        let success = errors.is_empty();
        info!(
            project_id,
            applied = applied_fixes.len(),
            total = ordered.len(),
            success,
            "multi-file coordination finished"
        );
        CoordinationResult {
            success,
            applied_fixes,
            errors,
        }
    }
}

/// Application order for a batch.
///
/// Currently a pass-through: fixes apply in the order given. Extension
/// point for a real topological sort over file import dependencies once
/// cross-file fixes carry dependency information.
fn resolve_order(fixes: Vec<FixSuggestion>) -> Vec<FixSuggestion> {
    fixes
}

fn display_file(target_file: &str) -> &str {
    if target_file.is_empty() {
        "the main component"
    } else {
        target_file
    }
}
