//! Pipeline assembly and the external entry point.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{AppError, Config, FixResult};
use crate::domain::ports::{
    FixHistoryRepository, FixService, ProjectStore, RuntimeProbe, StaticAnalyzer,
};
use crate::services::context_builder::ContextBuilder;
use crate::services::fix_applicator::FixApplicator;
use crate::services::fix_engine::FixEngine;
use crate::services::fix_generator::FixGenerator;
use crate::services::fix_tester::FixTester;
use crate::services::fix_validator::FixValidator;
use crate::services::history_service::FixHistoryService;
use crate::services::rate_limiter::FixedWindowRateLimiter;
use crate::services::snapshot_store::SnapshotStore;

/// Wires the whole repair pipeline from injected ports and configuration.
///
/// Everything is explicitly constructed here: no process-wide singletons,
/// so concurrent sessions, tests, and the CLI each own their instances.
pub struct RepairPipeline {
    limiter: FixedWindowRateLimiter,
    context_builder: ContextBuilder,
    engine: FixEngine,
    history: Arc<FixHistoryService>,
}

impl RepairPipeline {
    pub fn new(
        store: Arc<dyn ProjectStore>,
        fix_service: Arc<dyn FixService>,
        analyzer: Arc<dyn StaticAnalyzer>,
        probe: Arc<dyn RuntimeProbe>,
        history_repository: Arc<dyn FixHistoryRepository>,
        config: &Config,
    ) -> Self {
        let history = Arc::new(FixHistoryService::new(history_repository));
        let snapshots = Arc::new(SnapshotStore::new());

        let applicator = Arc::new(FixApplicator::new(
            store.clone(),
            FixValidator::new(analyzer.clone()),
            FixTester::new(store.clone(), analyzer.clone(), probe),
            snapshots,
        ));

        let engine = FixEngine::new(
            FixGenerator::new(fix_service),
            FixValidator::new(analyzer),
            applicator,
            history.clone(),
            config.engine.clone(),
        );

        Self {
            limiter: FixedWindowRateLimiter::new(&config.rate_limit),
            context_builder: ContextBuilder::new(store, history.clone()),
            engine,
            history,
        }
    }

    /// One externally-triggered fix attempt for an error in a project.
    ///
    /// The rate limit is consumed here, once per external trigger: the
    /// engine's internal retries share the slot. A rejected check returns
    /// before any call to the fix service or applicator.
    pub async fn attempt_fix(
        &self,
        project_id: &str,
        error: AppError,
        user_key: Option<&str>,
        file_path: Option<&str>,
    ) -> DomainResult<FixResult> {
        let decision = self.limiter.check(project_id, user_key).await;
        if !decision.allowed {
            let retry_after_secs = decision.retry_after.map_or(1, |d| d.as_secs().max(1));
            warn!(project_id, retry_after_secs, "fix attempt rate limited");
            return Err(DomainError::RateLimited {
                key: project_id.to_string(),
                retry_after_secs,
            });
        }

        info!(project_id, error = %error.message, "starting repair session");
        let context = self
            .context_builder
            .build_context(&error, project_id, file_path)
            .await;
        Ok(self.engine.fix_with_retry(context).await)
    }

    /// History service, for audit queries from the hosting application.
    pub fn history(&self) -> &Arc<FixHistoryService> {
        &self.history
    }
}
