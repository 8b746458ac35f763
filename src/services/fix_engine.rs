//! Iterative fix engine: the top-level retry loop of a repair session.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::domain::models::{
    ApplyOutcome, ApplyPhase, EngineConfig, ErrorCategory, ErrorContext, FixAttempt, FixResult,
};
use crate::services::confidence::ConfidenceScorer;
use crate::services::failure_analyzer::FailureAnalyzer;
use crate::services::fix_applicator::{ApplyOptions, FixApplicator};
use crate::services::fix_generator::FixGenerator;
use crate::services::fix_validator::FixValidator;
use crate::services::history_service::FixHistoryService;

/// Drives generate → validate → apply → test until success or exhaustion.
///
/// The engine owns the attempt sequence for one error-resolution session:
/// each failed attempt enriches the context the next generation sees, and an
/// exhausted session ends with a category-derived recommendation instead of
/// a raw error.
pub struct FixEngine {
    generator: FixGenerator,
    validator: FixValidator,
    scorer: ConfidenceScorer,
    applicator: Arc<FixApplicator>,
    history: Arc<FixHistoryService>,
    analyzer: FailureAnalyzer,
    config: EngineConfig,
}

impl FixEngine {
    pub fn new(
        generator: FixGenerator,
        validator: FixValidator,
        applicator: Arc<FixApplicator>,
        history: Arc<FixHistoryService>,
        config: EngineConfig,
    ) -> Self {
        Self {
            generator,
            validator,
            scorer: ConfidenceScorer::new(),
            applicator,
            history,
            analyzer: FailureAnalyzer::new(),
            config,
        }
    }

    /// Run the retry loop for one error. At most `max_attempts` generation
    /// calls are made, and no backoff sleep follows the final attempt.
    pub async fn fix_with_retry(&self, mut context: ErrorContext) -> FixResult {
        let error = context.error.clone();
        let project_id = context.project_id.clone();
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempts: Vec<FixAttempt> = Vec::new();
        let mut attempt = 0u32;

        while attempt < max_attempts {
            attempt += 1;
            info!(project_id, attempt, max_attempts, "starting fix attempt");

            let fix = match self.generator.generate_fix(&context).await {
                Ok(fix) => fix,
                Err(err) => {
                    warn!(project_id, attempt, error = %err, "fix generation failed");
                    context.push_attempt(
                        "fix generation produced no usable suggestion".to_string(),
                        Some(err.to_string()),
                    );
                    self.backoff(attempt, max_attempts).await;
                    continue;
                }
            };

            // Gate: the full five-check validation plus a scored confidence.
            // Critical failures block application entirely.
            let validation = self.validator.validate_fix(&fix, &context);
            let historical = self
                .history
                .success_rate(&project_id, ErrorCategory::classify(&error.message))
                .await;
            let confidence = self.scorer.calculate(&fix, &validation, historical);
            let decision = self.scorer.should_retry(confidence, attempt - 1);
            debug!(
                project_id,
                attempt,
                confidence,
                decision = ?decision,
                valid = validation.valid,
                "fix scored"
            );

            let outcome = if validation.valid {
                self.applicator
                    .apply(&fix, &project_id, &error.message, ApplyOptions::default())
                    .await
            } else {
                ApplyOutcome {
                    success: false,
                    phase: ApplyPhase::Validating,
                    applied_fix: None,
                    test_report: None,
                    failure_reason: Some(validation.failure_messages().join("; ")),
                    rolled_back: false,
                }
            };

            let record = FixAttempt {
                attempt_number: attempt,
                fix: fix.clone(),
                outcome: outcome.clone(),
                success: outcome.success,
                timestamp: Utc::now(),
            };
            self.history
                .record_attempt(&project_id, &error, &record)
                .await;
            attempts.push(record);

            if outcome.success {
                info!(project_id, attempt, "fix succeeded");
                return FixResult {
                    success: true,
                    final_fix: outcome.applied_fix,
                    attempts,
                    resolved_error: Some(error.message.clone()),
                    unresolved_error: None,
                    recommendation: None,
                };
            }

            // Enrich the context so the next generation sees what failed and
            // why, test messages included when available.
            let failure_detail = outcome
                .test_report
                .as_ref()
                .map(|r| r.failure_summary())
                .filter(|s| !s.is_empty())
                .or_else(|| outcome.failure_reason.clone());
            context.push_attempt(fix.explanation.clone(), failure_detail);

            self.backoff(attempt, max_attempts).await;
        }

        let recommendation = self.analyzer.recommendation(&attempts);
        warn!(
            project_id,
            attempts = attempts.len(),
            recommendation,
            "fix attempts exhausted"
        );
        FixResult {
            success: false,
            final_fix: None,
            attempts,
            resolved_error: None,
            unresolved_error: Some(error.message),
            recommendation: Some(recommendation),
        }
    }

    /// Exponential backoff between attempts, skipped after the final one.
    async fn backoff(&self, attempt: u32, max_attempts: u32) {
        if attempt >= max_attempts {
            return;
        }
        let millis = self
            .config
            .backoff_base_ms
            .saturating_mul(1u64 << attempt.min(16));
        if millis > 0 {
            debug!(attempt, millis, "backing off before next attempt");
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
    }
}
