//! Failure pattern analysis over a session's attempt history.

use std::collections::HashMap;

use tracing::debug;

use crate::domain::models::{ErrorCategory, FailurePattern, FixAttempt};

const MAX_EXAMPLES_PER_CATEGORY: usize = 3;

/// Groups failed attempts by classified category and ranks categories by
/// frequency, so the engine can turn an exhausted session into actionable
/// guidance instead of a raw error.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailureAnalyzer;

impl FailureAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Analyze failed attempts into patterns sorted by descending frequency.
    pub fn analyze(&self, attempts: &[FixAttempt]) -> Vec<FailurePattern> {
        let mut buckets: HashMap<ErrorCategory, (usize, Vec<String>)> = HashMap::new();

        for attempt in attempts.iter().filter(|a| !a.success) {
            let message = attempt
                .outcome
                .failure_message()
                .unwrap_or_else(|| "unknown failure".to_string());
            let category = ErrorCategory::classify(&message);

            let (count, examples) = buckets.entry(category).or_default();
            *count += 1;
            if examples.len() < MAX_EXAMPLES_PER_CATEGORY {
                examples.push(message);
            }
        }

        let mut patterns: Vec<FailurePattern> = buckets
            .into_iter()
            .map(|(category, (frequency, examples))| FailurePattern {
                category,
                frequency,
                examples,
                suggestion: category.suggestion().to_string(),
            })
            .collect();

        patterns.sort_by(|a, b| b.frequency.cmp(&a.frequency));
        debug!(patterns = patterns.len(), "failure analysis complete");
        patterns
    }

    /// Recommendation for the dominant failure category, or a generic
    /// manual-review fallback when nothing failed distinctly.
    pub fn recommendation(&self, attempts: &[FixAttempt]) -> String {
        self.analyze(attempts)
            .first()
            .map_or_else(
                || ErrorCategory::Unknown.suggestion().to_string(),
                |p| p.suggestion.clone(),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ApplyOutcome, ApplyPhase, FixSuggestion};
    use chrono::Utc;

    fn failed_attempt(n: u32, reason: &str) -> FixAttempt {
        FixAttempt {
            attempt_number: n,
            fix: FixSuggestion::replace("app.js", "a", "b", "fix", 0.5),
            outcome: ApplyOutcome {
                success: false,
                phase: ApplyPhase::RolledBack,
                applied_fix: None,
                test_report: None,
                failure_reason: Some(reason.to_string()),
                rolled_back: true,
            },
            success: false,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn groups_by_category_and_sorts_by_frequency() {
        let attempts = vec![
            failed_attempt(1, "Type 'string' is not assignable to type 'number'"),
            failed_attempt(2, "type mismatch in props"),
            failed_attempt(3, "Cannot find module 'axios'"),
        ];

        let patterns = FailureAnalyzer::new().analyze(&attempts);
        assert_eq!(patterns.len(), 2);
        assert_eq!(patterns[0].category, ErrorCategory::Type);
        assert_eq!(patterns[0].frequency, 2);
        assert_eq!(patterns[1].category, ErrorCategory::Dependency);
    }

    #[test]
    fn examples_are_capped_at_three() {
        let attempts: Vec<_> = (0..5)
            .map(|i| failed_attempt(i, &format!("type error number {i}")))
            .collect();

        let patterns = FailureAnalyzer::new().analyze(&attempts);
        assert_eq!(patterns[0].frequency, 5);
        assert_eq!(patterns[0].examples.len(), 3);
    }

    #[test]
    fn recommendation_matches_dominant_category() {
        let attempts = vec![
            failed_attempt(1, "type error"),
            failed_attempt(2, "type error again"),
            failed_attempt(3, "type error a third time"),
        ];
        let rec = FailureAnalyzer::new().recommendation(&attempts);
        assert_eq!(rec, ErrorCategory::Type.suggestion());
    }

    #[test]
    fn no_failures_yields_manual_review_fallback() {
        let rec = FailureAnalyzer::new().recommendation(&[]);
        assert_eq!(rec, ErrorCategory::Unknown.suggestion());
    }
}
