//! Confidence scoring and retry policy.

use serde::{Deserialize, Serialize};

use crate::domain::models::{FixSuggestion, FixType, ValidationResult};

/// Weights of the confidence components. They sum to 1.0 so a perfect fix
/// scores exactly 1.0 before clamping.
const WEIGHT_ERROR_TYPE: f64 = 0.2;
const WEIGHT_CODE_MATCH: f64 = 0.2;
const WEIGHT_VALIDATION: f64 = 0.3;
const WEIGHT_HISTORICAL: f64 = 0.2;
const WEIGHT_SIMPLICITY: f64 = 0.1;

/// What the retry policy decided for a scored fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryDecision {
    /// Confidence is high enough to accept without retrying
    Accept,
    /// Retry with refined context
    Retry,
    /// Retry budget for this confidence band is spent; escalate to a human
    ManualReview,
}

/// Combines validation results, heuristics, and history into a single
/// confidence value driving the accept/retry/escalate decision.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfidenceScorer;

impl ConfidenceScorer {
    pub fn new() -> Self {
        Self
    }

    /// Weighted confidence in [0, 1].
    ///
    /// `historical_success_rate` defaults to 0.5 when the project has no
    /// history for this error category.
    pub fn calculate(
        &self,
        fix: &FixSuggestion,
        validation: &ValidationResult,
        historical_success_rate: f64,
    ) -> f64 {
        let error_type = Self::error_type_confidence(&fix.explanation);
        let code_match = Self::code_match_confidence(fix);
        let validation_score = validation.pass_fraction();
        let complexity = Self::complexity(fix.fix_type);

        let score = error_type * WEIGHT_ERROR_TYPE
            + code_match * WEIGHT_CODE_MATCH
            + validation_score * WEIGHT_VALIDATION
            + historical_success_rate.clamp(0.0, 1.0) * WEIGHT_HISTORICAL
            + (1.0 - complexity) * WEIGHT_SIMPLICITY;

        score.clamp(0.0, 1.0)
    }

    /// Retry policy: high-confidence fixes are accepted outright, the middle
    /// band gets one retry, the low band two; past that, a human takes over.
    pub fn should_retry(&self, confidence: f64, attempt: u32) -> RetryDecision {
        if confidence >= 0.8 {
            RetryDecision::Accept
        } else if confidence >= 0.6 {
            if attempt < 1 {
                RetryDecision::Retry
            } else {
                RetryDecision::ManualReview
            }
        } else if attempt < 2 {
            RetryDecision::Retry
        } else {
            RetryDecision::ManualReview
        }
    }

    /// Keyword-matched confidence by the kind of error the explanation
    /// claims to address. Syntax fixes are the most mechanical, logic fixes
    /// the least.
    fn error_type_confidence(explanation: &str) -> f64 {
        let lower = explanation.to_lowercase();
        if lower.contains("syntax") {
            0.9
        } else if lower.contains("type") {
            0.7
        } else if lower.contains("logic") {
            0.5
        } else {
            0.6
        }
    }

    // Placeholder for a real diff-similarity score: a present old_code is a
    // strong signal the generator looked at the actual file.
    fn code_match_confidence(fix: &FixSuggestion) -> f64 {
        if fix.old_code.as_deref().unwrap_or("").is_empty() {
            0.5
        } else {
            0.8
        }
    }

    fn complexity(fix_type: FixType) -> f64 {
        match fix_type {
            FixType::Replace => 0.3,
            FixType::InstallPackage => 0.5,
            _ => 0.7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ValidationCheck;
    use proptest::prelude::*;

    fn validation(passed: usize, failed: usize) -> ValidationResult {
        let mut checks = Vec::new();
        for i in 0..passed {
            checks.push(ValidationCheck::passed(format!("check-{i}"), false));
        }
        for i in 0..failed {
            checks.push(ValidationCheck::failed(format!("fail-{i}"), false, "no"));
        }
        ValidationResult::from_checks(checks)
    }

    #[test]
    fn syntax_replace_with_clean_validation_scores_high() {
        let fix = FixSuggestion::replace("app.js", "a", "b", "Fix syntax error", 0.9);
        let scorer = ConfidenceScorer::new();
        let score = scorer.calculate(&fix, &validation(5, 0), 0.5);
        // 0.9*0.2 + 0.8*0.2 + 1.0*0.3 + 0.5*0.2 + 0.7*0.1 = 0.81
        assert!((score - 0.81).abs() < 1e-9);
    }

    #[test]
    fn missing_old_code_lowers_code_match() {
        let mut fix = FixSuggestion::replace("app.js", "a", "b", "fix", 0.9);
        let scorer = ConfidenceScorer::new();
        let with_old = scorer.calculate(&fix, &validation(4, 1), 0.5);
        fix.old_code = None;
        let without_old = scorer.calculate(&fix, &validation(4, 1), 0.5);
        assert!(with_old > without_old);
    }

    #[test]
    fn retry_policy_bands() {
        let scorer = ConfidenceScorer::new();
        assert_eq!(scorer.should_retry(0.85, 0), RetryDecision::Accept);
        assert_eq!(scorer.should_retry(0.85, 5), RetryDecision::Accept);

        assert_eq!(scorer.should_retry(0.7, 0), RetryDecision::Retry);
        assert_eq!(scorer.should_retry(0.7, 1), RetryDecision::ManualReview);

        assert_eq!(scorer.should_retry(0.3, 0), RetryDecision::Retry);
        assert_eq!(scorer.should_retry(0.3, 1), RetryDecision::Retry);
        assert_eq!(scorer.should_retry(0.3, 2), RetryDecision::ManualReview);
    }

    proptest! {
        #[test]
        fn confidence_stays_in_unit_interval(
            explanation in ".*",
            has_old_code in any::<bool>(),
            passed in 0usize..6,
            failed in 0usize..6,
            historical in -1.0f64..2.0,
        ) {
            let mut fix = FixSuggestion::replace("app.js", "old", "new", explanation, 0.5);
            if !has_old_code {
                fix.old_code = None;
            }
            let score = ConfidenceScorer::new().calculate(&fix, &validation(passed, failed), historical);
            prop_assert!((0.0..=1.0).contains(&score));
        }
    }
}
