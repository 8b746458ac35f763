//! Outcome reporting models: test reports, attempts, failure patterns, and
//! the final result handed back to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::fix::{AppliedFix, FixSuggestion};

/// Category assigned to a failure message by the ordered-rule classifier.
///
/// Rules are checked in declaration order and the first match wins, so the
/// priority between overlapping keywords is explicit here rather than
/// implicit in scattered substring checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Type,
    Dependency,
    Syntax,
    Import,
    Runtime,
    Logic,
    Unknown,
}

/// Ordered classification rules: category, then the keywords that select it.
const CLASSIFIER_RULES: &[(ErrorCategory, &[&str])] = &[
    (ErrorCategory::Type, &["type", "is not assignable"]),
    (
        ErrorCategory::Dependency,
        &["dependency", "cannot find module", "module not found", "package"],
    ),
    (
        ErrorCategory::Syntax,
        &["syntax", "unexpected token", "parse"],
    ),
    (ErrorCategory::Import, &["import", "export"]),
    (
        ErrorCategory::Runtime,
        &["runtime", "is not defined", "is not a function", "console error"],
    ),
    (ErrorCategory::Logic, &["logic", "assertion", "infinite"]),
];

impl ErrorCategory {
    /// Classify a failure message. First matching rule wins.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        for (category, keywords) in CLASSIFIER_RULES {
            if keywords.iter().any(|k| lower.contains(k)) {
                return *category;
            }
        }
        Self::Unknown
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Type => "type_error",
            Self::Dependency => "dependency_error",
            Self::Syntax => "syntax_error",
            Self::Import => "import_error",
            Self::Runtime => "runtime_error",
            Self::Logic => "logic_error",
            Self::Unknown => "unknown_error",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "type_error" => Some(Self::Type),
            "dependency_error" => Some(Self::Dependency),
            "syntax_error" => Some(Self::Syntax),
            "import_error" => Some(Self::Import),
            "runtime_error" => Some(Self::Runtime),
            "logic_error" => Some(Self::Logic),
            "unknown_error" => Some(Self::Unknown),
            _ => None,
        }
    }

    /// Fixed remediation guidance shown when a session exhausts its retries
    /// with this category dominating the failures.
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::Type => {
                "Review type annotations and interface definitions; the attempted fixes \
                 repeatedly produced type mismatches"
            }
            Self::Dependency => {
                "Check the project manifest: a required package appears to be missing or \
                 at an incompatible version"
            }
            Self::Syntax => {
                "The generated code repeatedly failed to parse; inspect the target file \
                 for pre-existing syntax damage"
            }
            Self::Import => {
                "Verify import paths and module names against the project's file layout"
            }
            Self::Runtime => {
                "The fix applies cleanly but fails at runtime; reproduce in the preview \
                 and inspect the console output"
            }
            Self::Logic => {
                "Behavioral checks keep failing; the fix likely needs a human decision \
                 about intended behavior"
            }
            Self::Unknown => {
                "Automated repair could not converge; manual review of the error and \
                 attempted fixes is recommended"
            }
        }
    }
}

/// Result of one post-application probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub passed: bool,
    pub duration: Duration,
    pub message: Option<String>,
}

/// Aggregated post-application test report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestReport {
    pub success: bool,
    pub cases: Vec<TestCase>,
    pub ran_at: DateTime<Utc>,
}

impl TestReport {
    pub fn from_cases(cases: Vec<TestCase>) -> Self {
        Self {
            success: cases.iter().all(|c| c.passed),
            cases,
            ran_at: Utc::now(),
        }
    }

    /// Concatenated messages of failing cases, used to enrich retry context.
    pub fn failure_summary(&self) -> String {
        self.cases
            .iter()
            .filter(|c| !c.passed)
            .map(|c| {
                format!(
                    "{}: {}",
                    c.name,
                    c.message.as_deref().unwrap_or("failed")
                )
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Phase of the applicator state machine, for logging and outcome reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyPhase {
    Idle,
    Snapshotting,
    Validating,
    Applying,
    Testing,
    Committed,
    RolledBack,
}

impl ApplyPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Snapshotting => "snapshotting",
            Self::Validating => "validating",
            Self::Applying => "applying",
            Self::Testing => "testing",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
        }
    }
}

/// Outcome of a single application attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyOutcome {
    pub success: bool,
    /// Terminal phase the attempt reached
    pub phase: ApplyPhase,
    pub applied_fix: Option<AppliedFix>,
    pub test_report: Option<TestReport>,
    pub failure_reason: Option<String>,
    pub rolled_back: bool,
}

impl ApplyOutcome {
    /// The message the failure analyzer should classify for this outcome.
    pub fn failure_message(&self) -> Option<String> {
        if self.success {
            return None;
        }
        let tests = self
            .test_report
            .as_ref()
            .map(TestReport::failure_summary)
            .filter(|s| !s.is_empty());
        match (&self.failure_reason, tests) {
            (Some(reason), Some(tests)) => Some(format!("{reason}; {tests}")),
            (Some(reason), None) => Some(reason.clone()),
            (None, Some(tests)) => Some(tests),
            (None, None) => Some("application failed".to_string()),
        }
    }
}

/// One iteration of the retry loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixAttempt {
    pub attempt_number: u32,
    pub fix: FixSuggestion,
    pub outcome: ApplyOutcome,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}

/// Recurring failure shape detected across a session's attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailurePattern {
    pub category: ErrorCategory,
    pub frequency: usize,
    /// Up to three example messages
    pub examples: Vec<String>,
    pub suggestion: String,
}

/// Final result of an error-resolution session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixResult {
    pub success: bool,
    pub final_fix: Option<AppliedFix>,
    pub attempts: Vec<FixAttempt>,
    pub resolved_error: Option<String>,
    pub unresolved_error: Option<String>,
    /// Category-derived guidance when retries are exhausted
    pub recommendation: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_beats_syntax_in_priority_order() {
        // "type" is checked before "syntax" so a message containing both
        // lands in the type bucket.
        let category = ErrorCategory::classify("Syntax issue: type 'X' is not assignable");
        assert_eq!(category, ErrorCategory::Type);
    }

    #[test]
    fn unmatched_message_is_unknown() {
        assert_eq!(
            ErrorCategory::classify("something strange happened"),
            ErrorCategory::Unknown
        );
    }

    #[test]
    fn cannot_find_module_is_dependency() {
        assert_eq!(
            ErrorCategory::classify("Cannot find module 'lodash'"),
            ErrorCategory::Dependency
        );
    }

    #[test]
    fn report_failure_summary_concatenates_failing_cases() {
        let report = TestReport::from_cases(vec![
            TestCase {
                name: "build".to_string(),
                passed: true,
                duration: Duration::from_millis(5),
                message: None,
            },
            TestCase {
                name: "runtime".to_string(),
                passed: false,
                duration: Duration::from_millis(5),
                message: Some("console error: foo is not defined".to_string()),
            },
        ]);
        assert!(!report.success);
        assert_eq!(
            report.failure_summary(),
            "runtime: console error: foo is not defined"
        );
    }
}
