//! Validation models shared by the static analyzer and fix validator.

use serde::{Deserialize, Serialize};

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic from the linter or type checker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub message: String,
    /// Rule identifier, e.g. `syntax-error` or `no-var`
    pub rule: String,
    pub severity: Severity,
    /// Replacement text when the rule can repair itself
    pub auto_fix: Option<String>,
}

impl Diagnostic {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Aggregated linter output for one file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LintReport {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    /// True iff at least one error carries an auto-fix
    pub fixable: bool,
    pub suggestions: Vec<String>,
}

impl LintReport {
    pub fn clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Structured remediation a failed check can offer.
///
/// Kept as data rather than a callback so checks stay serializable and the
/// caller decides whether to act on the remediation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AutoFix {
    /// Install the named dependency into the project manifest
    InstallPackage { name: String },
}

/// Outcome of one named validation check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationCheck {
    pub name: String,
    pub passed: bool,
    /// A failed critical check blocks application regardless of other checks
    pub critical: bool,
    pub message: Option<String>,
    pub auto_fixable: bool,
    pub auto_fix: Option<AutoFix>,
}

impl ValidationCheck {
    pub fn passed(name: impl Into<String>, critical: bool) -> Self {
        Self {
            name: name.into(),
            passed: true,
            critical,
            message: None,
            auto_fixable: false,
            auto_fix: None,
        }
    }

    pub fn failed(name: impl Into<String>, critical: bool, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            critical,
            message: Some(message.into()),
            auto_fixable: false,
            auto_fix: None,
        }
    }

    pub fn with_auto_fix(mut self, auto_fix: AutoFix) -> Self {
        self.auto_fixable = true;
        self.auto_fix = Some(auto_fix);
        self
    }
}

/// Batch result of a validation run.
///
/// Invariant: `valid` is false iff some critical check failed. Non-critical
/// failures only depress `confidence`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub checks: Vec<ValidationCheck>,
    pub confidence: f64,
}

impl ValidationResult {
    /// Build a result from a batch of checks.
    ///
    /// Confidence is the fraction of checks that passed; validity considers
    /// only critical checks.
    pub fn from_checks(checks: Vec<ValidationCheck>) -> Self {
        let valid = !checks.iter().any(|c| c.critical && !c.passed);
        let confidence = if checks.is_empty() {
            1.0
        } else {
            checks.iter().filter(|c| c.passed).count() as f64 / checks.len() as f64
        };
        Self {
            valid,
            checks,
            confidence,
        }
    }

    /// Fraction of checks that passed.
    pub fn pass_fraction(&self) -> f64 {
        self.confidence
    }

    /// Messages of all failed checks, for failure reporting.
    pub fn failure_messages(&self) -> Vec<String> {
        self.checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| {
                c.message
                    .clone()
                    .unwrap_or_else(|| format!("{} failed", c.name))
            })
            .collect()
    }
}
