//! Port trait for the linter / type checker.

use crate::domain::models::{Diagnostic, LintReport};

/// Synchronous static analysis over a code string.
///
/// Implementations must be pure functions of their inputs: no network, no
/// project store access. They also never fail: a syntax error in the input is
/// reported as a single `syntax-error` diagnostic, not propagated.
pub trait StaticAnalyzer: Send + Sync {
    /// Lint a JavaScript source string.
    fn lint(&self, code: &str, file_path: &str, auto_fix: bool) -> LintReport;

    /// Type-check a TypeScript source string, returning error diagnostics.
    fn type_check(&self, code: &str, file_path: &str) -> Vec<Diagnostic>;
}

/// Whether a path refers to a typed (TypeScript) source file.
pub fn is_typed_file(path: &str) -> bool {
    path.ends_with(".ts") || path.ends_with(".tsx")
}
