//! Pre-application fix validation.
//!
//! Two entry points: [`FixValidator::validate_fix`] runs the full five-check
//! battery against a generated suggestion, and
//! [`FixValidator::validate_pre_application`] is the cheaper gate the
//! applicator runs immediately before mutating state.

use std::sync::Arc;

use tracing::debug;

use crate::domain::models::{
    AutoFix, ErrorContext, FixSuggestion, FixType, ValidationCheck, ValidationResult,
};
use crate::domain::ports::{is_typed_file, StaticAnalyzer};

/// Fix sizes beyond this delta get a (non-blocking) warning.
const SIZE_WARNING_THRESHOLD: usize = 10_000;

/// Confidence below this gets a (non-blocking) manual-review warning.
const REVIEW_CONFIDENCE_THRESHOLD: f64 = 0.5;

/// More `undefined`/`null` tokens than this trips the logic heuristic.
const MAX_NULLISH_TOKENS: usize = 5;

/// Validates fix suggestions before any project state is touched.
pub struct FixValidator {
    analyzer: Arc<dyn StaticAnalyzer>,
}

impl FixValidator {
    pub fn new(analyzer: Arc<dyn StaticAnalyzer>) -> Self {
        Self { analyzer }
    }

    /// Run all five checks. Never short-circuits: every check contributes to
    /// the result so confidence reflects the full picture.
    pub fn validate_fix(&self, fix: &FixSuggestion, context: &ErrorContext) -> ValidationResult {
        let checks = vec![
            self.syntax_check(fix, &context.target_file),
            self.type_check(fix, &context.target_file),
            self.import_check(fix, context),
            Self::logic_check(fix),
            Self::style_check(fix, &context.file_content),
        ];
        let result = ValidationResult::from_checks(checks);
        debug!(
            valid = result.valid,
            confidence = result.confidence,
            "fix validation complete"
        );
        result
    }

    /// Gate run by the applicator right before mutation.
    ///
    /// A replace fix whose `old_code` is not found verbatim in the current
    /// content is rejected outright with no further checks; everything else
    /// gets a syntax check plus non-blocking size and confidence warnings.
    pub fn validate_pre_application(
        &self,
        fix: &FixSuggestion,
        current_content: &str,
    ) -> ValidationResult {
        if matches!(fix.fix_type, FixType::Replace | FixType::Delete) {
            let old = fix.old_code.as_deref().unwrap_or("");
            if old.is_empty() || !current_content.contains(old) {
                return ValidationResult::from_checks(vec![ValidationCheck::failed(
                    "Code Match Check",
                    true,
                    "old_code not found verbatim in current file content",
                )]);
            }
        }

        let mut checks = vec![self.syntax_check(fix, &fix.target_file)];

        let delta = fix.new_code.len().abs_diff(
            fix.old_code.as_deref().map_or(0, str::len),
        );
        if delta > SIZE_WARNING_THRESHOLD {
            checks.push(ValidationCheck::failed(
                "Size Check",
                false,
                format!("fix changes {delta} characters, review recommended"),
            ));
        } else {
            checks.push(ValidationCheck::passed("Size Check", false));
        }

        if fix.confidence < REVIEW_CONFIDENCE_THRESHOLD {
            checks.push(ValidationCheck::failed(
                "Confidence Check",
                false,
                format!(
                    "confidence {:.2} below review threshold {REVIEW_CONFIDENCE_THRESHOLD}",
                    fix.confidence
                ),
            ));
        } else {
            checks.push(ValidationCheck::passed("Confidence Check", false));
        }

        ValidationResult::from_checks(checks)
    }

    /// Critical: new code must parse.
    fn syntax_check(&self, fix: &FixSuggestion, file_path: &str) -> ValidationCheck {
        // Package installs carry no code to parse.
        if fix.fix_type == FixType::InstallPackage {
            return ValidationCheck::passed("Syntax Check", true);
        }
        let report = self.analyzer.lint(&fix.new_code, file_path, false);
        let syntax_errors: Vec<_> = report
            .errors
            .iter()
            .filter(|d| d.rule == "syntax-error")
            .collect();
        if syntax_errors.is_empty() {
            ValidationCheck::passed("Syntax Check", true)
        } else {
            ValidationCheck::failed(
                "Syntax Check",
                true,
                syntax_errors
                    .iter()
                    .map(|d| d.message.clone())
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        }
    }

    /// Non-critical, typed files only: diagnostics depress confidence but do
    /// not block.
    fn type_check(&self, fix: &FixSuggestion, file_path: &str) -> ValidationCheck {
        if !is_typed_file(file_path) {
            return ValidationCheck::passed("Type Check", false);
        }
        let diagnostics = self.analyzer.type_check(&fix.new_code, file_path);
        if diagnostics.is_empty() {
            ValidationCheck::passed("Type Check", false)
        } else {
            ValidationCheck::failed(
                "Type Check",
                false,
                format!("{} type diagnostics in new code", diagnostics.len()),
            )
        }
    }

    /// Critical: every non-relative import must resolve against declared
    /// dependencies. Failures are auto-fixable via a package install.
    fn import_check(&self, fix: &FixSuggestion, context: &ErrorContext) -> ValidationCheck {
        let missing: Vec<String> = extract_imports(&fix.new_code)
            .into_iter()
            .filter(|module| !module.starts_with('.') && !module.starts_with('/'))
            .filter(|module| !context.metadata.dependencies.contains_key(base_package(module)))
            .collect();

        if missing.is_empty() {
            ValidationCheck::passed("Import Check", true)
        } else {
            let first = base_package(&missing[0]).to_string();
            ValidationCheck::failed(
                "Import Check",
                true,
                format!("missing dependencies: {}", missing.join(", ")),
            )
            .with_auto_fix(AutoFix::InstallPackage { name: first })
        }
    }

    /// Non-critical heuristics for obviously risky code.
    fn logic_check(fix: &FixSuggestion) -> ValidationCheck {
        let code = &fix.new_code;

        let has_unbroken_loop = (code.contains("while(true)") || code.contains("while (true)"))
            && !code.contains("break");
        if has_unbroken_loop {
            return ValidationCheck::failed(
                "Logic Check",
                false,
                "while(true) without break, possible infinite loop",
            );
        }

        let nullish = code.matches("undefined").count() + code.matches("null").count();
        if nullish > MAX_NULLISH_TOKENS {
            return ValidationCheck::failed(
                "Logic Check",
                false,
                format!("{nullish} undefined/null references, possible unhandled values"),
            );
        }

        ValidationCheck::passed("Logic Check", false)
    }

    /// Non-critical: indentation convention of the new code should match the
    /// original file.
    fn style_check(fix: &FixSuggestion, original: &str) -> ValidationCheck {
        let (original_style, new_style) = (indent_style(original), indent_style(&fix.new_code));
        match (original_style, new_style) {
            (Some(orig), Some(new)) if orig != new => ValidationCheck::failed(
                "Style Check",
                false,
                format!("indentation mismatch: file uses {orig}, fix uses {new}"),
            ),
            _ => ValidationCheck::passed("Style Check", false),
        }
    }
}

/// Import specifiers found in a code string. Handles ES `import ... from`,
/// side-effect imports, and CommonJS `require`.
pub fn extract_imports(code: &str) -> Vec<String> {
    let mut imports = Vec::new();
    for line in code.lines() {
        let trimmed = line.trim();
        if let Some(module) = parse_import_line(trimmed) {
            imports.push(module);
        }
    }
    imports
}

fn parse_import_line(line: &str) -> Option<String> {
    let specifier = if (line.starts_with("import ") || line.starts_with("export "))
        && line.contains(" from ")
    {
        let from_idx = line.find(" from ")?;
        line[from_idx + 6..].trim()
    } else if let Some(rest) = line.strip_prefix("import ") {
        // Side-effect import: import './styles.css';
        rest.trim()
    } else if let Some(idx) = line.find("require(") {
        line[idx + "require(".len()..].trim_end_matches([')', ';'])
    } else {
        return None;
    };
    let specifier = specifier.trim_end_matches(';').trim();
    let quote = specifier.chars().next()?;
    if quote != '\'' && quote != '"' {
        return None;
    }
    let inner = &specifier[1..];
    let end = inner.find(quote)?;
    Some(inner[..end].to_string())
}

/// The package portion of an import specifier (`@scope/pkg/deep` -> `@scope/pkg`).
fn base_package(specifier: &str) -> &str {
    let mut parts = specifier.splitn(3, '/');
    match (parts.next(), parts.next()) {
        (Some(scope), Some(name)) if scope.starts_with('@') => {
            &specifier[..scope.len() + 1 + name.len()]
        }
        (Some(name), _) => name,
        (None, _) => specifier,
    }
}

/// Dominant indentation character of a code block, if any line is indented.
fn indent_style(code: &str) -> Option<&'static str> {
    let mut spaces = 0usize;
    let mut tabs = 0usize;
    for line in code.lines() {
        if line.starts_with('\t') {
            tabs += 1;
        } else if line.starts_with(' ') {
            spaces += 1;
        }
    }
    if spaces == 0 && tabs == 0 {
        None
    } else if tabs > spaces {
        Some("tabs")
    } else {
        Some("spaces")
    }
}
