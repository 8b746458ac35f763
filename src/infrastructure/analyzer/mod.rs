//! Built-in heuristic static analyzer.
//!
//! A lightweight linter/type-checker that is a pure function of its inputs:
//! no network, no project store. It deliberately never errors — a parse
//! failure surfaces as a single `syntax-error` diagnostic so callers can
//! treat malformed input like any other finding.

use regex::Regex;

use crate::domain::models::{Diagnostic, LintReport, Severity};
use crate::domain::ports::{is_typed_file, StaticAnalyzer};

/// Heuristic JavaScript/TypeScript analyzer.
pub struct HeuristicAnalyzer {
    number_assigned_string: Regex,
    string_assigned_number: Regex,
}

impl Default for HeuristicAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl HeuristicAnalyzer {
    pub fn new() -> Self {
        Self {
            number_assigned_string: Regex::new(r#":\s*number\s*=\s*["'`]"#)
                .expect("pattern is valid"),
            string_assigned_number: Regex::new(r":\s*string\s*=\s*\d")
                .expect("pattern is valid"),
        }
    }
}

impl StaticAnalyzer for HeuristicAnalyzer {
    fn lint(&self, code: &str, file_path: &str, auto_fix: bool) -> LintReport {
        let mut report = LintReport::default();

        if let Some(diagnostic) = check_balance(code, file_path) {
            report.errors.push(diagnostic);
        }

        for (index, line) in code.lines().enumerate() {
            let line_number = (index + 1) as u32;
            let trimmed = line.trim_start();

            if trimmed.starts_with("var ") {
                let mut diagnostic = Diagnostic {
                    file: file_path.to_string(),
                    line: line_number,
                    column: (line.len() - trimmed.len() + 1) as u32,
                    message: "unexpected var, use let or const".to_string(),
                    rule: "no-var".to_string(),
                    severity: Severity::Warning,
                    auto_fix: None,
                };
                if auto_fix {
                    diagnostic.auto_fix = Some(trimmed.replacen("var ", "let ", 1));
                }
                report.warnings.push(diagnostic);
            }

            if trimmed.contains("==") && !trimmed.contains("===") && !trimmed.contains("!==") {
                report
                    .suggestions
                    .push(format!("line {line_number}: prefer === over =="));
            }
        }

        report.fixable = report
            .errors
            .iter()
            .chain(report.warnings.iter())
            .any(|d| d.auto_fix.is_some());
        report
    }

    fn type_check(&self, code: &str, file_path: &str) -> Vec<Diagnostic> {
        if !is_typed_file(file_path) {
            return Vec::new();
        }

        let mut diagnostics = Vec::new();
        for (index, line) in code.lines().enumerate() {
            let line_number = (index + 1) as u32;
            if self.number_assigned_string.is_match(line) {
                diagnostics.push(type_error(
                    file_path,
                    line_number,
                    "string literal assigned to number-typed binding",
                ));
            }
            if self.string_assigned_number.is_match(line) {
                diagnostics.push(type_error(
                    file_path,
                    line_number,
                    "numeric literal assigned to string-typed binding",
                ));
            }
        }
        diagnostics
    }
}

fn type_error(file: &str, line: u32, message: &str) -> Diagnostic {
    Diagnostic {
        file: file.to_string(),
        line,
        column: 1,
        message: message.to_string(),
        rule: "type-mismatch".to_string(),
        severity: Severity::Error,
        auto_fix: None,
    }
}

/// Bracket/brace/paren balance scan, skipping string and comment content.
/// Any imbalance is reported as a single `syntax-error` diagnostic.
fn check_balance(code: &str, file_path: &str) -> Option<Diagnostic> {
    let mut stack: Vec<(char, u32, u32)> = Vec::new();
    let mut line: u32 = 1;
    let mut column: u32 = 0;
    let mut string_delim: Option<char> = None;
    let mut escaped = false;
    let mut in_line_comment = false;
    let mut in_block_comment = false;
    let mut previous = '\0';

    for c in code.chars() {
        column += 1;
        if c == '\n' {
            line += 1;
            column = 0;
            in_line_comment = false;
            if string_delim == Some('\'') || string_delim == Some('"') {
                // Ordinary strings do not span lines; recover rather than
                // cascade errors through the rest of the file.
                string_delim = None;
            }
            previous = '\0';
            continue;
        }

        if in_line_comment {
            continue;
        }
        if in_block_comment {
            if previous == '*' && c == '/' {
                in_block_comment = false;
            }
            previous = c;
            continue;
        }

        if let Some(delim) = string_delim {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == delim {
                string_delim = None;
            }
            previous = c;
            continue;
        }

        match c {
            '\'' | '"' | '`' => string_delim = Some(c),
            '/' if previous == '/' => in_line_comment = true,
            '*' if previous == '/' => in_block_comment = true,
            '(' | '{' | '[' => stack.push((c, line, column)),
            ')' | '}' | ']' => {
                let expected = match c {
                    ')' => '(',
                    '}' => '{',
                    _ => '[',
                };
                match stack.pop() {
                    Some((open, ..)) if open == expected => {}
                    _ => {
                        return Some(syntax_error(
                            file_path,
                            line,
                            column,
                            format!("unmatched closing '{c}'"),
                        ))
                    }
                }
            }
            _ => {}
        }
        previous = c;
    }

    stack.pop().map(|(open, open_line, open_column)| {
        syntax_error(
            file_path,
            open_line,
            open_column,
            format!("unclosed '{open}'"),
        )
    })
}

fn syntax_error(file: &str, line: u32, column: u32, message: String) -> Diagnostic {
    Diagnostic {
        file: file.to_string(),
        line,
        column,
        message,
        rule: "syntax-error".to_string(),
        severity: Severity::Error,
        auto_fix: None,
    }
}
