//! Error context assembly.
//!
//! Gathers everything the fix generator needs into one bundle. Every
//! sub-fetch degrades to an empty default on failure: context building never
//! fails the pipeline, it just produces a thinner bundle.

use std::sync::Arc;

use regex::Regex;
use tracing::{debug, warn};

use crate::domain::models::{
    AppError, AttemptedFix, ErrorContext, ProjectMetadata, ProjectState, RelatedFile,
};
use crate::domain::ports::ProjectStore;
use crate::services::fix_validator::extract_imports;
use crate::services::history_service::FixHistoryService;

/// Lines of context shown on each side of the failing line.
const EXCERPT_WINDOW: usize = 10;

/// Excerpt fallback length when no line number is known.
const EXCERPT_FALLBACK_CHARS: usize = 1000;

const MAX_RELATED_FILES: usize = 5;
const MAX_RECENT_CHANGES: usize = 10;

/// Framework packages recognized in the dependency manifest, checked in
/// order. Unrecognized stacks fall back to the generic SPA label.
const FRAMEWORK_PACKAGES: &[(&str, &str)] = &[
    ("react", "react"),
    ("vue", "vue"),
    ("svelte", "svelte"),
    ("@angular/core", "angular"),
    ("preact", "preact"),
];

const DEFAULT_FRAMEWORK: &str = "spa";

/// Builds the [`ErrorContext`] bundle for one error.
pub struct ContextBuilder {
    store: Arc<dyn ProjectStore>,
    history: Arc<FixHistoryService>,
    stack_location: Regex,
}

impl ContextBuilder {
    pub fn new(store: Arc<dyn ProjectStore>, history: Arc<FixHistoryService>) -> Self {
        Self {
            store,
            history,
            // file:line:column, as found in browser stack traces
            stack_location: Regex::new(r"([\w@./-]+\.[jt]sx?):(\d+):(\d+)")
                .expect("stack location pattern is valid"),
        }
    }

    /// Assemble the context bundle for an error in a project.
    pub async fn build_context(
        &self,
        error: &AppError,
        project_id: &str,
        file_path: Option<&str>,
    ) -> ErrorContext {
        let state = match self.store.get(project_id).await {
            Ok(state) => state,
            Err(err) => {
                warn!(project_id, error = %err, "project fetch failed, building bare context");
                ProjectState::default()
            }
        };

        let (target_file, line) = self.resolve_location(error, file_path);
        let file_content = state.content_of(&target_file).to_string();
        let excerpt = build_excerpt(&file_content, line);
        let imports = extract_imports(&file_content);

        let metadata = ProjectMetadata {
            framework: infer_framework(&state.metadata),
            ..state.metadata.clone()
        };

        let related_files = related_files(&state, &target_file, &imports);

        let recent_changes = match self
            .store
            .recent_changes(project_id, MAX_RECENT_CHANGES)
            .await
        {
            Ok(changes) => changes,
            Err(err) => {
                warn!(project_id, error = %err, "change history fetch failed");
                Vec::new()
            }
        };

        let previous_attempts = match self.history.entries_for_error(project_id, error).await {
            Ok(entries) => entries
                .into_iter()
                .filter(|e| !e.success)
                .map(|e| AttemptedFix {
                    explanation: e.fix.explanation,
                    failure_reason: Some(e.error_message),
                    timestamp: e.timestamp,
                })
                .collect(),
            Err(err) => {
                warn!(project_id, error = %err, "prior fix lookup failed");
                Vec::new()
            }
        };

        debug!(
            project_id,
            target_file,
            related = related_files.len(),
            prior_attempts = previous_attempts.len(),
            "context built"
        );

        ErrorContext {
            error: error.clone(),
            project_id: project_id.to_string(),
            target_file,
            file_content,
            excerpt,
            imports,
            metadata,
            related_files,
            recent_changes,
            previous_attempts,
        }
    }

    /// Target file and line: explicit path wins, then the error's own
    /// location, then the first `file:line:column` match in the stack trace.
    fn resolve_location(&self, error: &AppError, file_path: Option<&str>) -> (String, Option<u32>) {
        if let Some(path) = file_path {
            return (path.to_string(), error.line);
        }
        if let Some(file) = &error.file {
            return (file.clone(), error.line);
        }
        if let Some(stack) = &error.stack {
            if let Some(captures) = self.stack_location.captures(stack) {
                let file = captures[1].to_string();
                let line = captures[2].parse().ok();
                return (file, line);
            }
        }
        (String::new(), error.line)
    }
}

/// Windowed excerpt around the failing line with a marker on the exact line,
/// or the first chunk of the file when no line is known.
fn build_excerpt(content: &str, line: Option<u32>) -> String {
    let Some(line) = line else {
        return content.chars().take(EXCERPT_FALLBACK_CHARS).collect();
    };
    let lines: Vec<&str> = content.lines().collect();
    if lines.is_empty() {
        return String::new();
    }
    let target = (line as usize).saturating_sub(1).min(lines.len() - 1);
    let start = target.saturating_sub(EXCERPT_WINDOW);
    let end = (target + EXCERPT_WINDOW + 1).min(lines.len());

    lines[start..end]
        .iter()
        .enumerate()
        .map(|(offset, text)| {
            let number = start + offset + 1;
            let marker = if start + offset == target { "→" } else { " " };
            format!("{marker} {number:4} | {text}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Framework label from the dependency manifest.
fn infer_framework(metadata: &ProjectMetadata) -> String {
    for (package, label) in FRAMEWORK_PACKAGES {
        if metadata.dependencies.contains_key(*package) {
            return (*label).to_string();
        }
    }
    if metadata.framework.is_empty() {
        DEFAULT_FRAMEWORK.to_string()
    } else {
        metadata.framework.clone()
    }
}

/// Files whose paths intersect the target's import list, capped.
fn related_files(state: &ProjectState, target_file: &str, imports: &[String]) -> Vec<RelatedFile> {
    let mut related = Vec::new();
    for (path, content) in &state.files {
        if path == target_file {
            continue;
        }
        let stem = path
            .trim_end_matches(".tsx")
            .trim_end_matches(".ts")
            .trim_end_matches(".jsx")
            .trim_end_matches(".js");
        let is_imported = imports.iter().any(|import| {
            let import_stem = import.trim_start_matches("./").trim_start_matches("../");
            !import_stem.is_empty() && (stem.ends_with(import_stem) || import_stem.ends_with(stem))
        });
        if is_imported {
            related.push(RelatedFile {
                path: path.clone(),
                content: content.clone(),
            });
            if related.len() >= MAX_RELATED_FILES {
                break;
            }
        }
    }
    related
}
