//! Fix generation via the external AI code-fixing service.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ErrorContext, FixSuggestion, FixType};
use crate::domain::ports::{FixRequest, FixResponse, FixService, ToolSchema};

/// Confidence assigned when the tool call omits one.
const DEFAULT_TOOL_CONFIDENCE: f64 = 0.8;

/// Confidence assigned to free-text fallback fixes. Lower than the tool-call
/// default: the service ignored the structured protocol.
const FALLBACK_CONFIDENCE: f64 = 0.7;

const SYSTEM_PROMPT: &str = "\
You are an expert code-repair assistant. Produce the smallest fix that \
resolves the reported error. Rules: make surgical changes only, never \
rewrite unrelated code, never emit placeholders or TODOs, and always return \
complete, runnable code. Respond with the propose_fix tool.";

/// Wire shape of the propose_fix tool call arguments.
#[derive(Debug, Deserialize)]
struct ToolCallFix {
    fix_type: String,
    #[serde(default)]
    target_file: String,
    #[serde(default)]
    old_code: Option<String>,
    #[serde(default)]
    new_code: String,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    position: Option<usize>,
    #[serde(default)]
    package: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    old_import: Option<String>,
    #[serde(default)]
    new_import: Option<String>,
}

/// Turns an [`ErrorContext`] into a canonical [`FixSuggestion`] by way of
/// the external fix service's tool-call protocol.
pub struct FixGenerator {
    service: Arc<dyn FixService>,
}

impl FixGenerator {
    pub fn new(service: Arc<dyn FixService>) -> Self {
        Self { service }
    }

    /// Request a fix for the given context.
    pub async fn generate_fix(&self, context: &ErrorContext) -> DomainResult<FixSuggestion> {
        let request = FixRequest {
            system: SYSTEM_PROMPT.to_string(),
            prompt: build_prompt(context),
            tool: tool_schema(),
        };

        let response = self
            .service
            .request_fix(request)
            .await
            .map_err(|err| DomainError::GenerationFailed(err.to_string()))?;

        let suggestion = match response {
            FixResponse::ToolCall { name, arguments } => {
                debug!(tool = %name, "tool call received");
                Self::parse_tool_call(arguments, context)?
            }
            FixResponse::Text { content } => {
                warn!("fix service answered with free text, using fenced-block fallback");
                Self::parse_text_fallback(&content, context)?
            }
        };

        suggestion
            .check_shape()
            .map_err(DomainError::InvalidFix)?;
        Ok(suggestion)
    }

    fn parse_tool_call(
        arguments: serde_json::Value,
        context: &ErrorContext,
    ) -> DomainResult<FixSuggestion> {
        let raw: ToolCallFix = serde_json::from_value(arguments)
            .map_err(|err| DomainError::GenerationFailed(format!("bad tool call: {err}")))?;

        let fix_type = FixType::from_str(&raw.fix_type).ok_or_else(|| {
            DomainError::GenerationFailed(format!("unknown fix_type: {}", raw.fix_type))
        })?;

        Ok(FixSuggestion {
            id: Uuid::new_v4(),
            fix_type,
            target_file: if raw.target_file.is_empty() {
                context.target_file.clone()
            } else {
                raw.target_file
            },
            old_code: raw.old_code.filter(|s| !s.is_empty()),
            new_code: raw.new_code,
            explanation: raw.explanation,
            confidence: raw
                .confidence
                .unwrap_or(DEFAULT_TOOL_CONFIDENCE)
                .clamp(0.0, 1.0),
            position: raw.position,
            package: raw.package,
            version: raw.version,
            old_import: raw.old_import,
            new_import: raw.new_import,
        })
    }

    /// Free-text fallback: extract the first fenced code block and treat it
    /// as a whole-file replacement.
    fn parse_text_fallback(content: &str, context: &ErrorContext) -> DomainResult<FixSuggestion> {
        let block = extract_fenced_block(content).ok_or_else(|| {
            DomainError::GenerationFailed(
                "free-text response contained no fenced code block".to_string(),
            )
        })?;

        let explanation = content
            .lines()
            .take_while(|line| !line.trim_start().starts_with("```"))
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string();

        Ok(FixSuggestion {
            id: Uuid::new_v4(),
            fix_type: FixType::Replace,
            target_file: context.target_file.clone(),
            old_code: Some(context.file_content.clone()),
            new_code: block,
            explanation: if explanation.is_empty() {
                "whole-file rewrite from free-text response".to_string()
            } else {
                explanation
            },
            confidence: FALLBACK_CONFIDENCE,
            position: None,
            package: None,
            version: None,
            old_import: None,
            new_import: None,
        })
    }
}

/// Prompt embedding the full context bundle.
fn build_prompt(context: &ErrorContext) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!("Error: {}\n", context.error.message));
    if let Some(stack) = &context.error.stack {
        prompt.push_str(&format!("Stack trace:\n{stack}\n"));
    }
    prompt.push_str(&format!(
        "\nProject: {} (framework: {})\n",
        context.project_id, context.metadata.framework
    ));
    if !context.metadata.dependencies.is_empty() {
        let deps: Vec<String> = context
            .metadata
            .dependencies
            .iter()
            .map(|(name, version)| format!("{name}@{version}"))
            .collect();
        prompt.push_str(&format!("Dependencies: {}\n", deps.join(", ")));
    }

    if !context.excerpt.is_empty() {
        prompt.push_str(&format!(
            "\nCode around the failure ({}):\n{}\n",
            display_target(&context.target_file),
            context.excerpt
        ));
    }

    prompt.push_str(&format!(
        "\nFull content of {}:\n```\n{}\n```\n",
        display_target(&context.target_file),
        context.file_content
    ));

    for related in &context.related_files {
        prompt.push_str(&format!(
            "\nRelated file {}:\n```\n{}\n```\n",
            related.path, related.content
        ));
    }

    if !context.recent_changes.is_empty() {
        prompt.push_str("\nRecent changes:\n");
        for change in &context.recent_changes {
            prompt.push_str(&format!("- {}\n", change.description));
        }
    }

    // Prior failures steer the generator away from repeating them.
    if !context.previous_attempts.is_empty() {
        prompt.push_str("\nPreviously attempted fixes that FAILED (do not repeat):\n");
        for attempt in &context.previous_attempts {
            prompt.push_str(&format!("- {}", attempt.explanation));
            if let Some(reason) = &attempt.failure_reason {
                prompt.push_str(&format!(" (failed: {reason})"));
            }
            prompt.push('\n');
        }
    }

    prompt
}

fn display_target(target_file: &str) -> &str {
    if target_file.is_empty() {
        "the main component"
    } else {
        target_file
    }
}

/// Schema for the single propose_fix tool sent with every request.
fn tool_schema() -> ToolSchema {
    ToolSchema {
        name: "propose_fix".to_string(),
        description: "Propose a structured fix for the reported error".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "fix_type": {
                    "type": "string",
                    "enum": ["replace", "insert", "delete", "install_package", "update_import"]
                },
                "target_file": { "type": "string" },
                "old_code": { "type": "string" },
                "new_code": { "type": "string" },
                "explanation": { "type": "string" },
                "confidence": { "type": "number", "minimum": 0, "maximum": 1 },
                "position": { "type": "integer" },
                "package": { "type": "string" },
                "version": { "type": "string" },
                "old_import": { "type": "string" },
                "new_import": { "type": "string" }
            },
            "required": ["fix_type", "new_code", "explanation"]
        }),
    }
}

/// First fenced code block in a free-text response.
fn extract_fenced_block(content: &str) -> Option<String> {
    let start = content.find("```")?;
    let after_fence = &content[start + 3..];
    // Skip the language tag line.
    let body_start = after_fence.find('\n')? + 1;
    let body = &after_fence[body_start..];
    let end = body.find("```")?;
    let block = body[..end].trim_end().to_string();
    if block.is_empty() {
        None
    } else {
        Some(block)
    }
}
