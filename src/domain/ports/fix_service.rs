//! Port trait for the external AI code-fixing service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by fix service adapters.
#[derive(Debug, Error)]
pub enum FixServiceError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Service error: {0}")]
    ServerError(String),

    #[error("Service overloaded")]
    Overloaded,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Timeout waiting for response")]
    Timeout,
}

impl FixServiceError {
    /// True if this error is transient and worth retrying at the transport
    /// layer (rate limits, 5xx, overload, timeouts).
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded | Self::ServerError(_) | Self::Overloaded | Self::Timeout
        )
    }
}

/// Structured request to the fix service.
///
/// The request always carries a single tool schema describing the fix shape;
/// the service is expected to answer with a matching tool call, but free-text
/// answers are tolerated via the generator's fallback parser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixRequest {
    /// System prompt constraining the service to surgical, complete fixes
    pub system: String,
    /// User prompt embedding the full error context
    pub prompt: String,
    /// Single tool the service should call, with its JSON input schema
    pub tool: ToolSchema,
}

/// Tool definition sent with every fix request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// Response from the fix service: either the expected tool call, or free
/// text the generator must mine for a fenced code block.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FixResponse {
    ToolCall {
        name: String,
        arguments: serde_json::Value,
    },
    Text {
        content: String,
    },
}

/// Port trait for the AI code-fixing service.
///
/// Adapters own transport concerns (HTTP, authentication, transient-error
/// retry); the generator owns prompt construction and response parsing.
#[async_trait]
pub trait FixService: Send + Sync {
    async fn request_fix(&self, request: FixRequest) -> Result<FixResponse, FixServiceError>;
}
