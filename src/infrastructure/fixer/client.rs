//! HTTP adapter for the AI fix service.

use async_trait::async_trait;
use reqwest::{header, Client as ReqwestClient, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::domain::models::{FixServiceConfig, RetryConfig};
use crate::domain::ports::{FixRequest, FixResponse, FixService, FixServiceError};

use super::retry::RetryPolicy;
use super::types::{ContentBlock, Message, MessageRequest, MessageResponse, Tool};

const API_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Production HTTP client for the fix service.
///
/// Owns transport concerns only: connection pooling, authentication headers,
/// status classification, and transient-error retry. Prompt construction and
/// response interpretation live in the fix generator.
pub struct HttpFixService {
    http_client: ReqwestClient,
    base_url: String,
    model: String,
    max_tokens: usize,
    temperature: f64,
    retry_policy: RetryPolicy,
}

impl HttpFixService {
    /// Build a client from configuration. The API key is read from the
    /// environment variable named by `config.api_key_env`.
    pub fn new(config: &FixServiceConfig, retry: &RetryConfig) -> Result<Self, FixServiceError> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            FixServiceError::AuthenticationFailed(format!(
                "environment variable {} is not set",
                config.api_key_env
            ))
        })?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            "x-api-key",
            header::HeaderValue::from_str(&api_key).map_err(|e| {
                FixServiceError::InvalidRequest(format!("invalid API key: {e}"))
            })?,
        );
        headers.insert(
            "anthropic-version",
            header::HeaderValue::from_static(API_VERSION),
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let http_client = ReqwestClient::builder()
            .pool_max_idle_per_host(10)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .tcp_nodelay(true)
            .default_headers(headers)
            .build()
            .map_err(|e| FixServiceError::NetworkError(e.to_string()))?;

        info!(
            base_url = %config.base_url,
            model = %config.model,
            "initialized fix service client"
        );

        Ok(Self {
            http_client,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            retry_policy: RetryPolicy::new(retry),
        })
    }

    fn build_message_request(&self, request: &FixRequest) -> MessageRequest {
        MessageRequest {
            model: self.model.clone(),
            messages: vec![Message::user(request.prompt.clone())],
            max_tokens: self.max_tokens,
            system: Some(request.system.clone()),
            temperature: Some(self.temperature),
            tools: Some(vec![Tool {
                name: request.tool.name.clone(),
                description: request.tool.description.clone(),
                input_schema: request.tool.input_schema.clone(),
            }]),
        }
    }

    async fn send_once(&self, request: &MessageRequest) -> Result<MessageResponse, FixServiceError> {
        let url = format!("{}/v1/messages", self.base_url);
        debug!(%url, "POST");

        let response = self
            .http_client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FixServiceError::Timeout
                } else {
                    FixServiceError::NetworkError(e.to_string())
                }
            })?;

        self.handle_response(response).await
    }

    async fn handle_response(
        &self,
        response: Response,
    ) -> Result<MessageResponse, FixServiceError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_string());
            warn!(%status, body, "fix service error response");
            return Err(classify_status(status, body));
        }

        response
            .json()
            .await
            .map_err(|e| FixServiceError::MalformedResponse(e.to_string()))
    }
}

fn classify_status(status: StatusCode, body: String) -> FixServiceError {
    match status {
        StatusCode::BAD_REQUEST => FixServiceError::InvalidRequest(body),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            FixServiceError::AuthenticationFailed(body)
        }
        StatusCode::TOO_MANY_REQUESTS => FixServiceError::RateLimitExceeded,
        status if status.as_u16() == 529 => FixServiceError::Overloaded,
        status if status.is_server_error() => {
            FixServiceError::ServerError(format!("{status}: {body}"))
        }
        status => FixServiceError::ServerError(format!("unexpected status {status}: {body}")),
    }
}

/// Interpret the response content: the first tool call wins, otherwise all
/// text blocks are joined for the generator's free-text fallback.
fn into_fix_response(response: MessageResponse) -> Result<FixResponse, FixServiceError> {
    let mut texts = Vec::new();
    for block in response.content {
        match block {
            ContentBlock::ToolUse { name, input, .. } => {
                return Ok(FixResponse::ToolCall {
                    name,
                    arguments: input,
                });
            }
            ContentBlock::Text { text } => texts.push(text),
        }
    }

    if texts.is_empty() {
        return Err(FixServiceError::MalformedResponse(
            "response contained no usable content".to_string(),
        ));
    }
    Ok(FixResponse::Text {
        content: texts.join("\n"),
    })
}

#[async_trait]
impl FixService for HttpFixService {
    async fn request_fix(&self, request: FixRequest) -> Result<FixResponse, FixServiceError> {
        let message_request = self.build_message_request(&request);
        let response = self
            .retry_policy
            .execute(|| self.send_once(&message_request))
            .await?;

        debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            stop_reason = ?response.stop_reason,
            "fix service responded"
        );
        into_fix_response(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::fixer::types::Usage;

    #[test]
    fn status_classification_matches_transience() {
        assert!(!classify_status(StatusCode::BAD_REQUEST, String::new()).is_transient());
        assert!(!classify_status(StatusCode::UNAUTHORIZED, String::new()).is_transient());
        assert!(classify_status(StatusCode::TOO_MANY_REQUESTS, String::new()).is_transient());
        assert!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR, String::new()).is_transient()
        );
        assert!(classify_status(
            StatusCode::from_u16(529).unwrap(),
            String::new()
        )
        .is_transient());
    }

    #[test]
    fn tool_call_takes_precedence_over_text() {
        let response = MessageResponse {
            content: vec![
                ContentBlock::Text {
                    text: "thinking...".to_string(),
                },
                ContentBlock::ToolUse {
                    id: "tu_1".to_string(),
                    name: "propose_fix".to_string(),
                    input: serde_json::json!({"fix_type": "replace"}),
                },
            ],
            stop_reason: Some("tool_use".to_string()),
            usage: Usage::default(),
        };

        match into_fix_response(response).unwrap() {
            FixResponse::ToolCall { name, .. } => assert_eq!(name, "propose_fix"),
            FixResponse::Text { .. } => panic!("expected tool call"),
        }
    }

    #[test]
    fn text_blocks_are_joined_when_no_tool_call() {
        let response = MessageResponse {
            content: vec![
                ContentBlock::Text {
                    text: "part one".to_string(),
                },
                ContentBlock::Text {
                    text: "part two".to_string(),
                },
            ],
            stop_reason: None,
            usage: Usage::default(),
        };

        match into_fix_response(response).unwrap() {
            FixResponse::Text { content } => assert_eq!(content, "part one\npart two"),
            FixResponse::ToolCall { .. } => panic!("expected text"),
        }
    }

    #[test]
    fn empty_content_is_malformed() {
        let response = MessageResponse {
            content: vec![],
            stop_reason: None,
            usage: Usage::default(),
        };
        assert!(matches!(
            into_fix_response(response),
            Err(FixServiceError::MalformedResponse(_))
        ));
    }
}
