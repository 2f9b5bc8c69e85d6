//! OpenAI provider using the Chat Completions API
//!
//! Works against any OpenAI-compatible base URL (`OPENAI_BASE_URL`).

use super::{Capabilities, ChatMessage, PromptRequest, PromptResponse, Provider, TokenUsage};
use crate::config::Config;
use crate::error::{MoodlightError, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// Default API base, without trailing slash
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAIProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAIProvider {
    /// Build from configuration; fails without `OPENAI_API_KEY`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config
            .openai_api_key
            .clone()
            .ok_or_else(|| MoodlightError::missing_config("OPENAI_API_KEY"))?;
        Ok(Self::with_api_key(api_key).with_base_url(&config.openai_base_url))
    }

    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Override the API base; trailing slashes are stripped.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl Provider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::openai()
    }

    async fn execute(&self, request: PromptRequest) -> Result<PromptResponse> {
        let payload = ChatCompletionRequest {
            model: &request.model,
            messages: &request.messages,
            response_format: request.json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        tracing::debug!(
            provider = "openai",
            model = %payload.model,
            messages_count = payload.messages.len(),
            "Sending request to OpenAI API"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MoodlightError::Transport(format!("Failed to reach OpenAI API: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MoodlightError::Transport(format!("Failed to read OpenAI API response: {e}")))?;
        let raw: Value = serde_json::from_str(&body).unwrap_or(Value::Null);

        if !status.is_success() {
            let message = upstream_message(&raw, status.as_u16());
            tracing::error!(
                provider = "openai",
                status = %status,
                error = %message,
                "OpenAI API error"
            );
            return Err(MoodlightError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        if raw.is_null() {
            return Err(MoodlightError::Transport(
                "Failed to parse OpenAI API response".to_string(),
            ));
        }

        let content = completion_text(&raw);
        let mut reply = PromptResponse::new(content, raw.clone());
        if let Some(usage) = raw
            .get("usage")
            .filter(|u| u.is_object())
            .and_then(|u| serde_json::from_value::<TokenUsage>(u.clone()).ok())
        {
            tracing::debug!(
                provider = "openai",
                tokens = usage.total_tokens,
                "OpenAI API response received"
            );
            reply = reply.with_usage(usage);
        }

        Ok(reply)
    }
}

/// `choices[0].message.content`, else `choices[0].text`, else empty
fn completion_text(raw: &Value) -> String {
    let choice = &raw["choices"][0];
    choice["message"]["content"]
        .as_str()
        .or_else(|| choice["text"].as_str())
        .unwrap_or_default()
        .to_string()
}

/// `error.message`, else `message`, else `Upstream error ({status})`
pub fn upstream_message(body: &Value, status: u16) -> String {
    body["error"]["message"]
        .as_str()
        .or_else(|| body["message"].as_str())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Upstream error ({status})"))
}

// ============================================================================
// API TYPES
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

// ============================================================================
// TESTS
// ============================================================================
