//! # Provider Abstraction Layer
//!
//! Trait and implementations for chat-completion backends.
//!
//! - [`Provider`] - Core trait for executing one completion request
//! - [`OpenAIProvider`] - Production provider speaking the OpenAI Chat Completions API
//! - [`MockProvider`] - Test provider with queued replies and failure simulation
//!
//! ## Creating Providers
//!
//! ```rust
//! use moodlight::config::Config;
//! use moodlight::provider::create_provider;
//!
//! let config = Config::from_lookup(|_| None);
//!
//! assert!(create_provider("mock", &config).is_ok());
//! // openai needs OPENAI_API_KEY
//! assert!(create_provider("openai", &config).is_err());
//! assert!(create_provider("invalid", &config).is_err());
//! ```

mod mock;
mod openai;

pub use mock::{MockProvider, MockReply, DEFAULT_MOCK_RESPONSE};
pub use openai::{upstream_message, OpenAIProvider, DEFAULT_BASE_URL};

use crate::config::Config;
use crate::error::{MoodlightError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Average characters per token for mixed content
const CHARS_PER_TOKEN_MIXED: f32 = 3.0;

// ============================================================================
// CAPABILITIES
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Honors `response_format: json_object`
    pub json_mode: bool,
}

impl Capabilities {
    pub fn openai() -> Self {
        Self { json_mode: true }
    }
}

// ============================================================================
// PROVIDER TRAIT (ASYNC)
// ============================================================================

/// Core trait that all completion backends implement
///
/// A provider performs exactly one upstream call per [`Provider::execute`];
/// retries and repair round-trips are the caller's business.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Returns the provider name (e.g., "openai", "mock")
    fn name(&self) -> &str;

    /// Whether JSON mode is requested is decided from these
    fn capabilities(&self) -> Capabilities;

    /// Execute a request and return the completion.
    ///
    /// Non-2xx upstream replies are [`MoodlightError::Upstream`] carrying the
    /// upstream status; network failures are [`MoodlightError::Transport`].
    async fn execute(&self, request: PromptRequest) -> Result<PromptResponse>;
}

// ============================================================================
// REQUEST/RESPONSE TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Request to execute one chat completion
#[derive(Debug, Clone, PartialEq)]
pub struct PromptRequest {
    /// Model to use (e.g., "gpt-4o-mini")
    pub model: String,

    /// Ordered messages: system prompts first, then the user message
    pub messages: Vec<ChatMessage>,

    /// Ask for `response_format: {"type": "json_object"}`
    pub json_mode: bool,
}

impl PromptRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: vec![],
            json_mode: false,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.messages.push(ChatMessage::system(prompt));
        self
    }

    pub fn with_user_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.messages.push(ChatMessage::user(prompt));
        self
    }

    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }

    /// Content of the last user message
    pub fn prompt(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }

    pub fn system_prompts(&self) -> impl Iterator<Item = &str> {
        self.messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
    }
}

/// Response from a completion
#[derive(Debug, Clone)]
pub struct PromptResponse {
    /// The generated text
    pub content: String,

    /// Token usage as reported upstream
    pub usage: Option<TokenUsage>,

    /// Untouched upstream response body
    pub raw: Value,
}

impl PromptResponse {
    pub fn new(content: impl Into<String>, raw: Value) -> Self {
        Self {
            content: content.into(),
            usage: None,
            raw,
        }
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenUsage {
    /// Tokens in the prompt (input)
    pub prompt_tokens: u32,

    /// Tokens in the response (output)
    pub completion_tokens: u32,

    /// Total tokens used
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt: u32, completion: u32) -> Self {
        Self {
            prompt_tokens: prompt,
            completion_tokens: completion,
            total_tokens: prompt + completion,
        }
    }

    /// Estimate usage when the backend reports none
    pub fn estimate(prompt_len: usize, response_len: usize) -> Self {
        let prompt_tokens = (prompt_len as f32 / CHARS_PER_TOKEN_MIXED).ceil() as u32;
        let completion_tokens = (response_len as f32 / CHARS_PER_TOKEN_MIXED).ceil() as u32;
        Self::new(prompt_tokens, completion_tokens)
    }
}

// ============================================================================
// PROVIDER FACTORY
// ============================================================================

/// Create a provider instance by name
///
/// | Name | Description | Requires |
/// |------|-------------|----------|
/// | `openai` | OpenAI-compatible API | `OPENAI_API_KEY`, optional `OPENAI_BASE_URL` |
/// | `mock` | Offline canned reply | Nothing |
pub fn create_provider(name: &str, config: &Config) -> Result<Arc<dyn Provider>> {
    match name.to_lowercase().as_str() {
        "openai" => Ok(Arc::new(OpenAIProvider::from_config(config)?)),
        "mock" => Ok(Arc::new(MockProvider::new())),
        _ => Err(MoodlightError::UnknownProvider(name.to_string())),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_request_builder() {
        let req = PromptRequest::new("gpt-4o-mini")
            .with_system_prompt("You are helpful")
            .with_system_prompt("Context: sunny")
            .with_user_prompt("Hello")
            .json();

        assert_eq!(req.model, "gpt-4o-mini");
        assert_eq!(req.prompt(), "Hello");
        assert_eq!(
            req.system_prompts().collect::<Vec<_>>(),
            vec!["You are helpful", "Context: sunny"]
        );
        assert!(req.json_mode);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_value(ChatMessage::system("x")).unwrap();
        assert_eq!(json["role"], "system");
    }

    #[test]
    fn test_token_usage_estimate() {
        // With ratio 3.0: 300/3 = 100, 150/3 = 50
        let usage = TokenUsage::estimate(300, 150);

        assert_eq!(usage.prompt_tokens, 100);
        assert_eq!(usage.completion_tokens, 50);
        assert_eq!(usage.total_tokens, 150);
    }

    #[test]
    fn test_token_usage_partial_json() {
        let usage: TokenUsage = serde_json::from_str(r#"{"prompt_tokens": 7}"#).unwrap();
        assert_eq!(usage.prompt_tokens, 7);
        assert_eq!(usage.total_tokens, 0);
    }

    #[test]
    fn test_create_provider_mock() {
        let config = Config::from_lookup(|_| None);
        let provider = create_provider("MOCK", &config).unwrap();
        assert_eq!(provider.name(), "mock");
    }

    #[test]
    fn test_create_provider_openai_needs_key() {
        let config = Config::from_lookup(|_| None);
        let err = create_provider("openai", &config).err().unwrap();
        assert_eq!(err.to_string(), "Missing OPENAI_API_KEY in environment");

        let config = Config::from_lookup(|k| (k == "OPENAI_API_KEY").then(|| "sk-test".to_string()));
        assert_eq!(create_provider("openai", &config).unwrap().name(), "openai");
    }

    #[test]
    fn test_create_provider_unknown() {
        let config = Config::from_lookup(|_| None);
        assert!(matches!(
            create_provider("claude", &config),
            Err(MoodlightError::UnknownProvider(_))
        ));
    }
}
