//! Mock provider for testing
//!
//! Returns queued replies without making real API calls, and records every
//! request for assertions.

use super::{Capabilities, PromptRequest, PromptResponse, Provider, TokenUsage};
use crate::error::{MoodlightError, Result};
use async_trait::async_trait;
use serde_json::json;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Reply used once the queue is empty
pub const DEFAULT_MOCK_RESPONSE: &str = r#"{"emotion":"평온","hex":"D4E25B"}"#;

/// One queued outcome
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Failure { status: u16, message: String },
    Transport(String),
}

pub struct MockProvider {
    /// Queue of replies to return (FIFO)
    replies: Arc<Mutex<Vec<MockReply>>>,
    /// Default reply when queue is empty
    default_response: String,
    /// Every request made (for assertions)
    requests: Arc<Mutex<Vec<PromptRequest>>>,
    capabilities: Capabilities,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockProvider {
    pub fn new() -> Self {
        Self::with_responses(vec![])
    }

    /// Create with a queue of text replies
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(
                responses.into_iter().map(MockReply::Text).collect(),
            )),
            default_response: DEFAULT_MOCK_RESPONSE.to_string(),
            requests: Arc::new(Mutex::new(vec![])),
            capabilities: Capabilities { json_mode: true },
        }
    }

    pub fn with_default(mut self, response: impl Into<String>) -> Self {
        self.default_response = response.into();
        self
    }

    /// Pretend the backend cannot honor `response_format`
    pub fn without_json_mode(mut self) -> Self {
        self.capabilities.json_mode = false;
        self
    }

    pub fn queue_response(&self, response: impl Into<String>) {
        lock(&self.replies).push(MockReply::Text(response.into()));
    }

    /// Queue an upstream non-2xx reply
    pub fn queue_failure(&self, status: u16, message: impl Into<String>) {
        lock(&self.replies).push(MockReply::Failure {
            status,
            message: message.into(),
        });
    }

    /// Queue a network-level failure
    pub fn queue_transport_error(&self, message: impl Into<String>) {
        lock(&self.replies).push(MockReply::Transport(message.into()));
    }

    pub fn get_requests(&self) -> Vec<PromptRequest> {
        lock(&self.requests).clone()
    }

    pub fn last_request(&self) -> Option<PromptRequest> {
        lock(&self.requests).last().cloned()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    async fn execute(&self, request: PromptRequest) -> Result<PromptResponse> {
        lock(&self.requests).push(request.clone());

        let reply = {
            let mut queue = lock(&self.replies);
            if queue.is_empty() {
                MockReply::Text(self.default_response.clone())
            } else {
                queue.remove(0)
            }
        };

        match reply {
            MockReply::Text(content) => {
                let usage = TokenUsage::estimate(request.prompt().len(), content.len());
                let raw = json!({
                    "object": "chat.completion",
                    "model": request.model,
                    "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}],
                    "usage": usage,
                });
                Ok(PromptResponse::new(content, raw).with_usage(usage))
            }
            MockReply::Failure { status, message } => {
                Err(MoodlightError::Upstream { status, message })
            }
            MockReply::Transport(message) => Err(MoodlightError::Transport(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: &str) -> PromptRequest {
        PromptRequest::new("test-model").with_user_prompt(prompt)
    }

    #[tokio::test]
    async fn test_mock_default_response() {
        let provider = MockProvider::new();
        let response = provider.execute(request("Hello")).await.unwrap();

        assert_eq!(response.content, DEFAULT_MOCK_RESPONSE);
        assert_eq!(response.raw["choices"][0]["message"]["content"], DEFAULT_MOCK_RESPONSE);
    }

    #[tokio::test]
    async fn test_mock_queued_responses() {
        let provider = MockProvider::with_responses(vec![
            "First response".to_string(),
            "Second response".to_string(),
        ])
        .with_default("fallback");

        let resp1 = provider.execute(request("a")).await.unwrap();
        let resp2 = provider.execute(request("b")).await.unwrap();
        let resp3 = provider.execute(request("c")).await.unwrap();

        assert_eq!(resp1.content, "First response");
        assert_eq!(resp2.content, "Second response");
        assert_eq!(resp3.content, "fallback");
    }

    #[tokio::test]
    async fn test_mock_failures() {
        let provider = MockProvider::new();
        provider.queue_failure(429, "Rate limited");
        provider.queue_transport_error("connection refused");

        let err = provider.execute(request("a")).await.unwrap_err();
        assert_eq!(err.status_code(), 429);
        assert_eq!(err.to_string(), "Rate limited");

        let err = provider.execute(request("b")).await.unwrap_err();
        assert!(matches!(err, MoodlightError::Transport(_)));
    }

    #[tokio::test]
    async fn test_mock_records_requests() {
        let provider = MockProvider::new();

        provider.execute(request("First prompt")).await.unwrap();
        provider
            .execute(request("Second prompt").json())
            .await
            .unwrap();

        let requests = provider.get_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].prompt(), "First prompt");
        assert!(requests[1].json_mode);
        assert_eq!(provider.last_request().unwrap().prompt(), "Second prompt");
    }

    #[tokio::test]
    async fn test_mock_token_estimation() {
        let provider = MockProvider::new().with_default("Short");
        let response = provider
            .execute(request("A longer prompt with more tokens"))
            .await
            .unwrap();

        let usage = response.usage.unwrap();
        assert!(usage.prompt_tokens > 0);
        assert_eq!(usage.total_tokens, usage.prompt_tokens + usage.completion_tokens);
    }
}
