//! # Upstream Request Orchestration
//!
//! One `/generate` call end to end:
//!
//! 1. Validate `model` and `prompt`
//! 2. Build messages: optional system prompt, optional Seoul weather context,
//!    then the user prompt
//! 3. Call the provider once, with JSON mode when the provider supports it
//! 4. Normalize the completion; if it is not a JSON object, make exactly one
//!    repair call (keys of the schema the system prompt asks for) and
//!    normalize that instead
//!
//! Upstream failures of the main call propagate; weather and repair
//! failures are swallowed.

use crate::error::{MoodlightError, Result};
use crate::normalize::{Normalizer, SchemaVariant};
use crate::provider::{PromptRequest, Provider, TokenUsage};
use crate::util::{lenient_string, lenient_text};
use crate::weather::{wants_seoul_weather, WeatherClient};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GenerateRequest {
    #[serde(deserialize_with = "lenient_text")]
    pub model: String,
    #[serde(deserialize_with = "lenient_string")]
    pub system: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateResponse {
    pub output: String,
    pub usage: Option<TokenUsage>,
    /// Upstream response body of the main call
    pub raw: Value,
}

#[derive(Clone)]
pub struct Generator {
    provider: Arc<dyn Provider>,
    normalizer: Arc<Normalizer>,
    weather: Option<WeatherClient>,
}

impl Generator {
    pub fn new(provider: Arc<dyn Provider>, normalizer: Arc<Normalizer>) -> Self {
        Self {
            provider,
            normalizer,
            weather: None,
        }
    }

    /// Enable weather context for prompts asking about Seoul weather
    pub fn with_weather(mut self, weather: WeatherClient) -> Self {
        self.weather = Some(weather);
        self
    }

    pub async fn generate(&self, req: &GenerateRequest) -> Result<GenerateResponse> {
        if req.model.is_empty() || req.prompt.is_empty() {
            return Err(MoodlightError::bad_request(
                r#"Both "model" and "prompt" fields are required"#,
            ));
        }

        let mut request = self.request(&req.model);
        if let Some(system) = req.system.as_deref().filter(|s| !s.is_empty()) {
            request = request.with_system_prompt(system);
        }
        if let Some(context) = self.weather_context(&req.prompt).await {
            request = request.with_system_prompt(context);
        }
        let request = request.with_user_prompt(&req.prompt);

        tracing::info!(
            provider = self.provider.name(),
            model = %req.model,
            "Generating environment"
        );
        let response = self.provider.execute(request).await?;

        let output = match self.normalizer.normalize_text(&response.content, &req.prompt) {
            Some(normalized) if normalized.repaired => normalized.to_pretty_json(),
            Some(_) => response.content.clone(),
            None => {
                let variant = SchemaVariant::detect_from_text(req.system.as_deref().unwrap_or(""));
                self.repair(&req.model, variant, &response.content, &req.prompt)
                    .await
                    .unwrap_or_else(|| response.content.clone())
            }
        };

        Ok(GenerateResponse {
            output,
            usage: response.usage,
            raw: response.raw,
        })
    }

    fn request(&self, model: &str) -> PromptRequest {
        let request = PromptRequest::new(model);
        if self.provider.capabilities().json_mode {
            request.json()
        } else {
            request
        }
    }

    async fn weather_context(&self, prompt: &str) -> Option<String> {
        let weather = self.weather.as_ref()?;
        if !wants_seoul_weather(prompt) {
            return None;
        }
        match weather.current().await {
            Ok(report) => Some(report.context_line()),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping weather context");
                None
            }
        }
    }

    /// Single reformatting round-trip; `None` if it fails in any way.
    async fn repair(
        &self,
        model: &str,
        variant: SchemaVariant,
        output: &str,
        prompt: &str,
    ) -> Option<String> {
        tracing::info!(model = %model, variant = ?variant, "Completion is not JSON, requesting repair");

        let request = self
            .request(model)
            .with_system_prompt(repair_instructions(variant))
            .with_user_prompt(
                serde_json::json!({
                    "current_output": output,
                    "allowed": self.normalizer.allowed_values(),
                })
                .to_string(),
            );

        let response = match self.provider.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Repair request failed");
                return None;
            }
        };

        let normalized = self.normalizer.normalize_text(&response.content, prompt);
        if normalized.is_none() {
            tracing::warn!("Repair response is still not JSON");
        }
        normalized.map(|n| n.to_pretty_json())
    }
}

fn repair_instructions(variant: SchemaVariant) -> String {
    format!(
        "You repair assistant outputs into strict JSON with keys: {}. \
         Use only allowed values. No extra fields or narration.",
        variant.repair_keys().join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets;
    use crate::provider::{MockProvider, Role};
    use serde_json::json;

    fn generator(mock: &Arc<MockProvider>) -> Generator {
        Generator::new(mock.clone(), Arc::new(Normalizer::default()))
    }

    fn request(prompt: &str) -> GenerateRequest {
        GenerateRequest {
            model: "gpt-4o-mini".into(),
            system: Some("SYSTEM".into()),
            prompt: prompt.into(),
        }
    }

    #[tokio::test]
    async fn test_requires_model_and_prompt() {
        let mock = Arc::new(MockProvider::new());
        let generator = generator(&mock);

        let err = generator
            .generate(&GenerateRequest {
                model: "m".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), r#"Both "model" and "prompt" fields are required"#);
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_messages_and_json_mode() {
        let mock = Arc::new(MockProvider::new());
        generator(&mock).generate(&request("hi")).await.unwrap();

        let sent = mock.last_request().unwrap();
        assert!(sent.json_mode);
        assert_eq!(sent.model, "gpt-4o-mini");
        assert_eq!(sent.messages.len(), 2);
        assert_eq!(sent.messages[0].role, Role::System);
        assert_eq!(sent.messages[0].content, "SYSTEM");
        assert_eq!(sent.messages[1].content, "hi");
    }

    #[tokio::test]
    async fn test_json_mode_follows_provider_capabilities() {
        let mock = Arc::new(MockProvider::with_responses(vec!["plain".into()]).without_json_mode());
        generator(&mock).generate(&request("hi")).await.unwrap();

        let requests = mock.get_requests();
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| !r.json_mode));
    }

    #[tokio::test]
    async fn test_empty_system_is_skipped() {
        let mock = Arc::new(MockProvider::new());
        let mut req = request("hi");
        req.system = Some(String::new());
        generator(&mock).generate(&req).await.unwrap();

        assert_eq!(mock.last_request().unwrap().messages.len(), 1);
    }

    #[tokio::test]
    async fn test_repaired_output_is_pretty_printed() {
        let mock = Arc::new(MockProvider::with_responses(vec![
            r#"{"emotion":"피로","hex":"756FB5"}"#.into(),
        ]));
        let out = generator(&mock).generate(&request("오늘 하루")).await.unwrap();

        assert!(out.output.contains('\n'));
        let payload: Value = serde_json::from_str(&out.output).unwrap();
        assert_eq!(payload["temperature_celsius"], json!(25.5));
        assert_eq!(payload["humidity_percent"], json!(37.5));
        assert!(out.usage.is_some());
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test]
    async fn test_complete_output_passes_through() {
        let normalizer = Normalizer::default();
        let first = normalizer.normalize_value(&json!({"emotion": "기쁨"}), "hello");
        let text = first.payload.to_string();

        let mock = Arc::new(MockProvider::with_responses(vec![text.clone()]));
        let out = generator(&mock).generate(&request("hello")).await.unwrap();
        assert_eq!(out.output, text);
    }

    #[tokio::test]
    async fn test_non_json_triggers_one_repair() {
        let mock = Arc::new(MockProvider::with_responses(vec![
            "I feel calm today".into(),
            r#"{"emotion":"평온","hex":"D4E25B"}"#.into(),
        ]));
        let out = generator(&mock).generate(&request("hello")).await.unwrap();

        let payload: Value = serde_json::from_str(&out.output).unwrap();
        assert_eq!(payload["temperature_celsius"], json!(26));

        let requests = mock.get_requests();
        assert_eq!(requests.len(), 2);
        let repair = &requests[1];
        assert!(repair.json_mode);
        assert!(repair.messages[0].content.contains("strict JSON"));
        let body: Value = serde_json::from_str(repair.prompt()).unwrap();
        assert_eq!(body["current_output"], "I feel calm today");
        assert!(body["allowed"]["music"].is_array());
        // usage and raw come from the first call
        assert_eq!(out.raw["choices"][0]["message"]["content"], "I feel calm today");
    }

    #[tokio::test]
    async fn test_repair_uses_lighting_keys_for_lighting_preset() {
        let mock = Arc::new(MockProvider::with_responses(vec![
            "calm, warm light".into(),
            r#"{"emotion":"평온","hex":"D4E25B","lighting_mode":"rgb"}"#.into(),
        ]));
        let mut req = request("hello");
        req.system = Some(presets::find("lighting").unwrap().text.to_string());

        let out = generator(&mock).generate(&req).await.unwrap();

        let repair = &mock.get_requests()[1];
        let instructions = &repair.messages[0].content;
        assert!(instructions.contains("lighting_mode"));
        assert!(instructions.contains("lighting_brightness_254"));
        assert!(instructions.contains("lighting_color_temp"));

        let payload: Value = serde_json::from_str(&out.output).unwrap();
        assert_eq!(payload["lighting_mode"], "rgb");
        assert!(payload["lighting_hue"].is_number());
    }

    #[tokio::test]
    async fn test_repair_defaults_to_quadrant_keys() {
        let mock = Arc::new(MockProvider::with_responses(vec!["words".into()]));
        let mut req = request("hello");
        req.system = None;
        generator(&mock).generate(&req).await.unwrap();

        let instructions = &mock.get_requests()[1].messages[0].content;
        assert!(instructions.contains("lighting_temp_k"));
        assert!(!instructions.contains("lighting_mode"));
    }

    #[tokio::test]
    async fn test_failed_repair_keeps_raw_text() {
        let mock = Arc::new(MockProvider::with_responses(vec!["not json".into()]));
        mock.queue_failure(500, "boom");
        let out = generator(&mock).generate(&request("hello")).await.unwrap();

        assert_eq!(out.output, "not json");
        assert_eq!(mock.request_count(), 2);
    }

    #[tokio::test]
    async fn test_unparsable_repair_keeps_raw_text() {
        let mock = Arc::new(MockProvider::with_responses(vec![
            "not json".into(),
            "still not json".into(),
        ]));
        let out = generator(&mock).generate(&request("hello")).await.unwrap();

        assert_eq!(out.output, "not json");
        assert_eq!(mock.request_count(), 2);
    }

    #[tokio::test]
    async fn test_upstream_error_propagates() {
        let mock = Arc::new(MockProvider::new());
        mock.queue_failure(401, "Incorrect API key provided");
        let err = generator(&mock).generate(&request("hello")).await.unwrap_err();

        assert_eq!(err.status_code(), 401);
        assert_eq!(err.to_string(), "Incorrect API key provided");
        assert_eq!(mock.request_count(), 1);
    }

    #[test]
    fn test_repair_instructions_list_keys() {
        let text = repair_instructions(SchemaVariant::Quadrant);
        assert!(text.contains("temperature_celsius"));
        assert!(text.contains("music_title"));
        assert!(text.ends_with("No extra fields or narration."));
    }
}
