//! Text generation behind a small trait, with a Gemini implementation.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};
use shortlist_core::config::LlmConfig;
use tracing::debug;

use crate::error::LlmError;

/// A generative model that answers one prompt with free text.
///
/// Constructed once per process and passed by reference into each run.
pub trait Generator: Send + Sync {
    /// # Errors
    ///
    /// Returns an [`LlmError`] when the model cannot be reached or returns no
    /// usable text.
    fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<GenerateCandidate>,
}

#[derive(Debug, Deserialize)]
struct GenerateCandidate {
    #[serde(default)]
    content: Option<GenerateContent>,
}

#[derive(Debug, Deserialize)]
struct GenerateContent {
    #[serde(default)]
    parts: Vec<GeneratePart>,
}

#[derive(Debug, Deserialize)]
struct GeneratePart {
    #[serde(default)]
    text: Option<String>,
}

/// Gemini `generateContent` client.
pub struct GeminiClient {
    agent: ureq::Agent,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    #[must_use]
    pub fn new(api_key: impl Into<String>, config: &LlmConfig) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build(),
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

fn request_body(prompt: &str, temperature: f32) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": prompt }]
        }],
        "generationConfig": { "temperature": temperature }
    })
}

fn response_text(response: GenerateResponse) -> Result<String, LlmError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        Err(LlmError::EmptyResponse)
    } else {
        Ok(text)
    }
}

impl Generator for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        debug!(model = %self.model, prompt_chars = prompt.len(), "calling generator");
        let response: GenerateResponse = self
            .agent
            .post(&self.endpoint())
            .set("x-goog-api-key", &self.api_key)
            .send_json(request_body(prompt, self.temperature))?
            .into_json()
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;
        response_text(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_carries_prompt_and_temperature() {
        let body = request_body("hello", 0.5);
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["generationConfig"]["temperature"], 0.5);
    }

    #[test]
    fn response_text_joins_parts_of_first_candidate() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [
                {"content": {"parts": [{"text": "{\"a\":"}, {"text": " 1}"}], "role": "model"}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }))
        .expect("response");
        assert_eq!(response_text(response).expect("text"), "{\"a\": 1}");
    }

    #[test]
    fn blank_response_is_an_error() {
        let response: GenerateResponse =
            serde_json::from_value(json!({"candidates": []})).expect("response");
        assert_eq!(response_text(response), Err(LlmError::EmptyResponse));

        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{"finishReason": "SAFETY"}]
        }))
        .expect("response");
        assert_eq!(response_text(response), Err(LlmError::EmptyResponse));
    }

    #[test]
    fn endpoint_uses_configured_model() {
        let config = LlmConfig::default();
        let client = GeminiClient::new("secret-key", &config);
        assert!(client.endpoint().ends_with(&format!("/models/{}:generateContent", config.model)));
        assert!(!format!("{client:?}").contains("secret-key"));
    }

    #[test]
    fn unreachable_service_is_a_transport_error() {
        let config = LlmConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout_secs: 2,
            ..LlmConfig::default()
        };
        let err = GeminiClient::new("key", &config).generate("hi").unwrap_err();
        assert!(matches!(err, LlmError::Transport(_)), "{err:?}");
    }
}
