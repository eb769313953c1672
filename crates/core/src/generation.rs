use crate::embeddings::DEFAULT_GEMINI_ENDPOINT;
use crate::error::{classify_status, ServiceError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

pub const DEFAULT_GENERATION_MODEL: &str = "gemini-2.5-flash";

/// Returned when the model call succeeded but the response carried no
/// readable text; degrading beats failing a call that already cost a trip.
pub const NO_RESPONSE_PLACEHOLDER: &str = "No response generated.";

/// Sampling knobs for the generative model. Temperature is fixed rather
/// than derived: 0.7 trades a little determinism for fluency.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_GENERATION_MODEL.to_string(),
            temperature: 0.7,
            max_output_tokens: 1_024,
        }
    }
}

/// Single-shot completion against an external generative model. Retry
/// policy lives with the caller, not here.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ServiceError>;
}

pub struct GeminiGenerator {
    endpoint: String,
    api_key: String,
    config: GenerationConfig,
    timeout: Duration,
    client: Client,
}

impl GeminiGenerator {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ServiceError> {
        Self::with_endpoint(DEFAULT_GEMINI_ENDPOINT, api_key, GenerationConfig::default())
    }

    pub fn with_endpoint(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        config: GenerationConfig,
    ) -> Result<Self, ServiceError> {
        let endpoint = endpoint.into();
        Url::parse(&endpoint)?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            config,
            timeout: Duration::from_secs(60),
            client: Client::new(),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl GenerativeModel for GeminiGenerator {
    async fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.config.model
        );

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .timeout(self.timeout)
            .json(&json!({
                "contents": [{ "parts": [{ "text": prompt }] }],
                "generationConfig": {
                    "temperature": self.config.temperature,
                    "maxOutputTokens": self.config.max_output_tokens,
                },
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status("gemini", status, &body));
        }

        let parsed: Value = response.json().await?;
        Ok(extract_response_text(&parsed)
            .unwrap_or_else(|| NO_RESPONSE_PLACEHOLDER.to_string()))
    }
}

/// Pulls the text out of a generateContent response, joining the parts of
/// the first candidate. `None` when there is nothing readable.
pub fn extract_response_text(response: &Value) -> Option<String> {
    let parts = response
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)?;

    let text = parts
        .iter()
        .filter_map(|part| part.pointer("/text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("");

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_text_from_a_well_formed_response() {
        let response = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Paris is " }, { "text": "the capital." }] }
            }]
        });
        assert_eq!(
            extract_response_text(&response).as_deref(),
            Some("Paris is the capital.")
        );
    }

    #[test]
    fn missing_candidates_yield_none() {
        assert!(extract_response_text(&json!({})).is_none());
        assert!(extract_response_text(&json!({ "candidates": [] })).is_none());
    }

    #[test]
    fn whitespace_only_text_yields_none() {
        let response = json!({
            "candidates": [{ "content": { "parts": [{ "text": "  \n " }] } }]
        });
        assert!(extract_response_text(&response).is_none());
    }
}
