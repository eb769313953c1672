use crate::error::{classify_status, ServiceError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 768;
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Turns text into a fixed-dimension vector via an external embedding
/// service. Vectors are comparable only within one model version.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn dimensions(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ServiceError>;

    /// Batched variant used by ingestion; returns one vector per input, in
    /// input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ServiceError>;
}

pub struct GeminiEmbedder {
    endpoint: String,
    api_key: String,
    model: String,
    dimensions: usize,
    timeout: Duration,
    client: Client,
}

impl GeminiEmbedder {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ServiceError> {
        Self::with_endpoint(DEFAULT_GEMINI_ENDPOINT, api_key)
    }

    pub fn with_endpoint(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ServiceError> {
        let endpoint = endpoint.into();
        Url::parse(&endpoint)?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
            timeout: Duration::from_secs(30),
            client: Client::new(),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn content_request(&self, text: &str) -> Value {
        json!({
            "model": format!("models/{}", self.model),
            "content": { "parts": [{ "text": text }] },
        })
    }

    async fn post(&self, url: String, body: Value) -> Result<Value, ServiceError> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status("embedding", status, &body));
        }

        Ok(response.json().await?)
    }

    fn vector_from(&self, values: Option<&Value>) -> Result<Vec<f32>, ServiceError> {
        let vector: Vec<f32> = values
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_f64)
                    .map(|value| value as f32)
                    .collect()
            })
            .unwrap_or_default();

        if vector.is_empty() {
            return Err(ServiceError::BackendResponse {
                backend: "embedding",
                details: "response carried no embedding values".to_string(),
            });
        }

        Ok(vector)
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ServiceError> {
        if text.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "cannot embed empty text".to_string(),
            ));
        }

        let url = format!(
            "{}/v1beta/models/{}:embedContent",
            self.endpoint, self.model
        );
        let parsed = self.post(url, self.content_request(text)).await?;
        self.vector_from(parsed.pointer("/embedding/values"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ServiceError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(position) = texts.iter().position(|text| text.trim().is_empty()) {
            return Err(ServiceError::InvalidInput(format!(
                "cannot embed empty text at position {position}"
            )));
        }

        let url = format!(
            "{}/v1beta/models/{}:batchEmbedContents",
            self.endpoint, self.model
        );
        let requests: Vec<Value> = texts
            .iter()
            .map(|text| self.content_request(text))
            .collect();
        let parsed = self.post(url, json!({ "requests": requests })).await?;

        let embeddings = parsed
            .pointer("/embeddings")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        if embeddings.len() != texts.len() {
            return Err(ServiceError::BackendResponse {
                backend: "embedding",
                details: format!(
                    "requested {} embeddings, got {}",
                    texts.len(),
                    embeddings.len()
                ),
            });
        }

        embeddings
            .iter()
            .map(|entry| self.vector_from(entry.pointer("/values")))
            .collect()
    }
}
