use crate::error::{classify_status, ServiceError};
use crate::models::{ChunkMetadata, RetrievedChunk, VectorRecord};
use crate::traits::VectorIndex;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;
use url::Url;

pub struct QdrantStore {
    endpoint: String,
    timeout: Duration,
    client: Client,
}

impl QdrantStore {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, ServiceError> {
        let endpoint = endpoint.into();
        Url::parse(&endpoint)?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(30),
            client: Client::new(),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Creates the collection when absent, binding its dimensionality to
    /// the first batch ever written.
    async fn ensure_collection(
        &self,
        collection: &str,
        vector_size: usize,
    ) -> Result<(), ServiceError> {
        let response = self
            .client
            .get(format!("{}/collections/{}", self.endpoint, collection))
            .timeout(self.timeout)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(());
        }
        if response.status() != StatusCode::NOT_FOUND {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status("qdrant", status, &body));
        }

        debug!(collection, vector_size, "creating qdrant collection");
        let response = self
            .client
            .put(format!("{}/collections/{}", self.endpoint, collection))
            .timeout(self.timeout)
            .json(&json!({
                "vectors": { "size": vector_size, "distance": "Cosine" },
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status("qdrant", status, &body));
        }

        Ok(())
    }
}

#[async_trait]
impl VectorIndex for QdrantStore {
    async fn upsert(
        &self,
        collection: &str,
        records: &[VectorRecord],
    ) -> Result<(), ServiceError> {
        let Some(first) = records.first() else {
            return Ok(());
        };

        let vector_size = first.embedding.len();
        for record in records {
            if record.embedding.len() != vector_size {
                return Err(ServiceError::InvalidInput(format!(
                    "embedding dimension {} != {} within one batch",
                    record.embedding.len(),
                    vector_size
                )));
            }
        }

        self.ensure_collection(collection, vector_size).await?;

        let points = records
            .iter()
            .map(|record| {
                Ok(json!({
                    "id": record.id,
                    "vector": record.embedding,
                    "payload": {
                        "text": record.text,
                        "metadata": serde_json::to_value(&record.metadata)?,
                    },
                }))
            })
            .collect::<Result<Vec<_>, ServiceError>>()?;

        let response = self
            .client
            .put(format!(
                "{}/collections/{}/points?wait=true",
                self.endpoint, collection
            ))
            .timeout(self.timeout)
            .json(&json!({ "points": points }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status("qdrant", status, &body));
        }

        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        query_vector: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievedChunk>, ServiceError> {
        let response = self
            .client
            .post(format!(
                "{}/collections/{}/points/search",
                self.endpoint, collection
            ))
            .timeout(self.timeout)
            .json(&json!({
                "vector": query_vector,
                "limit": k,
                "with_payload": true,
            }))
            .send()
            .await?;

        // A collection nobody wrote to yet legitimately does not exist.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status("qdrant", status, &body));
        }

        let parsed: Value = response.json().await?;
        let hits = parsed
            .pointer("/result")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut result = Vec::new();
        for hit in hits {
            let text = hit
                .pointer("/payload/text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let score = hit.pointer("/score").and_then(Value::as_f64).unwrap_or(0.0);
            let metadata: ChunkMetadata = hit
                .pointer("/payload/metadata")
                .cloned()
                .and_then(|value| serde_json::from_value(value).ok())
                .unwrap_or_default();

            result.push(RetrievedChunk {
                text,
                score,
                metadata,
            });
        }

        Ok(result)
    }

    async fn delete_namespace(&self, collection: &str) -> Result<(), ServiceError> {
        let response = self
            .client
            .delete(format!("{}/collections/{}", self.endpoint, collection))
            .timeout(self.timeout)
            .send()
            .await?;

        // Deleting a partition that never existed is a no-op.
        if response.status() == StatusCode::NOT_FOUND || response.status().is_success() {
            return Ok(());
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(classify_status("qdrant", status, &body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VectorRecord;
    use uuid::Uuid;

    #[test]
    fn bad_endpoint_is_rejected() {
        assert!(QdrantStore::new("::not-a-url::").is_err());
    }

    #[tokio::test]
    async fn empty_upsert_never_touches_the_network() {
        let store = QdrantStore::new("http://localhost:1").unwrap();
        store.upsert("anything", &[]).await.unwrap();
    }

    #[tokio::test]
    async fn mixed_dimensions_in_one_batch_are_rejected_locally() {
        let store = QdrantStore::new("http://localhost:1").unwrap();
        let records = vec![
            VectorRecord {
                id: Uuid::nil(),
                embedding: vec![0.0; 4],
                text: "a".to_string(),
                metadata: Default::default(),
            },
            VectorRecord {
                id: Uuid::nil(),
                embedding: vec![0.0; 8],
                text: "b".to_string(),
                metadata: Default::default(),
            },
        ];

        let result = store.upsert("c", &records).await;
        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
    }
}
