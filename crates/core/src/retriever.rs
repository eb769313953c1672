use crate::embeddings::Embedder;
use crate::error::ServiceError;
use crate::models::RetrievedChunk;
use crate::traits::VectorIndex;
use tracing::debug;

pub const DEFAULT_TOP_K: usize = 5;

/// Embeds a question and pulls the closest chunks out of the index. An
/// empty hit list is a normal outcome, not an error; callers branch on it.
pub struct Retriever<E, V> {
    embedder: E,
    index: V,
    collection: String,
    top_k: usize,
}

impl<E, V> Retriever<E, V>
where
    E: Embedder,
    V: VectorIndex,
{
    pub fn new(embedder: E, index: V, collection: impl Into<String>) -> Self {
        Self {
            embedder,
            index,
            collection: collection.into(),
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub async fn retrieve(&self, question: &str) -> Result<Vec<RetrievedChunk>, ServiceError> {
        if question.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "question is required".to_string(),
            ));
        }

        let query_vector = self.embedder.embed(question).await?;
        let hits = self
            .index
            .search(&self.collection, &query_vector, self.top_k)
            .await?;

        debug!(
            collection = %self.collection,
            hit_count = hits.len(),
            "retrieval complete"
        );
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VectorRecord;
    use async_trait::async_trait;

    struct FixedEmbedder;

    #[async_trait]
    impl Embedder for FixedEmbedder {
        fn dimensions(&self) -> usize {
            3
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>, ServiceError> {
            Ok(vec![1.0, 0.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ServiceError> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0, 0.0]).collect())
        }
    }

    struct EmptyIndex;

    #[async_trait]
    impl VectorIndex for EmptyIndex {
        async fn upsert(
            &self,
            _collection: &str,
            _records: &[VectorRecord],
        ) -> Result<(), ServiceError> {
            Ok(())
        }

        async fn search(
            &self,
            _collection: &str,
            _query_vector: &[f32],
            _k: usize,
        ) -> Result<Vec<RetrievedChunk>, ServiceError> {
            Ok(Vec::new())
        }

        async fn delete_namespace(&self, _collection: &str) -> Result<(), ServiceError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn blank_question_is_invalid_input() {
        let retriever = Retriever::new(FixedEmbedder, EmptyIndex, "docs");
        let result = retriever.retrieve("  \n ").await;
        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn empty_collection_yields_empty_hits_not_an_error() {
        let retriever = Retriever::new(FixedEmbedder, EmptyIndex, "docs");
        let hits = retriever.retrieve("anything at all?").await.unwrap();
        assert!(hits.is_empty());
    }
}
