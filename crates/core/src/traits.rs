use crate::error::ServiceError;
use crate::models::{RetrievedChunk, VectorRecord};
use async_trait::async_trait;

/// Read/write contract of the vector database. Collections are named
/// logical partitions; dimensionality is bound on first write.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Writes all records, creating the collection on first use. Not
    /// idempotent: re-ingesting the same document appends duplicates.
    async fn upsert(
        &self,
        collection: &str,
        records: &[VectorRecord],
    ) -> Result<(), ServiceError>;

    /// Up to `k` nearest records by descending similarity. A collection
    /// that was never created yields an empty result, not an error.
    async fn search(
        &self,
        collection: &str,
        query_vector: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievedChunk>, ServiceError>;

    /// Drops every record under the partition; a no-op when the partition
    /// does not exist.
    async fn delete_namespace(&self, collection: &str) -> Result<(), ServiceError>;
}
