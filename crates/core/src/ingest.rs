use crate::chunking::{split_pages, ChunkingConfig};
use crate::embeddings::Embedder;
use crate::error::IngestError;
use crate::extractor::PdfExtractor;
use crate::models::{IngestionSummary, VectorRecord};
use crate::traits::VectorIndex;
use std::path::Path;
use tracing::info;

/// Document -> chunks -> embeddings -> index write, one shot per upload.
///
/// All-or-nothing from the caller's point of view: any service failure
/// surfaces before the document is considered queryable. Re-ingesting the
/// same document appends duplicate records; deduplication is the caller's
/// call (delete the collection first, or live with duplicates).
pub struct IngestionPipeline<X, E, V> {
    extractor: X,
    embedder: E,
    index: V,
    collection: String,
    chunking: ChunkingConfig,
}

impl<X, E, V> IngestionPipeline<X, E, V>
where
    X: PdfExtractor,
    E: Embedder,
    V: VectorIndex,
{
    pub fn new(extractor: X, embedder: E, index: V, collection: impl Into<String>) -> Self {
        Self {
            extractor,
            embedder,
            index,
            collection: collection.into(),
            chunking: ChunkingConfig::default(),
        }
    }

    pub fn with_chunking(mut self, chunking: ChunkingConfig) -> Self {
        self.chunking = chunking;
        self
    }

    /// Ingests one document. A readable PDF with zero extractable text
    /// completes cleanly with a zero-chunk summary; an unreadable file
    /// fails. The index write is issued only after every embedding is in
    /// hand, so chunk order is preserved end to end.
    pub async fn ingest(&self, path: &Path) -> Result<IngestionSummary, IngestError> {
        if path.as_os_str().is_empty() {
            return Err(IngestError::InvalidArgument(
                "no pdf path provided for ingestion".to_string(),
            ));
        }

        let source_title = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("untitled.pdf")
            .to_string();

        let pages = self.extractor.extract_pages(path)?;
        let chunks = split_pages(&pages, self.chunking)?;

        if chunks.is_empty() {
            info!(source = %source_title, "document had no extractable text, nothing stored");
            return Ok(IngestionSummary {
                page_count: pages.len(),
                chunk_count: 0,
            });
        }

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(IngestError::Service(
                crate::error::ServiceError::BackendResponse {
                    backend: "embedding",
                    details: format!(
                        "embedding count {} does not match chunk count {}",
                        embeddings.len(),
                        chunks.len()
                    ),
                },
            ));
        }

        let records: Vec<VectorRecord> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| VectorRecord::from_chunk(chunk, embedding, &source_title))
            .collect();

        self.index.upsert(&self.collection, &records).await?;

        info!(
            source = %source_title,
            collection = %self.collection,
            page_count = pages.len(),
            chunk_count = records.len(),
            "document ingested"
        );

        Ok(IngestionSummary {
            page_count: pages.len(),
            chunk_count: records.len(),
        })
    }
}
