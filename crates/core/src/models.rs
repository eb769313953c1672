use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default collection the ingestion pipeline and retriever operate on.
pub const DEFAULT_COLLECTION: &str = "ai_pdf_vectors";

/// A contiguous slice of concatenated document text, the unit of embedding
/// and storage. Identity is derived from content and position, not assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub chunk_id: String,
    pub chunk_index: u64,
    pub text: String,
    pub page_start: u32,
    pub page_end: u32,
    pub char_start: usize,
    pub char_end: usize,
}

/// Payload stored alongside each vector and returned unchanged on search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source_title: String,
    pub page_start: u32,
    pub page_end: u32,
    pub chunk_index: u64,
    pub char_start: usize,
    pub char_end: usize,
    #[serde(default)]
    pub ingested_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub id: Uuid,
    pub embedding: Vec<f32>,
    pub text: String,
    pub metadata: ChunkMetadata,
}

impl VectorRecord {
    pub fn from_chunk(chunk: &Chunk, embedding: Vec<f32>, source_title: &str) -> Self {
        Self {
            id: point_id(&chunk.chunk_id),
            embedding,
            text: chunk.text.clone(),
            metadata: ChunkMetadata {
                source_title: source_title.to_string(),
                page_start: chunk.page_start,
                page_end: chunk.page_end,
                chunk_index: chunk.chunk_index,
                char_start: chunk.char_start,
                char_end: chunk.char_end,
                ingested_at: Some(Utc::now()),
            },
        }
    }
}

/// Qdrant point ids must be UUIDs or integers; fold the first half of the
/// hex chunk digest into a UUID so the id stays content-derived.
fn point_id(chunk_id: &str) -> Uuid {
    let head = chunk_id.get(..32).unwrap_or(chunk_id);
    u128::from_str_radix(head, 16)
        .map(Uuid::from_u128)
        .unwrap_or_else(|_| Uuid::new_v5(&Uuid::NAMESPACE_OID, chunk_id.as_bytes()))
}

/// One ranked search hit: chunk text, similarity score, opaque payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub text: String,
    pub score: f64,
    pub metadata: ChunkMetadata,
}

/// Assistant response plus the retrieval hits that grounded it, so the
/// caller can show provenance. Produced once at the generator boundary.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub message: String,
    pub sources: Vec<RetrievedChunk>,
}

/// What a completed ingestion wrote, reported to the caller.
#[derive(Debug, Clone, Copy)]
pub struct IngestionSummary {
    pub page_count: usize,
    pub chunk_count: usize,
}
