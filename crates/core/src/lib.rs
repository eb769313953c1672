pub mod answer;
pub mod chunking;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod generation;
pub mod ingest;
pub mod models;
pub mod orchestrator;
pub mod retriever;
pub mod stores;
pub mod traits;

pub use answer::{build_prompt, AnswerGenerator, RetryPolicy, CONTEXT_SEPARATOR, FALLBACK_ANSWER};
pub use chunking::{chunk_id, split_pages, ChunkingConfig};
pub use embeddings::{
    Embedder, GeminiEmbedder, DEFAULT_EMBEDDING_DIMENSIONS, DEFAULT_EMBEDDING_MODEL,
    DEFAULT_GEMINI_ENDPOINT,
};
pub use error::{IngestError, ServiceError};
pub use extractor::{LopdfExtractor, PageText, PdfExtractor};
pub use generation::{
    extract_response_text, GeminiGenerator, GenerationConfig, GenerativeModel,
    DEFAULT_GENERATION_MODEL, NO_RESPONSE_PLACEHOLDER,
};
pub use ingest::IngestionPipeline;
pub use models::{
    Answer, Chunk, ChunkMetadata, IngestionSummary, RetrievedChunk, VectorRecord,
    DEFAULT_COLLECTION,
};
pub use orchestrator::QaCoordinator;
pub use retriever::{Retriever, DEFAULT_TOP_K};
pub use stores::QdrantStore;
pub use traits::VectorIndex;
