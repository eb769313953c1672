use chrono::Utc;
use clap::{Parser, Subcommand};
use pdf_chat_core::{
    AnswerGenerator, GeminiEmbedder, GeminiGenerator, IngestionPipeline, LopdfExtractor,
    QaCoordinator, QdrantStore, Retriever, ServiceError, VectorIndex, DEFAULT_COLLECTION,
    DEFAULT_TOP_K,
};
use std::path::Path;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pdf-chat", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Qdrant base URL
    #[arg(long, default_value = "http://localhost:6333")]
    qdrant_url: String,

    /// Vector collection holding the document chunks
    #[arg(long, default_value = DEFAULT_COLLECTION)]
    collection: String,

    /// Google API key for embedding and generation
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    google_api_key: String,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest a PDF so it becomes queryable.
    Ingest {
        /// Path to the PDF file.
        #[arg(long)]
        pdf: String,
    },
    /// Ask a question against the ingested documents.
    Ask {
        /// The question text.
        #[arg(long)]
        question: String,
        /// Number of chunks to ground the answer on.
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,
    },
    /// Delete every stored chunk in the collection.
    Cleanup,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let index = QdrantStore::new(&cli.qdrant_url)?;

    match cli.command {
        Command::Ingest { pdf } => {
            let embedder = GeminiEmbedder::new(&cli.google_api_key)?;
            let pipeline =
                IngestionPipeline::new(LopdfExtractor, embedder, index, &cli.collection);

            info!(pdf = %pdf, collection = %cli.collection, "ingesting document");
            let summary = pipeline.ingest(Path::new(&pdf)).await?;
            println!(
                "{} chunks from {} pages ingested at {}",
                summary.chunk_count,
                summary.page_count,
                Utc::now().to_rfc3339()
            );
        }
        Command::Ask { question, top_k } => {
            let embedder = GeminiEmbedder::new(&cli.google_api_key)?;
            let generator = AnswerGenerator::new(GeminiGenerator::new(&cli.google_api_key)?);
            let retriever = Retriever::new(embedder, index, &cli.collection).with_top_k(top_k);
            let coordinator = QaCoordinator::new(retriever, generator);

            match coordinator.answer(&question).await {
                Ok(answer) => {
                    println!("{}", answer.message);
                    for source in &answer.sources {
                        println!(
                            "  [pages {}-{}] score={:.4}",
                            source.metadata.page_start,
                            source.metadata.page_end,
                            source.score
                        );
                    }
                }
                Err(error) => return Err(user_facing(error)),
            }
        }
        Command::Cleanup => {
            index.delete_namespace(&cli.collection).await?;
            println!("collection {} deleted", cli.collection);
        }
    }

    Ok(())
}

/// Maps the error taxonomy onto messages the user can act on, the same
/// split an HTTP boundary would express as 400/429/503/500.
fn user_facing(error: ServiceError) -> anyhow::Error {
    match &error {
        ServiceError::RateLimited { .. } => {
            anyhow::anyhow!("rate limit exceeded, please try again in a few seconds")
        }
        ServiceError::QuotaExhausted { .. } => {
            anyhow::anyhow!("service temporarily unavailable due to quota limits, try again later")
        }
        ServiceError::InvalidInput(details) => anyhow::anyhow!("invalid input: {details}"),
        _ => anyhow::anyhow!("failed to generate response: {error}"),
    }
}
