use crate::answer::{AnswerGenerator, FALLBACK_ANSWER};
use crate::embeddings::Embedder;
use crate::error::ServiceError;
use crate::generation::GenerativeModel;
use crate::models::Answer;
use crate::retriever::Retriever;
use crate::traits::VectorIndex;
use tracing::debug;

/// The per-question flow: retrieve grounding chunks, then generate.
///
/// When retrieval comes back empty the coordinator answers with the fixed
/// fallback sentence and never touches the model, so a question asked
/// before any document exists gets a deterministic response.
pub struct QaCoordinator<E, V, M> {
    retriever: Retriever<E, V>,
    generator: AnswerGenerator<M>,
}

impl<E, V, M> QaCoordinator<E, V, M>
where
    E: Embedder,
    V: VectorIndex,
    M: GenerativeModel,
{
    pub fn new(retriever: Retriever<E, V>, generator: AnswerGenerator<M>) -> Self {
        Self {
            retriever,
            generator,
        }
    }

    pub async fn answer(&self, question: &str) -> Result<Answer, ServiceError> {
        let hits = self.retriever.retrieve(question).await?;

        if hits.is_empty() {
            debug!("no grounding context, returning fallback answer");
            return Ok(Answer {
                message: FALLBACK_ANSWER.to_string(),
                sources: Vec::new(),
            });
        }

        self.generator.generate(question, hits).await
    }
}
