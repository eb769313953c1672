use crate::error::ServiceError;
use crate::generation::GenerativeModel;
use crate::models::{Answer, RetrievedChunk};
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// The sentence the model must emit verbatim when the context has no
/// answer; also what the coordinator returns when retrieval is empty.
pub const FALLBACK_ANSWER: &str = "I could not find the answer in the provided document.";

/// Separator between ranked chunks in the grounding context, so the model
/// can tell where one source ends and the next begins.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Exponential backoff for transient generation failures: the delay doubles
/// per attempt and is capped. `max_attempts` of 1 disables retries.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1_000),
            max_delay: Duration::from_millis(10_000),
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let doubled = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt));
        doubled.min(self.max_delay)
    }
}

/// Builds the grounding prompt: fixed instructions, the verbatim fallback
/// sentence, the literal question, and the ranked chunks.
pub fn build_prompt(question: &str, context: &[RetrievedChunk]) -> String {
    let context_text = context
        .iter()
        .map(|chunk| chunk.text.as_str())
        .filter(|text| !text.trim().is_empty())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR);

    format!(
        "You are a document-based assistant.\n\
         You will answer ONLY using the document context.\n\
         \n\
         If the user asks something too broad (like \"sorting\", \"unit 2\", \"syllabus\"),\n\
         you MUST summarize the most relevant content from the document context.\n\
         \n\
         If the answer is not directly mentioned, reply exactly:\n\
         \"{FALLBACK_ANSWER}\"\n\
         \n\
         Question: {question}\n\
         \n\
         Context:\n\
         {context_text}\n"
    )
}

/// Wraps a generative model with prompt assembly and the retry policy.
pub struct AnswerGenerator<M> {
    model: M,
    retry: RetryPolicy,
}

impl<M> AnswerGenerator<M>
where
    M: GenerativeModel,
{
    pub fn new(model: M) -> Self {
        Self {
            model,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Answers the question from the supplied ranked context. Retries only
    /// transient failures; anything else propagates on first sight.
    pub async fn generate(
        &self,
        question: &str,
        context: Vec<RetrievedChunk>,
    ) -> Result<Answer, ServiceError> {
        let prompt = build_prompt(question, &context);
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0u32;

        loop {
            match self.model.complete(&prompt).await {
                Ok(message) => {
                    return Ok(Answer {
                        message,
                        sources: context,
                    })
                }
                Err(error) if error.is_retryable() && attempt + 1 < max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        %error,
                        "generation rate limited, backing off"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChunkMetadata;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn chunk(text: &str) -> RetrievedChunk {
        RetrievedChunk {
            text: text.to_string(),
            score: 0.9,
            metadata: ChunkMetadata::default(),
        }
    }

    /// Fails with a rate limit the first `failures` calls, then succeeds.
    struct FlakyModel {
        failures: u32,
        calls: AtomicU32,
    }

    impl FlakyModel {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl GenerativeModel for FlakyModel {
        async fn complete(&self, _prompt: &str) -> Result<String, ServiceError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(ServiceError::RateLimited {
                    service: "fake",
                    details: "try later".to_string(),
                })
            } else {
                Ok("recovered".to_string())
            }
        }
    }

    struct BrokenModel;

    #[async_trait]
    impl GenerativeModel for BrokenModel {
        async fn complete(&self, _prompt: &str) -> Result<String, ServiceError> {
            Err(ServiceError::InvalidInput("malformed prompt".to_string()))
        }
    }

    fn fast_retry(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(8),
        }
    }

    #[test]
    fn prompt_always_contains_fallback_and_question_verbatim() {
        let question = "What is the capital of France?";
        for context in [vec![], vec![chunk("Paris facts"), chunk("More facts")]] {
            let prompt = build_prompt(question, &context);
            assert!(prompt.contains(FALLBACK_ANSWER));
            assert!(prompt.contains(question));
        }
    }

    #[test]
    fn prompt_separates_chunks_in_ranked_order() {
        let prompt = build_prompt("q", &[chunk("first"), chunk("second")]);
        let first = prompt.find("first").unwrap();
        let second = prompt.find("second").unwrap();
        assert!(first < second);
        assert!(prompt.contains(CONTEXT_SEPARATOR));
    }

    #[test]
    fn backoff_delays_double_and_cap() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(1_000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(2_000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(4_000));
        assert_eq!(policy.delay_for(5), Duration::from_millis(10_000));
        assert_eq!(policy.delay_for(30), Duration::from_millis(10_000));

        let delays: Vec<_> = (0..8).map(|attempt| policy.delay_for(attempt)).collect();
        assert!(delays.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[tokio::test]
    async fn recovers_within_the_attempt_limit() {
        let model = FlakyModel::new(2);
        let generator = AnswerGenerator::new(model).with_retry(fast_retry(3));

        let answer = generator.generate("q", vec![chunk("ctx")]).await.unwrap();
        assert_eq!(answer.message, "recovered");
        assert_eq!(answer.sources.len(), 1);
        assert_eq!(generator.model.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_retries_propagate_the_rate_limit() {
        let model = FlakyModel::new(10);
        let generator = AnswerGenerator::new(model).with_retry(fast_retry(3));

        let result = generator.generate("q", vec![chunk("ctx")]).await;
        assert!(matches!(result, Err(ServiceError::RateLimited { .. })));
        assert_eq!(generator.model.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_transient_errors_are_never_retried() {
        let generator = AnswerGenerator::new(BrokenModel).with_retry(fast_retry(5));
        let result = generator.generate("q", vec![chunk("ctx")]).await;
        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn quota_exhaustion_is_not_retried() {
        struct QuotaModel {
            calls: AtomicU32,
        }

        #[async_trait]
        impl GenerativeModel for QuotaModel {
            async fn complete(&self, _prompt: &str) -> Result<String, ServiceError> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                Err(ServiceError::QuotaExhausted {
                    service: "fake",
                    details: "quota exceeded".to_string(),
                })
            }
        }

        let model = QuotaModel {
            calls: AtomicU32::new(0),
        };
        let generator = AnswerGenerator::new(model).with_retry(fast_retry(5));

        let result = generator.generate("q", vec![chunk("ctx")]).await;
        assert!(matches!(result, Err(ServiceError::QuotaExhausted { .. })));
        assert_eq!(generator.model.calls.load(Ordering::SeqCst), 1);
    }
}
