use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{service} rate limited: {details}")]
    RateLimited {
        service: &'static str,
        details: String,
    },

    #[error("{service} quota exhausted: {details}")]
    QuotaExhausted {
        service: &'static str,
        details: String,
    },

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("http error: {0}")]
    Http(reqwest::Error),

    #[error("invalid response from {backend}: {details}")]
    BackendResponse {
        backend: &'static str,
        details: String,
    },

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl ServiceError {
    /// Transient failures worth another attempt. Quota exhaustion signals
    /// sustained unavailability and is deliberately excluded.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Timeout(_))
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error.to_string())
        } else {
            Self::Http(error)
        }
    }
}

/// Maps a non-success HTTP status from an external service onto the error
/// taxonomy: 429 is a retryable rate limit, quota messages are sustained
/// unavailability, everything else is an opaque backend failure.
pub fn classify_status(service: &'static str, status: StatusCode, body: &str) -> ServiceError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return ServiceError::RateLimited {
            service,
            details: truncate_details(body),
        };
    }

    if body.contains("quota") || body.contains("RESOURCE_EXHAUSTED") {
        return ServiceError::QuotaExhausted {
            service,
            details: truncate_details(body),
        };
    }

    ServiceError::BackendResponse {
        backend: service,
        details: format!("{status}: {}", truncate_details(body)),
    }
}

fn truncate_details(body: &str) -> String {
    const MAX: usize = 300;
    let trimmed = body.trim();
    if trimmed.len() <= MAX {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(MAX).collect();
        format!("{cut}...")
    }
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_status_is_retryable() {
        let error = classify_status("gemini", StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert!(error.is_retryable());
        assert!(matches!(error, ServiceError::RateLimited { .. }));
    }

    #[test]
    fn quota_message_is_not_retryable() {
        let error = classify_status(
            "gemini",
            StatusCode::FORBIDDEN,
            r#"{"error":{"status":"RESOURCE_EXHAUSTED","message":"quota exceeded"}}"#,
        );
        assert!(!error.is_retryable());
        assert!(matches!(error, ServiceError::QuotaExhausted { .. }));
    }

    #[test]
    fn other_statuses_map_to_backend_response() {
        let error = classify_status("qdrant", StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert!(!error.is_retryable());
        assert!(matches!(error, ServiceError::BackendResponse { .. }));
    }
}
