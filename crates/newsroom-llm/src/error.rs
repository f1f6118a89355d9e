use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    /// Connection refused or request timed out. Retried with backoff; once
    /// retries are exhausted the pipeline proceeds without enrichment.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// Non-429 4xx from the backend. Never retried.
    #[error("backend rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The backend answered but the payload did not carry what we asked for.
    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl LlmError {
    /// Transient failures worth another attempt: connect/timeout, 429, 5xx.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Unavailable(_) => true,
            LlmError::Rejected { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
