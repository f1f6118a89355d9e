use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// Transient: connect/timeout, 429, 5xx. Worth one more attempt.
    #[error("fetch failed (retryable): {0}")]
    Retryable(String),

    /// Permanent for this job: auth failure, unknown board/channel, bad
    /// filter. Retrying would only repeat the answer.
    #[error("fetch failed: {0}")]
    Fatal(String),

    #[error("malformed source payload: {0}")]
    Malformed(String),
}

impl FetchError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Retryable(_))
    }

    pub(crate) fn from_status(status: u16, body: String) -> Self {
        if status == 429 || status >= 500 {
            FetchError::Retryable(format!("status {}: {}", status, body))
        } else {
            FetchError::Fatal(format!("status {}: {}", status, body))
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            FetchError::Retryable(e.to_string())
        } else {
            FetchError::Fatal(e.to_string())
        }
    }
}
