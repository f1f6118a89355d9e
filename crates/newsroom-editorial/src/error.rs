use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorialError {
    #[error("prompt document error: {0}")]
    Prompt(String),

    #[error("generation backend error: {0}")]
    Llm(#[from] newsroom_llm::LlmError),

    #[error("empty response from model")]
    EmptyResponse,

    /// Short-form only: the verdict parser never raises this.
    #[error("short-form output missing required field: {0}")]
    MissingField(&'static str),

    #[error("short-form output invalid: {0}")]
    InvalidShortForm(String),
}
