use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogStoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LogStoreError>;
