use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(rusqlite::Error),

    /// Unique-constraint violation on `(source_kind, source_id)`. Raced
    /// writers treat this as "someone else already did it", not a failure.
    #[error("record already exists: {source_id}")]
    Conflict { source_id: String },

    #[error("record not found: {source_id}")]
    NotFound { source_id: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(err, _) = &e {
            if err.code == rusqlite::ErrorCode::ConstraintViolation {
                return StoreError::Conflict {
                    source_id: String::new(),
                };
            }
        }
        StoreError::Database(e)
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
