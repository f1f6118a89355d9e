use thiserror::Error;

#[derive(Debug, Error)]
pub enum VectorError {
    #[error("vector index unavailable: {0}")]
    Unavailable(String),

    #[error("vector index rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("malformed response from vector index: {0}")]
    Malformed(String),

    #[error(
        "collection {collection} has dimension {actual}, client configured for {expected}; \
         recreate the collection after switching embedding models"
    )]
    DimensionMismatch {
        collection: String,
        expected: u32,
        actual: u32,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
