use thiserror::Error;

#[derive(Debug, Error)]
pub enum NewsroomError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Exact duplicate: {source_id}")]
    ExactDuplicate { source_id: String },

    #[error("Semantic duplicate of {duplicate_of} (score {score:.3})")]
    SemanticDuplicate { duplicate_of: String, score: f32 },

    #[error("Backend unavailable ({backend}): {reason}")]
    BackendUnavailable { backend: String, reason: String },

    #[error("Backend rejected request ({backend}, status {status}): {reason}")]
    BackendRejected {
        backend: String,
        status: u16,
        reason: String,
    },

    #[error("Malformed response from {backend}: {reason}")]
    MalformedResponse { backend: String, reason: String },

    #[error("Record store error: {0}")]
    RecordStore(String),

    #[error("Job not found: {id}")]
    JobNotFound { id: String },

    #[error("Job failed: {0}")]
    JobFatal(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl NewsroomError {
    /// Short classification code carried in API error payloads.
    pub fn code(&self) -> &'static str {
        match self {
            NewsroomError::Config(_) => "CONFIG_ERROR",
            NewsroomError::Validation(_) => "VALIDATION_ERROR",
            NewsroomError::ExactDuplicate { .. } => "DUPLICATE_ID",
            NewsroomError::SemanticDuplicate { .. } => "DUPLICATE_SEMANTIC",
            NewsroomError::BackendUnavailable { .. } => "BACKEND_UNAVAILABLE",
            NewsroomError::BackendRejected { .. } => "BACKEND_REJECTED",
            NewsroomError::MalformedResponse { .. } => "MALFORMED_RESPONSE",
            NewsroomError::RecordStore(_) => "RECORD_STORE_ERROR",
            NewsroomError::JobNotFound { .. } => "JOB_NOT_FOUND",
            NewsroomError::JobFatal(_) => "JOB_FATAL",
            NewsroomError::Serialization(_) => "SERIALIZATION_ERROR",
            NewsroomError::Io(_) => "IO_ERROR",
            NewsroomError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, NewsroomError>;
