use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

/// Error body shape shared by every endpoint: `{"error": "...", "code": "..."}`.
pub type ApiError = (StatusCode, Json<Value>);

pub fn bad_request(message: impl Into<String>) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
}

pub fn not_found(message: impl Into<String>) -> ApiError {
    api_error(StatusCode::NOT_FOUND, "NOT_FOUND", message)
}

pub fn internal(message: impl Into<String>) -> ApiError {
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
}

fn api_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(json!({ "error": message.into(), "code": code })),
    )
}
