use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::app::{AppState, VERSION};

/// GET /health — liveness probe plus backend reachability.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let llm_alive = state.llm.health_check().await;
    let vector_alive = state.vector.health_check().await;

    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "version": VERSION,
        "backends": {
            "llm": llm_alive,
            "vector": vector_alive,
            "log_store": state.logs.backend_name(),
        },
    }))
}
