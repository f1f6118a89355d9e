use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::{internal, ApiError};

#[derive(Deserialize)]
pub struct LogsQuery {
    limit: Option<usize>,
    session_id: Option<String>,
    level: Option<String>,
}

/// GET /logs?limit&session_id&level
pub async fn get_logs_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<Value>, ApiError> {
    let limit = query.limit.unwrap_or(100).clamp(1, 1000);
    let logs = state
        .logs
        .get_logs(limit, query.session_id.as_deref())
        .await
        .map_err(|e| internal(e.to_string()))?;

    // Level filtering happens here, not in the store.
    let logs: Vec<_> = match query.level {
        Some(ref level) => {
            let wanted = level.to_uppercase();
            logs.into_iter().filter(|l| l.level == wanted).collect()
        }
        None => logs,
    };

    Ok(Json(json!({ "count": logs.len(), "logs": logs })))
}

#[derive(Deserialize)]
pub struct ClearQuery {
    session_id: Option<String>,
}

/// DELETE /logs?session_id
pub async fn clear_logs_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ClearQuery>,
) -> Result<Json<Value>, ApiError> {
    state
        .logs
        .clear_logs(query.session_id.as_deref())
        .await
        .map_err(|e| internal(e.to_string()))?;
    Ok(Json(json!({
        "cleared": query.session_id.as_deref().unwrap_or("all"),
    })))
}

/// GET /sessions — all known log sessions.
pub async fn sessions_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let sessions = state
        .logs
        .list_sessions()
        .await
        .map_err(|e| internal(e.to_string()))?;
    Ok(Json(json!({ "count": sessions.len(), "sessions": sessions })))
}
