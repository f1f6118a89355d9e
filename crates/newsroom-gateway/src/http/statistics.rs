use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::{internal, ApiError};

/// GET /statistics — entity counts and latest scrape times per source kind.
pub async fn statistics_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let stats = state.store.stats().map_err(|e| internal(e.to_string()))?;

    Ok(Json(json!({
        "timestamp": Utc::now().to_rfc3339(),
        "total_items": stats.total_items,
        "sources": stats.per_source,
    })))
}
