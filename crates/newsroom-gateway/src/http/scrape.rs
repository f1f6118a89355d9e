//! Job submission and inspection — the only write surface besides log
//! cleanup. POST starts a background job; callers poll status by id.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use newsroom_pipeline::JobParams;

use crate::app::AppState;
use crate::error::{bad_request, not_found, ApiError};
use crate::http::parse_kind;

#[derive(Deserialize)]
pub struct SubmitBody {
    max_items: Option<u32>,
    #[serde(default)]
    filter: Vec<String>,
    enable_llm: Option<bool>,
    enable_deduplication: Option<bool>,
}

/// POST /scrape/{source_kind}
pub async fn submit_handler(
    State(state): State<Arc<AppState>>,
    Path(source_kind): Path<String>,
    Json(body): Json<SubmitBody>,
) -> Result<Json<Value>, ApiError> {
    let kind = parse_kind(&source_kind)?;
    let params = JobParams {
        max_items: body
            .max_items
            .unwrap_or(state.config.pipeline.default_max_items),
        filters: body.filter,
        enable_llm: body.enable_llm.unwrap_or(true),
        enable_deduplication: body.enable_deduplication.unwrap_or(true),
    };

    let record = state.runner.submit(kind, params).map_err(bad_request)?;
    Ok(Json(json!({
        "job_id": record.job_id,
        "state": record.state,
        "created_at": record.created_at.to_rfc3339(),
        "source_kind": kind,
    })))
}

/// GET /scrape/status/{job_id}
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let job_id: Uuid = job_id
        .parse()
        .map_err(|_| bad_request("job_id must be a UUID"))?;
    let record = state
        .runner
        .status(job_id)
        .ok_or_else(|| not_found(format!("job not found: {}", job_id)))?;

    Ok(Json(json!({
        "job_id": record.job_id,
        "source_kind": record.source_kind,
        "state": record.state,
        "created_at": record.created_at.to_rfc3339(),
        "started_at": record.started_at.map(|t| t.to_rfc3339()),
        "completed_at": record.completed_at.map(|t| t.to_rfc3339()),
        "result": record.result,
        "error": record.error,
        "session_id": record.session_id,
    })))
}

#[derive(Deserialize)]
pub struct ListQuery {
    limit: Option<usize>,
}

/// GET /scrape/jobs?limit=N — recent jobs, newest first.
pub async fn list_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Json<Value> {
    let jobs = state.runner.list(query.limit.unwrap_or(20).clamp(1, 100));
    let count = jobs.len();
    Json(json!({ "jobs": jobs, "count": count }))
}

/// DELETE /scrape/jobs — drop completed and failed jobs.
pub async fn cleanup_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let removed = state.runner.cleanup();
    Json(json!({ "removed": removed }))
}
