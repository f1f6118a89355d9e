//! Per-source read endpoints over the record store.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::{internal, ApiError};
use crate::http::parse_kind;

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 1000;

#[derive(Deserialize)]
pub struct PageQuery {
    limit: Option<usize>,
    offset: Option<usize>,
    filter: Option<String>,
    only_relevant: Option<bool>,
}

impl PageQuery {
    fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    fn offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }
}

/// GET /{source}/records — raw items, newest first.
pub async fn raw_handler(
    State(state): State<Arc<AppState>>,
    Path(source): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>, ApiError> {
    let kind = parse_kind(&source)?;
    let items = state
        .store
        .list_raw(kind, query.limit(), query.offset(), query.filter.as_deref())
        .map_err(|e| internal(e.to_string()))?;
    let total = state
        .store
        .count_raw(kind)
        .map_err(|e| internal(e.to_string()))?;

    Ok(Json(json!({
        "source": kind,
        "total": total,
        "count": items.len(),
        "items": items,
    })))
}

/// GET /{source}/processed — editorial output, newest first.
pub async fn processed_handler(
    State(state): State<Arc<AppState>>,
    Path(source): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>, ApiError> {
    let kind = parse_kind(&source)?;
    let only_relevant = query.only_relevant.unwrap_or(false);
    let items = state
        .store
        .list_processed(kind, query.limit(), query.offset(), only_relevant)
        .map_err(|e| internal(e.to_string()))?;
    let total = state
        .store
        .count_processed(kind, only_relevant)
        .map_err(|e| internal(e.to_string()))?;

    Ok(Json(json!({
        "source": kind,
        "total": total,
        "count": items.len(),
        "items": items,
    })))
}

/// GET /{source}/short-form — chat-channel renderings, newest first.
pub async fn short_form_handler(
    State(state): State<Arc<AppState>>,
    Path(source): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>, ApiError> {
    let kind = parse_kind(&source)?;
    let items = state
        .store
        .list_short_form(kind, query.limit(), query.offset())
        .map_err(|e| internal(e.to_string()))?;
    let total = state
        .store
        .count_short_form(kind)
        .map_err(|e| internal(e.to_string()))?;

    Ok(Json(json!({
        "source": kind,
        "total": total,
        "count": items.len(),
        "items": items,
    })))
}
