//! Raw-vs-processed comparison.
//!
//! Pairs each raw item with its editorial product, scoring the rewrite with
//! a trivial word-set similarity, and asks the dedup service for scored
//! vector-space neighbours of the raw text. Handy when debugging model
//! output drift or a misbehaving duplicate threshold.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use newsroom_dedup::SimilarItem;

use crate::app::AppState;
use crate::error::{internal, ApiError};
use crate::http::parse_kind;

/// Floor for the neighbour search; looser than the duplicate threshold so
/// near-misses show up too.
const SIMILAR_THRESHOLD: f32 = 0.7;
/// Neighbours surfaced per item. One extra is fetched because the item's own
/// point always matches itself.
const SIMILAR_CAP: usize = 3;

#[derive(Deserialize)]
pub struct ComparisonQuery {
    source: Option<String>,
    limit: Option<usize>,
    only_processed: Option<bool>,
}

/// GET /comparison?source=…&limit=…&only_processed=…
pub async fn comparison_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ComparisonQuery>,
) -> Result<Json<Value>, ApiError> {
    let kind = parse_kind(query.source.as_deref().unwrap_or("tech_article"))?;
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let only_processed = query.only_processed.unwrap_or(false);

    let raw_items = state
        .store
        .list_raw(kind, limit, 0, None)
        .map_err(|e| internal(e.to_string()))?;

    let mut items = Vec::new();
    let mut title_sims = Vec::new();
    let mut body_sims = Vec::new();
    let mut processed_count = 0usize;

    for raw in &raw_items {
        let processed = state
            .store
            .get_processed(kind, &raw.source_id)
            .map_err(|e| internal(e.to_string()))?;

        if only_processed && processed.is_none() {
            continue;
        }

        // Vector-space neighbours of the raw text. The item's own point is
        // dropped from the hits; a dead backend just yields an empty list.
        let text = format!("{}\n\n{}", raw.title, raw.body);
        let similar = state
            .dedup
            .find_similar(&text, kind, SIMILAR_CAP + 1, SIMILAR_THRESHOLD)
            .await;

        let mut entry = json!({
            "source_id": raw.source_id,
            "url": raw.url,
            "fetched_at": raw.fetched_at.to_rfc3339(),
            "is_processed": processed.is_some(),
            "original": {
                "title": raw.title,
                "body_preview": preview(&raw.body, 500),
                "body_length": raw.body.chars().count(),
                "author": raw.author,
            },
            "similar": neighbor_values(similar, &raw.source_id, SIMILAR_CAP),
            "processed": {},
        });

        if let Some(proc) = processed {
            processed_count += 1;
            entry["is_relevant"] = json!(proc.is_relevant);
            entry["relevance_score"] = json!(proc.relevance_score);
            entry["processed"] = json!({
                "title": proc.editorial_title,
                "body_preview": proc.editorial_body.as_deref().map(|b| preview(b, 500)),
                "body_length": proc.editorial_body.as_deref().map(|b| b.chars().count()),
                "teaser": proc.editorial_teaser,
                "image_prompt": proc.image_prompt,
            });

            if let Some(ref edited_title) = proc.editorial_title {
                let sim = jaccard(&raw.title, edited_title);
                title_sims.push(sim);
                entry["title_similarity"] = json!(round3(sim));
            }
            if let Some(ref edited_body) = proc.editorial_body {
                let sim = jaccard(truncated(&raw.body, 1000), truncated(edited_body, 1000));
                body_sims.push(sim);
                entry["body_similarity"] = json!(round3(sim));
            }
        }

        items.push(entry);
    }

    Ok(Json(json!({
        "source": kind,
        "timestamp": Utc::now().to_rfc3339(),
        "items": items,
        "stats": {
            "total": raw_items.len(),
            "processed": processed_count,
            "avg_title_similarity": round3(mean(&title_sims)),
            "avg_body_similarity": round3(mean(&body_sims)),
        },
    })))
}

/// Render neighbour hits, dropping the item's own point and capping the
/// list. Scores come straight from the index.
fn neighbor_values(similar: Vec<SimilarItem>, self_id: &str, cap: usize) -> Vec<Value> {
    similar
        .into_iter()
        .filter(|s| s.source_id != self_id)
        .take(cap)
        .map(|s| {
            json!({
                "source_id": s.source_id,
                "score": round3(s.score as f64),
            })
        })
        .collect()
}

/// Jaccard similarity over lower-cased word sets.
fn jaccard(a: &str, b: &str) -> f64 {
    let words_a: HashSet<String> = a.split_whitespace().map(str::to_lowercase).collect();
    let words_b: HashSet<String> = b.split_whitespace().map(str::to_lowercase).collect();
    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }
    let intersection = words_a.intersection(&words_b).count();
    let union = words_a.union(&words_b).count();
    intersection as f64 / union as f64
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

fn truncated(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((pos, _)) => &text[..pos],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jaccard_identical_texts() {
        assert_eq!(jaccard("the quick brown fox", "the quick brown fox"), 1.0);
    }

    #[test]
    fn jaccard_disjoint_texts() {
        assert_eq!(jaccard("alpha beta", "gamma delta"), 0.0);
    }

    #[test]
    fn jaccard_is_case_insensitive() {
        assert_eq!(jaccard("Rust Compiler", "rust compiler"), 1.0);
    }

    #[test]
    fn jaccard_partial_overlap() {
        // {a, b} vs {b, c}: intersection 1, union 3
        let sim = jaccard("a b", "b c");
        assert!((sim - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn jaccard_empty_is_zero() {
        assert_eq!(jaccard("", "words here"), 0.0);
    }

    fn hit(source_id: &str, score: f32) -> SimilarItem {
        SimilarItem {
            source_id: source_id.to_string(),
            score,
            payload: None,
        }
    }

    #[test]
    fn neighbor_values_drops_self_and_caps() {
        let hits = vec![hit("me", 1.0), hit("a", 0.91), hit("b", 0.85), hit("c", 0.8), hit("d", 0.75)];
        let values = neighbor_values(hits, "me", 3);
        assert_eq!(values.len(), 3);
        assert_eq!(values[0]["source_id"], "a");
        assert_eq!(values[0]["score"], 0.91);
        assert_eq!(values[2]["source_id"], "c");
    }

    #[test]
    fn neighbor_values_empty_when_only_self_matches() {
        let values = neighbor_values(vec![hit("me", 1.0)], "me", 3);
        assert!(values.is_empty());
    }

    #[test]
    fn preview_appends_ellipsis_only_when_cut() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("0123456789abc", 10), "0123456789...");
    }

    #[test]
    fn truncated_respects_char_boundaries() {
        let text = "привет мир";
        assert_eq!(truncated(text, 6), "привет");
        assert_eq!(truncated("ab", 10), "ab");
    }
}
