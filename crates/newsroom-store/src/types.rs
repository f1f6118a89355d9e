use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use newsroom_core::types::{MetaValue, SourceKind};

/// A persisted raw item. Identical to the driver's `RawItem` plus the row id
/// and the optional vector reference attached after vectorization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: i64,
    pub source_kind: SourceKind,
    pub source_id: String,
    pub title: String,
    pub body: String,
    pub url: String,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub fetched_at: DateTime<Utc>,
    pub metadata: BTreeMap<String, MetaValue>,
    /// UUID of the point in the kind's vector collection; `None` while the
    /// item is not vectorized. The index entry may be gone even when this is
    /// set; readers must treat that as "not vectorized".
    pub vector_id: Option<String>,
}

/// The editorial product of one raw item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedRecord {
    pub id: i64,
    pub source_kind: SourceKind,
    pub source_id: String,
    pub is_relevant: bool,
    pub relevance_score: f32,
    pub relevance_reason: String,
    pub original_summary: Option<String>,
    pub editorial_title: Option<String>,
    pub editorial_teaser: Option<String>,
    pub editorial_body: Option<String>,
    pub image_prompt: Option<String>,
    pub content_type: Option<String>,
    pub model_name: String,
    pub processing_ms: u64,
    pub processed_at: DateTime<Utc>,
}

/// The chat-channel rendering of a relevant item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortFormRecord {
    pub id: i64,
    pub source_kind: SourceKind,
    pub source_id: String,
    pub title: String,
    pub body: String,
    pub hashtags: Vec<String>,
    pub formatted: String,
    pub char_count: usize,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub platform_message_id: Option<i64>,
    pub is_published: bool,
}

/// Per-kind slice of the statistics endpoint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceStats {
    pub raw_count: u64,
    pub processed_count: u64,
    pub relevant_count: u64,
    pub short_form_count: u64,
    pub latest_fetched_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    pub total_items: u64,
    pub per_source: BTreeMap<String, SourceStats>,
}
