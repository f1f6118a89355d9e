use serde::{Deserialize, Serialize};

use newsroom_core::types::ContentType;

/// Parsed and repaired model verdict for one item.
///
/// When `is_relevant` is false the editorial fields stay `None`; when true
/// they are always filled (with domain defaults if the model dropped them).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorialVerdict {
    pub is_relevant: bool,
    /// Clamped to [0, 1].
    pub relevance_score: f32,
    pub relevance_reason: String,
    pub original_summary: Option<String>,
    pub editorial_title: Option<String>,
    pub editorial_teaser: Option<String>,
    pub editorial_body: Option<String>,
    pub image_prompt: Option<String>,
    pub content_type: Option<ContentType>,
}

/// A verdict plus call metadata, as the pipeline persists it.
#[derive(Debug, Clone)]
pub struct EditorialReview {
    pub verdict: EditorialVerdict,
    pub model_name: String,
    pub processing_ms: u64,
}

/// Validated short-form rendering. `char_count` is recomputed from
/// `formatted`, never trusted from the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortFormDraft {
    pub title: String,
    pub body: String,
    /// 3 to 5 tokens, leading '#' stripped.
    pub hashtags: Vec<String>,
    pub formatted: String,
    pub char_count: usize,
}
