use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload stored with every point. `source_id` is what duplicate hits
/// report back; the rest is caller metadata kept for inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointPayload {
    pub source_id: String,
    pub source_kind: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// One nearest-neighbor result.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub point_id: String,
    pub score: f32,
    pub payload: Option<PointPayload>,
}

impl SearchHit {
    /// The stable identifier of the matched item, falling back to the point
    /// id when the payload was lost on the index side.
    pub fn source_id(&self) -> &str {
        self.payload
            .as_ref()
            .map(|p| p.source_id.as_str())
            .unwrap_or(&self.point_id)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CollectionInfo {
    pub points_count: u64,
    pub dimension: u32,
}
