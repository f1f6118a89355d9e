use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use newsroom_core::types::SourceKind;
use newsroom_llm::OllamaClient;
use newsroom_vector::{PointPayload, QdrantClient};

/// Result of a duplicate check. `failure` carries the backend error text
/// when the check could not actually run; the item is then treated as
/// unique rather than blocked.
#[derive(Debug, Clone, Default)]
pub struct DedupCheck {
    pub is_duplicate: bool,
    pub duplicate_of: Option<String>,
    pub score: Option<f32>,
    pub failure: Option<String>,
}

impl DedupCheck {
    fn degraded(reason: String) -> Self {
        Self {
            failure: Some(reason),
            ..Default::default()
        }
    }
}

/// A scored neighbour returned by `find_similar`.
#[derive(Debug, Clone)]
pub struct SimilarItem {
    pub source_id: String,
    pub score: f32,
    pub payload: Option<Value>,
}

pub struct DedupService {
    llm: Arc<OllamaClient>,
    vector: Arc<QdrantClient>,
    score_threshold: f32,
}

impl DedupService {
    pub fn new(llm: Arc<OllamaClient>, vector: Arc<QdrantClient>, score_threshold: f32) -> Self {
        Self {
            llm,
            vector,
            score_threshold,
        }
    }

    pub fn score_threshold(&self) -> f32 {
        self.score_threshold
    }

    /// Deterministic point id so that retried upserts for the same item land
    /// on the same point.
    pub fn point_id(kind: SourceKind, source_id: &str) -> Uuid {
        let name = format!("{}:{}", kind.as_str(), source_id);
        Uuid::new_v5(&Uuid::NAMESPACE_URL, name.as_bytes())
    }

    /// Nearest-neighbor check against the kind's own collection.
    ///
    /// Cross-kind near-duplicates are intentionally not considered; each
    /// corpus keeps its own semantics.
    pub async fn check_duplicate(&self, text: &str, kind: SourceKind) -> DedupCheck {
        let collection = kind.collection_name();

        match self.vector.collection_exists(collection).await {
            Ok(false) => return DedupCheck::default(),
            Ok(true) => {}
            Err(e) => {
                warn!(collection, error = %e, "duplicate check skipped: vector index unreachable");
                return DedupCheck::degraded(e.to_string());
            }
        }

        let vector = match self.llm.embed(text).await {
            Ok(v) => v,
            Err(e) => {
                warn!(collection, error = %e, "duplicate check skipped: embedding failed");
                return DedupCheck::degraded(e.to_string());
            }
        };

        match self
            .vector
            .search(collection, &vector, 1, self.score_threshold)
            .await
        {
            Ok(hits) => match hits.first() {
                Some(hit) => {
                    debug!(
                        collection,
                        duplicate_of = hit.source_id(),
                        score = hit.score,
                        "semantic duplicate found"
                    );
                    DedupCheck {
                        is_duplicate: true,
                        duplicate_of: Some(hit.source_id().to_string()),
                        score: Some(hit.score),
                        failure: None,
                    }
                }
                None => DedupCheck::default(),
            },
            Err(e) => {
                warn!(collection, error = %e, "duplicate check skipped: search failed");
                DedupCheck::degraded(e.to_string())
            }
        }
    }

    /// Embed and upsert. Returns the point id, or `None` when either backend
    /// failed. The item then stays un-vectorized, which downstream treats
    /// the same as "vectorization disabled".
    pub async fn remember(
        &self,
        text: &str,
        source_id: &str,
        metadata: serde_json::Map<String, Value>,
        kind: SourceKind,
    ) -> Option<Uuid> {
        let collection = kind.collection_name();

        if let Err(e) = self.ensure_collection(collection).await {
            warn!(collection, error = %e, "remember skipped: collection unavailable");
            return None;
        }

        let vector = match self.llm.embed(text).await {
            Ok(v) => v,
            Err(e) => {
                warn!(collection, error = %e, "remember skipped: embedding failed");
                return None;
            }
        };

        let point_id = Self::point_id(kind, source_id);
        let payload = PointPayload {
            source_id: source_id.to_string(),
            source_kind: kind.as_str().to_string(),
            extra: metadata,
        };

        match self
            .vector
            .upsert_point(collection, point_id, &vector, &payload)
            .await
        {
            Ok(()) => {
                debug!(collection, %point_id, "text remembered");
                Some(point_id)
            }
            Err(e) => {
                warn!(collection, error = %e, "remember failed: upsert rejected");
                None
            }
        }
    }

    /// Scored neighbours below the duplicate threshold. Backs the
    /// comparison endpoint; any backend failure degrades to an empty list.
    pub async fn find_similar(
        &self,
        text: &str,
        kind: SourceKind,
        limit: usize,
        threshold: f32,
    ) -> Vec<SimilarItem> {
        let collection = kind.collection_name();

        match self.vector.collection_exists(collection).await {
            Ok(true) => {}
            _ => return Vec::new(),
        }

        let vector = match self.llm.embed(text).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "find_similar skipped: embedding failed");
                return Vec::new();
            }
        };

        match self.vector.search(collection, &vector, limit, threshold).await {
            Ok(hits) => hits
                .into_iter()
                .map(|hit| SimilarItem {
                    source_id: hit.source_id().to_string(),
                    score: hit.score,
                    payload: hit
                        .payload
                        .map(|p| serde_json::to_value(p).unwrap_or(Value::Null)),
                })
                .collect(),
            Err(e) => {
                warn!(error = %e, "find_similar failed");
                Vec::new()
            }
        }
    }

    async fn ensure_collection(&self, collection: &str) -> Result<(), newsroom_vector::VectorError> {
        if !self.vector.collection_exists(collection).await? {
            self.vector.create_collection(collection).await?;
            info!(collection, "created vector collection");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_id_is_deterministic() {
        let a = DedupService::point_id(SourceKind::ForumPost, "abc123");
        let b = DedupService::point_id(SourceKind::ForumPost, "abc123");
        assert_eq!(a, b);
    }

    #[test]
    fn point_id_separates_kinds() {
        let forum = DedupService::point_id(SourceKind::ForumPost, "abc123");
        let blog = DedupService::point_id(SourceKind::BlogArticle, "abc123");
        assert_ne!(forum, blog);
    }

    #[test]
    fn degraded_check_is_not_a_duplicate() {
        let check = DedupCheck::degraded("connection refused".into());
        assert!(!check.is_duplicate);
        assert!(check.duplicate_of.is_none());
        assert!(check.failure.is_some());
    }
}
