use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::VectorError;
use crate::types::{CollectionInfo, PointPayload, SearchHit};

pub struct QdrantClient {
    client: reqwest::Client,
    base_url: String,
    dimension: u32,
    timeout: Duration,
}

impl QdrantClient {
    pub fn new(base_url: &str, dimension: u32, timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            dimension,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn dimension(&self) -> u32 {
        self.dimension
    }

    pub async fn health_check(&self) -> bool {
        let url = format!("{}/collections", self.base_url);
        match self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!(error = %e, "vector index health check failed");
                false
            }
        }
    }

    pub async fn collection_exists(&self, name: &str) -> Result<bool, VectorError> {
        let url = format!("{}/collections/{}/exists", self.base_url, name);
        let resp = self.send(self.client.get(&url)).await?;
        let parsed: ApiResult<ExistsResult> = resp
            .json()
            .await
            .map_err(|e| VectorError::Malformed(e.to_string()))?;
        Ok(parsed.result.exists)
    }

    /// Create the collection with the configured dimension and cosine
    /// distance. Idempotence is the caller's concern (check `exists` first).
    pub async fn create_collection(&self, name: &str) -> Result<(), VectorError> {
        let url = format!("{}/collections/{}", self.base_url, name);
        let body = serde_json::json!({
            "vectors": { "size": self.dimension, "distance": "Cosine" }
        });
        self.send(self.client.put(&url).json(&body)).await?;
        info!(collection = name, dimension = self.dimension, "collection created");
        Ok(())
    }

    /// Point count and stored dimension for a collection.
    pub async fn collection_info(&self, name: &str) -> Result<CollectionInfo, VectorError> {
        let url = format!("{}/collections/{}", self.base_url, name);
        let resp = self.send(self.client.get(&url)).await?;
        let parsed: ApiResult<CollectionResult> = resp
            .json()
            .await
            .map_err(|e| VectorError::Malformed(e.to_string()))?;
        Ok(CollectionInfo {
            points_count: parsed.result.points_count.unwrap_or(0),
            dimension: parsed.result.config.params.vectors.size,
        })
    }

    /// Verify an existing collection matches the configured dimension.
    /// Called once at startup per collection; a mismatch is fatal.
    pub async fn verify_dimension(&self, name: &str) -> Result<(), VectorError> {
        if !self.collection_exists(name).await? {
            return Ok(());
        }
        let info = self.collection_info(name).await?;
        if info.dimension != self.dimension {
            return Err(VectorError::DimensionMismatch {
                collection: name.to_string(),
                expected: self.dimension,
                actual: info.dimension,
            });
        }
        Ok(())
    }

    pub async fn upsert_point(
        &self,
        collection: &str,
        point_id: Uuid,
        vector: &[f32],
        payload: &PointPayload,
    ) -> Result<(), VectorError> {
        let url = format!("{}/collections/{}/points?wait=true", self.base_url, collection);
        let body = serde_json::json!({
            "points": [{
                "id": point_id.to_string(),
                "vector": vector,
                "payload": payload,
            }]
        });
        self.send(self.client.put(&url).json(&body)).await?;
        debug!(collection, point_id = %point_id, "point upserted");
        Ok(())
    }

    /// Cosine nearest-neighbor search with a score floor.
    pub async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        score_threshold: f32,
    ) -> Result<Vec<SearchHit>, VectorError> {
        let url = format!("{}/collections/{}/points/search", self.base_url, collection);
        let body = serde_json::json!({
            "vector": vector,
            "limit": limit,
            "score_threshold": score_threshold,
            "with_payload": true,
        });
        let resp = self.send(self.client.post(&url).json(&body)).await?;
        let parsed: ApiResult<Vec<ScoredPoint>> = resp
            .json()
            .await
            .map_err(|e| VectorError::Malformed(e.to_string()))?;

        Ok(parsed
            .result
            .into_iter()
            .map(|p| {
                let payload = p.payload.and_then(|v| {
                    // Tolerate payloads written by older schema versions.
                    serde_json::from_value(v)
                        .map_err(|e| warn!(error = %e, "unreadable point payload"))
                        .ok()
                });
                SearchHit {
                    point_id: p.id,
                    score: p.score,
                    payload,
                }
            })
            .collect())
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, VectorError> {
        let resp = req.timeout(self.timeout).send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                VectorError::Unavailable(e.to_string())
            } else {
                VectorError::Http(e)
            }
        })?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(VectorError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp)
    }
}

// Qdrant API response types (private — deserialization only)

#[derive(Deserialize)]
struct ApiResult<T> {
    result: T,
}

#[derive(Deserialize)]
struct ExistsResult {
    exists: bool,
}

#[derive(Deserialize)]
struct CollectionResult {
    points_count: Option<u64>,
    config: CollectionConfig,
}

#[derive(Deserialize)]
struct CollectionConfig {
    params: CollectionParams,
}

#[derive(Deserialize)]
struct CollectionParams {
    vectors: VectorParams,
}

#[derive(Deserialize)]
struct VectorParams {
    size: u32,
}

#[derive(Deserialize)]
struct ScoredPoint {
    id: String,
    score: f32,
    payload: Option<Value>,
}
