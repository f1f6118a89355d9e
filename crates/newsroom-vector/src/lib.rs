//! `newsroom-vector` — thin HTTP client for the Qdrant vector index.
//!
//! One named collection per source kind, cosine distance, fixed dimension.
//! The client covers exactly what the dedup service needs: collection
//! management, point upsert, threshold search, and point deletion.

pub mod client;
pub mod error;
pub mod types;

pub use client::QdrantClient;
pub use error::VectorError;
pub use types::{CollectionInfo, PointPayload, SearchHit};
