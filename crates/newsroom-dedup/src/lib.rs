//! `newsroom-dedup` — semantic duplicate detection over the vector index.
//!
//! Wraps the embedding client and the vector index behind two questions the
//! pipeline asks: "is this text a near-duplicate of something we already
//! have?" and "remember this text for future checks". Both degrade softly:
//! a dead embedding backend or vector index never blocks ingestion.

pub mod service;

pub use service::{DedupCheck, DedupService, SimilarItem};
