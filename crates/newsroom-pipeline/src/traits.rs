//! Seams between the orchestrator and its collaborators.
//!
//! The orchestrator talks to the dedup and editorial services through these
//! traits so tests can substitute deterministic fakes; the real services
//! implement them below.

use async_trait::async_trait;
use serde_json::Value;

use newsroom_core::types::SourceKind;
use newsroom_dedup::{DedupCheck, DedupService};
use newsroom_editorial::{EditorialError, EditorialReview, EditorialService, ShortFormDraft};

#[async_trait]
pub trait Deduplicator: Send + Sync {
    async fn check(&self, text: &str, kind: SourceKind) -> DedupCheck;

    /// Returns the vector point id as a string, or `None` on soft failure.
    async fn remember(
        &self,
        text: &str,
        source_id: &str,
        metadata: serde_json::Map<String, Value>,
        kind: SourceKind,
    ) -> Option<String>;
}

#[async_trait]
pub trait Editor: Send + Sync {
    /// Whether the generation backend is reachable right now.
    async fn available(&self) -> bool;

    async fn review(
        &self,
        title: &str,
        body: &str,
        kind: SourceKind,
    ) -> Result<EditorialReview, EditorialError>;

    async fn short_form(&self, title: &str, body: &str)
        -> Result<ShortFormDraft, EditorialError>;
}

#[async_trait]
impl Deduplicator for DedupService {
    async fn check(&self, text: &str, kind: SourceKind) -> DedupCheck {
        self.check_duplicate(text, kind).await
    }

    async fn remember(
        &self,
        text: &str,
        source_id: &str,
        metadata: serde_json::Map<String, Value>,
        kind: SourceKind,
    ) -> Option<String> {
        DedupService::remember(self, text, source_id, metadata, kind)
            .await
            .map(|id| id.to_string())
    }
}

#[async_trait]
impl Editor for EditorialService {
    async fn available(&self) -> bool {
        self.backend_alive().await
    }

    async fn review(
        &self,
        title: &str,
        body: &str,
        kind: SourceKind,
    ) -> Result<EditorialReview, EditorialError> {
        EditorialService::review(self, title, body, kind).await
    }

    async fn short_form(
        &self,
        title: &str,
        body: &str,
    ) -> Result<ShortFormDraft, EditorialError> {
        self.render_short_form(title, body).await
    }
}
