use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use newsroom_core::types::{RawItem, SourceKind};
use newsroom_store::{NewProcessed, NewShortForm, RecordStore, StoreError};

use crate::outcome::ItemOutcome;
use crate::traits::{Deduplicator, Editor};

/// Minimum title length for a valid item.
const MIN_TITLE_CHARS: usize = 5;

/// Per-item pipeline toggles, taken from the job parameters.
#[derive(Debug, Clone, Copy)]
pub struct ItemOptions {
    pub enable_llm: bool,
    pub enable_deduplication: bool,
}

/// Outcome of the sequential ingest phase (steps 1–7). `Enrich` hands the
/// item to the parallelizable editorial phase.
pub enum Ingested {
    Stop(ItemOutcome),
    Enrich { vector_id: Option<String> },
}

/// Walks one raw item through the pipeline. Cheap to share: all state lives
/// behind handles.
pub struct Orchestrator {
    store: Arc<RecordStore>,
    dedup: Arc<dyn Deduplicator>,
    editor: Arc<dyn Editor>,
    min_text_length: usize,
}

impl Orchestrator {
    pub fn new(
        store: Arc<RecordStore>,
        dedup: Arc<dyn Deduplicator>,
        editor: Arc<dyn Editor>,
        min_text_length: usize,
    ) -> Self {
        Self {
            store,
            dedup,
            editor,
            min_text_length,
        }
    }

    /// Run the whole pipeline for one item, sequentially.
    pub async fn process_item(&self, item: &RawItem, opts: ItemOptions) -> ItemOutcome {
        match self.ingest(item, opts).await {
            Ingested::Stop(outcome) => outcome,
            Ingested::Enrich { vector_id } => self.enrich(item, vector_id.as_deref()).await,
        }
    }

    /// Steps 1–7: validation, exact-dup gate, raw persistence, services
    /// health, length gate, semantic-dup gate (with rollback), vectorize.
    ///
    /// This phase must run serially within a job: the semantic gate has to
    /// observe item N before item N+1 consults it.
    pub async fn ingest(&self, item: &RawItem, opts: ItemOptions) -> Ingested {
        let kind = item.source_kind;
        let source_id = item.source_id.as_str();

        // 1. validate
        if let Err(reason) = validate(item) {
            debug!(source_id, %reason, "item dropped as invalid");
            return Ingested::Stop(ItemOutcome::Invalid { reason });
        }

        // 2. exact-duplicate gate
        match self.store.exists_raw(kind, source_id) {
            Ok(true) => return Ingested::Stop(ItemOutcome::DuplicateId),
            Ok(false) => {}
            Err(e) => return Ingested::Stop(store_error(e)),
        }

        // 3. persist raw
        match self.store.insert_raw(item) {
            Ok(_) => {}
            // A concurrent job inserted between the check and the write.
            Err(StoreError::Conflict { .. }) => {
                return Ingested::Stop(ItemOutcome::DuplicateId)
            }
            Err(e) => return Ingested::Stop(store_error(e)),
        }

        if !opts.enable_llm && !opts.enable_deduplication {
            return Ingested::Stop(ItemOutcome::SavedRawOnly {
                reason: "enrichment_disabled",
            });
        }

        // 4. services health: embedding and generation share one backend; if
        // it is gone there is nothing left to enrich with. The raw record
        // stays; no rollback here.
        if !self.editor.available().await {
            info!(source_id, "llm backend unreachable, keeping raw record only");
            return Ingested::Stop(ItemOutcome::SavedRawOnly {
                reason: "services_unavailable",
            });
        }

        // 5. length gate
        let text = item.combined_text();
        if text.trim().chars().count() < self.min_text_length {
            return Ingested::Stop(ItemOutcome::TooShort);
        }

        let mut vector_id = None;
        if opts.enable_deduplication {
            // 6. semantic-duplicate gate. A hit rolls the raw record back:
            // near-duplicates must not pollute downstream.
            let check = self.dedup.check(&text, kind).await;
            if check.is_duplicate {
                let duplicate_of = check.duplicate_of.unwrap_or_default();
                let score = check.score.unwrap_or_default();
                if let Err(e) = self.store.delete_raw(kind, source_id) {
                    return Ingested::Stop(store_error(e));
                }
                info!(source_id, %duplicate_of, score, "semantic duplicate rolled back");
                return Ingested::Stop(ItemOutcome::SemanticDuplicate {
                    duplicate_of,
                    score,
                });
            }
            if let Some(failure) = check.failure {
                warn!(source_id, %failure, "duplicate check degraded, proceeding");
            }

            // 7. vectorize; soft failure leaves the item un-vectorized.
            vector_id = self
                .dedup
                .remember(&text, source_id, vector_payload(item), kind)
                .await;
        }

        if !opts.enable_llm {
            if let Some(ref vid) = vector_id {
                if let Err(e) = self.store.attach_vector_id(kind, source_id, vid) {
                    return Ingested::Stop(store_error(e));
                }
            }
            return Ingested::Stop(ItemOutcome::SavedRawOnly {
                reason: "llm_disabled",
            });
        }

        Ingested::Enrich { vector_id }
    }

    /// Steps 8–10: editorial, then the one transaction that attaches the
    /// vector reference and writes processed (+ optional short-form).
    ///
    /// Safe to run from a worker pool: a racing writer surfaces as a
    /// conflict, not corruption.
    pub async fn enrich(&self, item: &RawItem, vector_id: Option<&str>) -> ItemOutcome {
        let kind = item.source_kind;
        let source_id = item.source_id.as_str();

        let review = match self.editor.review(&item.title, &item.body, kind).await {
            Ok(review) => review,
            Err(e) => {
                // Editorial failure is a business signal, not a data error:
                // the raw item stays, marked not-relevant with the reason.
                warn!(source_id, error = %e, "editorial failed, keeping item as not relevant");
                let processed = failed_processed(&e);
                return match self.store.commit_enrichment(
                    kind,
                    source_id,
                    vector_id,
                    &processed,
                    None,
                ) {
                    Ok(()) => ItemOutcome::EditorialFailed,
                    Err(StoreError::Conflict { .. }) => ItemOutcome::Conflict,
                    Err(e) => store_error(e),
                };
            }
        };

        let verdict = &review.verdict;
        let processed = NewProcessed {
            is_relevant: verdict.is_relevant,
            relevance_score: verdict.relevance_score,
            relevance_reason: verdict.relevance_reason.clone(),
            original_summary: verdict.original_summary.clone(),
            editorial_title: verdict.editorial_title.clone(),
            editorial_teaser: verdict.editorial_teaser.clone(),
            editorial_body: verdict.editorial_body.clone(),
            image_prompt: verdict.image_prompt.clone(),
            content_type: verdict.content_type.map(|ct| ct.as_str().to_string()),
            model_name: review.model_name.clone(),
            processing_ms: review.processing_ms,
        };

        // 10. short-form render, only for relevant items with real content.
        let mut short_form = None;
        if verdict.is_relevant {
            let title = verdict.editorial_title.as_deref().unwrap_or(&item.title);
            let body = verdict.editorial_body.as_deref().unwrap_or("");
            if body.trim().chars().count() >= self.min_text_length {
                match self.editor.short_form(title, body).await {
                    Ok(draft) => {
                        short_form = Some(NewShortForm {
                            title: draft.title,
                            body: draft.body,
                            hashtags: draft.hashtags,
                            formatted: draft.formatted,
                            char_count: draft.char_count,
                        });
                    }
                    Err(e) => {
                        warn!(source_id, error = %e, "short-form render failed, skipping");
                    }
                }
            }
        }

        match self
            .store
            .commit_enrichment(kind, source_id, vector_id, &processed, short_form.as_ref())
        {
            Ok(()) => ItemOutcome::Saved {
                relevant: verdict.is_relevant,
                short_form: short_form.is_some(),
            },
            Err(StoreError::Conflict { .. }) => {
                info!(source_id, "processed record already written by a racing worker");
                ItemOutcome::Conflict
            }
            Err(e) => store_error(e),
        }
    }
}

fn validate(item: &RawItem) -> Result<(), String> {
    if item.title.trim().chars().count() < MIN_TITLE_CHARS {
        return Err("title too short".to_string());
    }
    let url = item.url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err("malformed url".to_string());
    }
    Ok(())
}

/// Payload stored alongside the vector point: title plus whatever scalars
/// the source attached.
fn vector_payload(item: &RawItem) -> serde_json::Map<String, Value> {
    let mut map = serde_json::Map::new();
    map.insert("title".to_string(), Value::String(item.title.clone()));
    if let Some(ref author) = item.author {
        map.insert("author".to_string(), Value::String(author.clone()));
    }
    for (key, value) in &item.metadata {
        if let Ok(v) = serde_json::to_value(value) {
            map.entry(key.clone()).or_insert(v);
        }
    }
    map
}

fn failed_processed(error: &newsroom_editorial::EditorialError) -> NewProcessed {
    NewProcessed {
        is_relevant: false,
        relevance_score: 0.0,
        relevance_reason: format!("editorial stage failed: {}", error),
        original_summary: None,
        editorial_title: None,
        editorial_teaser: None,
        editorial_body: None,
        image_prompt: None,
        content_type: None,
        model_name: String::new(),
        processing_ms: 0,
    }
}

fn store_error(e: StoreError) -> ItemOutcome {
    ItemOutcome::Error {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;

    use newsroom_core::types::ContentType;
    use newsroom_dedup::DedupCheck;
    use newsroom_editorial::{
        EditorialError, EditorialReview, EditorialVerdict, ShortFormDraft,
    };

    // --- fakes -------------------------------------------------------------

    #[derive(Default)]
    struct FakeDedup {
        /// When set, every check reports a duplicate of this id.
        duplicate_of: Option<(String, f32)>,
        /// When set, checks degrade with this failure text.
        failure: Option<String>,
        remember_fails: bool,
    }

    #[async_trait]
    impl Deduplicator for FakeDedup {
        async fn check(&self, _text: &str, _kind: SourceKind) -> DedupCheck {
            if let Some((id, score)) = &self.duplicate_of {
                return DedupCheck {
                    is_duplicate: true,
                    duplicate_of: Some(id.clone()),
                    score: Some(*score),
                    failure: None,
                };
            }
            DedupCheck {
                failure: self.failure.clone(),
                ..Default::default()
            }
        }

        async fn remember(
            &self,
            _text: &str,
            source_id: &str,
            _metadata: serde_json::Map<String, Value>,
            kind: SourceKind,
        ) -> Option<String> {
            if self.remember_fails {
                None
            } else {
                Some(newsroom_dedup::DedupService::point_id(kind, source_id).to_string())
            }
        }
    }

    struct FakeEditor {
        alive: AtomicBool,
        relevant: bool,
        review_fails: bool,
        short_form_fails: bool,
    }

    impl Default for FakeEditor {
        fn default() -> Self {
            Self {
                alive: AtomicBool::new(true),
                relevant: true,
                review_fails: false,
                short_form_fails: false,
            }
        }
    }

    #[async_trait]
    impl Editor for FakeEditor {
        async fn available(&self) -> bool {
            self.alive.load(Ordering::SeqCst)
        }

        async fn review(
            &self,
            title: &str,
            body: &str,
            kind: SourceKind,
        ) -> Result<EditorialReview, EditorialError> {
            if self.review_fails {
                return Err(EditorialError::EmptyResponse);
            }
            let relevant = self.relevant || kind == SourceKind::TechArticle;
            let score: f32 = if self.relevant { 0.9 } else { 0.3 };
            let score = if kind == SourceKind::TechArticle {
                score.max(0.8)
            } else {
                score
            };
            Ok(EditorialReview {
                verdict: EditorialVerdict {
                    is_relevant: relevant,
                    relevance_score: score,
                    relevance_reason:
                        "Fake editorial verdict with enough words to satisfy reason length rules."
                            .to_string(),
                    original_summary: Some("Summary.".to_string()),
                    editorial_title: relevant.then(|| format!("Edited: {}", title)),
                    editorial_teaser: relevant.then(|| "A teaser.".to_string()),
                    editorial_body: relevant.then(|| format!("Rewritten. {}", body)),
                    image_prompt: relevant.then(|| "An illustration prompt.".to_string()),
                    content_type: relevant.then_some(ContentType::News),
                },
                model_name: "fake-model".to_string(),
                processing_ms: 5,
            })
        }

        async fn short_form(
            &self,
            title: &str,
            _body: &str,
        ) -> Result<ShortFormDraft, EditorialError> {
            if self.short_form_fails {
                return Err(EditorialError::MissingField("formatted"));
            }
            let formatted = format!("**{}**", title);
            Ok(ShortFormDraft {
                title: title.to_string(),
                body: title.to_string(),
                hashtags: vec!["ai".into(), "news".into(), "tech".into()],
                char_count: formatted.chars().count(),
                formatted,
            })
        }
    }

    fn item(kind: SourceKind, source_id: &str) -> RawItem {
        RawItem {
            source_kind: kind,
            source_id: source_id.to_string(),
            title: "New LLM paper: scaling laws revisited".to_string(),
            body: "Authors show that careful data curation beats raw parameter count \
                   across every budget they tried."
                .to_string(),
            url: format!("https://example.com/{}", source_id),
            author: Some("alice".to_string()),
            published_at: None,
            fetched_at: Utc::now(),
            metadata: BTreeMap::new(),
        }
    }

    fn orchestrator(
        store: Arc<RecordStore>,
        dedup: FakeDedup,
        editor: FakeEditor,
    ) -> Orchestrator {
        Orchestrator::new(store, Arc::new(dedup), Arc::new(editor), 50)
    }

    const ALL_ON: ItemOptions = ItemOptions {
        enable_llm: true,
        enable_deduplication: true,
    };

    // --- scenarios ---------------------------------------------------------

    #[tokio::test]
    async fn fresh_unique_item_full_pipeline() {
        let store = Arc::new(RecordStore::open_in_memory().unwrap());
        let orch = orchestrator(store.clone(), FakeDedup::default(), FakeEditor::default());

        let outcome = orch.process_item(&item(SourceKind::ForumPost, "abc123"), ALL_ON).await;
        assert!(matches!(
            outcome,
            ItemOutcome::Saved { relevant: true, short_form: true }
        ));

        let raw = store.get_raw(SourceKind::ForumPost, "abc123").unwrap().unwrap();
        assert!(raw.vector_id.is_some());
        let processed = store
            .get_processed(SourceKind::ForumPost, "abc123")
            .unwrap()
            .unwrap();
        assert!(processed.is_relevant);
        assert!(processed.relevance_score >= 0.6);
        assert!(processed.editorial_title.is_some());
        assert!(processed.image_prompt.is_some());
        let sf = store
            .get_short_form(SourceKind::ForumPost, "abc123")
            .unwrap()
            .unwrap();
        assert!(sf.char_count <= 3500);
        assert!((3..=5).contains(&sf.hashtags.len()));
    }

    #[tokio::test]
    async fn exact_duplicate_stops_without_writes() {
        let store = Arc::new(RecordStore::open_in_memory().unwrap());
        let orch = orchestrator(store.clone(), FakeDedup::default(), FakeEditor::default());

        let first = orch.process_item(&item(SourceKind::ForumPost, "abc123"), ALL_ON).await;
        assert!(matches!(first, ItemOutcome::Saved { .. }));

        let second = orch.process_item(&item(SourceKind::ForumPost, "abc123"), ALL_ON).await;
        assert!(matches!(second, ItemOutcome::DuplicateId));
        assert_eq!(store.count_raw(SourceKind::ForumPost).unwrap(), 1);
        assert_eq!(store.count_processed(SourceKind::ForumPost, false).unwrap(), 1);
    }

    #[tokio::test]
    async fn semantic_duplicate_rolls_back_raw() {
        let store = Arc::new(RecordStore::open_in_memory().unwrap());
        // x1 exists already; the dedup fake flags everything as its duplicate.
        store.insert_raw(&item(SourceKind::ForumPost, "x1")).unwrap();
        let dedup = FakeDedup {
            duplicate_of: Some(("x1".to_string(), 0.97)),
            ..Default::default()
        };
        let orch = orchestrator(store.clone(), dedup, FakeEditor::default());

        let mut second = item(SourceKind::ForumPost, "x2");
        second.title = "OpenAI ships GPT-5 to everyone today".to_string();
        let outcome = orch.process_item(&second, ALL_ON).await;

        match outcome {
            ItemOutcome::SemanticDuplicate { duplicate_of, score } => {
                assert_eq!(duplicate_of, "x1");
                assert!(score >= 0.95);
            }
            other => panic!("expected semantic duplicate, got {:?}", other),
        }
        assert!(!store.exists_raw(SourceKind::ForumPost, "x2").unwrap());
        assert!(store.exists_raw(SourceKind::ForumPost, "x1").unwrap());
    }

    #[tokio::test]
    async fn editorial_failure_keeps_item_as_not_relevant() {
        let store = Arc::new(RecordStore::open_in_memory().unwrap());
        let editor = FakeEditor {
            review_fails: true,
            ..Default::default()
        };
        let orch = orchestrator(store.clone(), FakeDedup::default(), editor);

        let outcome = orch.process_item(&item(SourceKind::ForumPost, "f1"), ALL_ON).await;
        assert!(matches!(outcome, ItemOutcome::EditorialFailed));

        let raw = store.get_raw(SourceKind::ForumPost, "f1").unwrap().unwrap();
        assert!(raw.vector_id.is_some(), "vector backend was alive");
        let processed = store
            .get_processed(SourceKind::ForumPost, "f1")
            .unwrap()
            .unwrap();
        assert!(!processed.is_relevant);
        assert!(processed.relevance_reason.contains("editorial stage failed"));
        assert!(store
            .get_short_form(SourceKind::ForumPost, "f1")
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn llm_backend_down_saves_raw_only() {
        let store = Arc::new(RecordStore::open_in_memory().unwrap());
        let editor = FakeEditor::default();
        editor.alive.store(false, Ordering::SeqCst);
        let orch = orchestrator(store.clone(), FakeDedup::default(), editor);

        let outcome = orch.process_item(&item(SourceKind::ForumPost, "d1"), ALL_ON).await;
        assert!(matches!(
            outcome,
            ItemOutcome::SavedRawOnly { reason: "services_unavailable" }
        ));
        assert!(store.exists_raw(SourceKind::ForumPost, "d1").unwrap());
        assert!(store
            .get_processed(SourceKind::ForumPost, "d1")
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn tech_article_override_keeps_marginal_item() {
        let store = Arc::new(RecordStore::open_in_memory().unwrap());
        let editor = FakeEditor {
            relevant: false, // model would say no
            ..Default::default()
        };
        let orch = orchestrator(store.clone(), FakeDedup::default(), editor);

        let outcome = orch
            .process_item(&item(SourceKind::TechArticle, "h1"), ALL_ON)
            .await;
        assert!(matches!(outcome, ItemOutcome::Saved { relevant: true, .. }));

        let processed = store
            .get_processed(SourceKind::TechArticle, "h1")
            .unwrap()
            .unwrap();
        assert!(processed.is_relevant);
        assert!(processed.relevance_score >= 0.8);
    }

    #[tokio::test]
    async fn short_title_is_dropped_before_any_write() {
        let store = Arc::new(RecordStore::open_in_memory().unwrap());
        let orch = orchestrator(store.clone(), FakeDedup::default(), FakeEditor::default());

        let mut bad = item(SourceKind::ForumPost, "v1");
        bad.title = "hi".to_string();
        bad.body = String::new();
        let outcome = orch.process_item(&bad, ALL_ON).await;

        assert!(matches!(outcome, ItemOutcome::Invalid { .. }));
        assert_eq!(store.count_raw(SourceKind::ForumPost).unwrap(), 0);
    }

    #[tokio::test]
    async fn malformed_url_is_invalid() {
        let store = Arc::new(RecordStore::open_in_memory().unwrap());
        let orch = orchestrator(store.clone(), FakeDedup::default(), FakeEditor::default());

        let mut bad = item(SourceKind::ForumPost, "v2");
        bad.url = "not-a-url".to_string();
        assert!(matches!(
            orch.process_item(&bad, ALL_ON).await,
            ItemOutcome::Invalid { .. }
        ));
    }

    #[tokio::test]
    async fn too_short_text_skips_enrichment_but_keeps_raw() {
        let store = Arc::new(RecordStore::open_in_memory().unwrap());
        let dedup = FakeDedup::default();
        let orch = orchestrator(store.clone(), dedup, FakeEditor::default());

        let mut short = item(SourceKind::ForumPost, "s1");
        short.title = "brief note".to_string();
        short.body = String::new();
        let outcome = orch.process_item(&short, ALL_ON).await;

        assert!(matches!(outcome, ItemOutcome::TooShort));
        assert!(store.exists_raw(SourceKind::ForumPost, "s1").unwrap());
        assert!(store
            .get_processed(SourceKind::ForumPost, "s1")
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn degraded_dedup_check_does_not_block() {
        let store = Arc::new(RecordStore::open_in_memory().unwrap());
        let dedup = FakeDedup {
            failure: Some("vector index refused connection".to_string()),
            remember_fails: true,
            ..Default::default()
        };
        let orch = orchestrator(store.clone(), dedup, FakeEditor::default());

        let outcome = orch.process_item(&item(SourceKind::ForumPost, "g1"), ALL_ON).await;
        assert!(matches!(outcome, ItemOutcome::Saved { .. }));
        let raw = store.get_raw(SourceKind::ForumPost, "g1").unwrap().unwrap();
        assert!(raw.vector_id.is_none(), "item persists un-vectorized");
    }

    #[tokio::test]
    async fn dedup_disabled_skips_gate_and_vectorization() {
        let store = Arc::new(RecordStore::open_in_memory().unwrap());
        let dedup = FakeDedup {
            duplicate_of: Some(("other".to_string(), 0.99)),
            ..Default::default()
        };
        let orch = orchestrator(store.clone(), dedup, FakeEditor::default());

        let opts = ItemOptions {
            enable_llm: true,
            enable_deduplication: false,
        };
        let outcome = orch.process_item(&item(SourceKind::ForumPost, "n1"), opts).await;
        // a would-be duplicate sails through because the gate is off
        assert!(matches!(outcome, ItemOutcome::Saved { .. }));
        let raw = store.get_raw(SourceKind::ForumPost, "n1").unwrap().unwrap();
        assert!(raw.vector_id.is_none());
    }

    #[tokio::test]
    async fn llm_disabled_saves_with_vector_only() {
        let store = Arc::new(RecordStore::open_in_memory().unwrap());
        let orch = orchestrator(store.clone(), FakeDedup::default(), FakeEditor::default());

        let opts = ItemOptions {
            enable_llm: false,
            enable_deduplication: true,
        };
        let outcome = orch.process_item(&item(SourceKind::ForumPost, "r1"), opts).await;
        assert!(matches!(
            outcome,
            ItemOutcome::SavedRawOnly { reason: "llm_disabled" }
        ));
        let raw = store.get_raw(SourceKind::ForumPost, "r1").unwrap().unwrap();
        assert!(raw.vector_id.is_some());
        assert!(store
            .get_processed(SourceKind::ForumPost, "r1")
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn both_toggles_off_is_base_mode() {
        let store = Arc::new(RecordStore::open_in_memory().unwrap());
        let dedup = FakeDedup::default();
        let orch = orchestrator(store.clone(), dedup, FakeEditor::default());

        let opts = ItemOptions {
            enable_llm: false,
            enable_deduplication: false,
        };
        let outcome = orch.process_item(&item(SourceKind::ForumPost, "b1"), opts).await;
        assert!(matches!(
            outcome,
            ItemOutcome::SavedRawOnly { reason: "enrichment_disabled" }
        ));
    }

    #[tokio::test]
    async fn short_form_failure_still_saves_processed() {
        let store = Arc::new(RecordStore::open_in_memory().unwrap());
        let editor = FakeEditor {
            short_form_fails: true,
            ..Default::default()
        };
        let orch = orchestrator(store.clone(), FakeDedup::default(), editor);

        let outcome = orch.process_item(&item(SourceKind::ForumPost, "sf1"), ALL_ON).await;
        assert!(matches!(
            outcome,
            ItemOutcome::Saved { relevant: true, short_form: false }
        ));
        assert!(store
            .get_short_form(SourceKind::ForumPost, "sf1")
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn racing_enrichment_loses_cleanly() {
        let store = Arc::new(RecordStore::open_in_memory().unwrap());
        let orch = orchestrator(store.clone(), FakeDedup::default(), FakeEditor::default());

        let it = item(SourceKind::ForumPost, "race1");
        // ingest once, then run the enrichment phase twice as two workers would
        let vector_id = match orch.ingest(&it, ALL_ON).await {
            Ingested::Enrich { vector_id } => vector_id,
            _ => panic!("expected enrich handoff"),
        };

        let first = orch.enrich(&it, vector_id.as_deref()).await;
        assert!(matches!(first, ItemOutcome::Saved { .. }));
        let second = orch.enrich(&it, vector_id.as_deref()).await;
        assert!(matches!(second, ItemOutcome::Conflict));

        // exactly one processed record exists
        assert_eq!(store.count_processed(SourceKind::ForumPost, false).unwrap(), 1);
    }
}
