use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row};
use tracing::{debug, info};

use newsroom_core::types::{MetaValue, RawItem, SourceKind};

use crate::db::init_db;
use crate::error::{Result, StoreError};
use crate::types::{ProcessedRecord, RawRecord, ShortFormRecord, SourceStats, StoreStats};

/// Processed-item fields as the pipeline hands them over (no row id yet).
#[derive(Debug, Clone)]
pub struct NewProcessed {
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
}

#[derive(Debug, Clone)]
pub struct NewShortForm {
    pub title: String,
    pub body: String,
    pub hashtags: Vec<String>,
    pub formatted: String,
    pub char_count: usize,
}

/// Thread-safe record store over one SQLite connection.
///
/// A Mutex around the connection is sufficient for the single-node target;
/// concurrency safety beyond that relies on the unique constraint on
/// `(source_kind, source_id)` rather than process-wide locks.
pub struct RecordStore {
    db: Mutex<Connection>,
}

impl RecordStore {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        init_db(&conn)?;
        info!(path, "record store opened");
        Ok(Self { db: Mutex::new(conn) })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_db(&conn)?;
        Ok(Self { db: Mutex::new(conn) })
    }

    // --- raw items ---------------------------------------------------------

    pub fn exists_raw(&self, kind: SourceKind, source_id: &str) -> Result<bool> {
        let db = self.db.lock().unwrap();
        let count: i64 = db.query_row(
            "SELECT COUNT(*) FROM raw_items WHERE source_kind = ?1 AND source_id = ?2",
            rusqlite::params![kind.as_str(), source_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Insert a raw item. A `(source_kind, source_id)` collision comes back
    /// as [`StoreError::Conflict`].
    pub fn insert_raw(&self, item: &RawItem) -> Result<i64> {
        let db = self.db.lock().unwrap();
        let metadata = serde_json::to_string(&item.metadata)?;
        db.execute(
            "INSERT INTO raw_items
             (source_kind, source_id, title, body, url, author,
              published_at, fetched_at, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                item.source_kind.as_str(),
                item.source_id,
                item.title,
                item.body,
                item.url,
                item.author,
                item.published_at.map(|t| t.to_rfc3339()),
                item.fetched_at.to_rfc3339(),
                metadata,
            ],
        )
        .map_err(|e| annotate_conflict(e, &item.source_id))?;
        let id = db.last_insert_rowid();
        debug!(source_id = %item.source_id, id, "raw item persisted");
        Ok(id)
    }

    pub fn get_raw(&self, kind: SourceKind, source_id: &str) -> Result<Option<RawRecord>> {
        let db = self.db.lock().unwrap();
        match db.query_row(
            &format!("{} WHERE source_kind = ?1 AND source_id = ?2", RAW_SELECT),
            rusqlite::params![kind.as_str(), source_id],
            row_to_raw,
        ) {
            Ok(r) => Ok(Some(r)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Newest-first listing. `filter` does a substring match over the
    /// metadata JSON (board, hub, channel, tag, whatever the source wrote).
    pub fn list_raw(
        &self,
        kind: SourceKind,
        limit: usize,
        offset: usize,
        filter: Option<&str>,
    ) -> Result<Vec<RawRecord>> {
        let db = self.db.lock().unwrap();
        let pattern = filter.map(|f| format!("%{}%", f));
        let mut stmt = db.prepare(&format!(
            "{} WHERE source_kind = ?1 AND (?2 IS NULL OR metadata LIKE ?2)
             ORDER BY fetched_at DESC LIMIT ?3 OFFSET ?4",
            RAW_SELECT
        ))?;
        let rows = stmt.query_map(
            rusqlite::params![kind.as_str(), pattern, limit as i64, offset as i64],
            row_to_raw,
        )?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn count_raw(&self, kind: SourceKind) -> Result<u64> {
        let db = self.db.lock().unwrap();
        let count: i64 = db.query_row(
            "SELECT COUNT(*) FROM raw_items WHERE source_kind = ?1",
            [kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Remove a raw item (the semantic-duplicate rollback).
    pub fn delete_raw(&self, kind: SourceKind, source_id: &str) -> Result<()> {
        let db = self.db.lock().unwrap();
        let n = db.execute(
            "DELETE FROM raw_items WHERE source_kind = ?1 AND source_id = ?2",
            rusqlite::params![kind.as_str(), source_id],
        )?;
        if n == 0 {
            return Err(StoreError::NotFound {
                source_id: source_id.to_string(),
            });
        }
        debug!(source_id, "raw item rolled back");
        Ok(())
    }

    pub fn attach_vector_id(
        &self,
        kind: SourceKind,
        source_id: &str,
        vector_id: &str,
    ) -> Result<()> {
        let db = self.db.lock().unwrap();
        let n = db.execute(
            "UPDATE raw_items SET vector_id = ?1
             WHERE source_kind = ?2 AND source_id = ?3",
            rusqlite::params![vector_id, kind.as_str(), source_id],
        )?;
        if n == 0 {
            return Err(StoreError::NotFound {
                source_id: source_id.to_string(),
            });
        }
        Ok(())
    }

    // --- enrichment transaction --------------------------------------------

    /// Attach the vector reference, insert the processed record, and insert
    /// the optional short-form record, atomically. Either everything lands
    /// or nothing does: a failure (including a processed-row conflict from a
    /// racing worker) leaves the raw item exactly as it was.
    pub fn commit_enrichment(
        &self,
        kind: SourceKind,
        source_id: &str,
        vector_id: Option<&str>,
        processed: &NewProcessed,
        short_form: Option<&NewShortForm>,
    ) -> Result<()> {
        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;

        if let Some(vid) = vector_id {
            tx.execute(
                "UPDATE raw_items SET vector_id = ?1
                 WHERE source_kind = ?2 AND source_id = ?3",
                rusqlite::params![vid, kind.as_str(), source_id],
            )?;
        }

        tx.execute(
            "INSERT INTO processed_items
             (source_kind, source_id, is_relevant, relevance_score, relevance_reason,
              original_summary, editorial_title, editorial_teaser, editorial_body,
              image_prompt, content_type, model_name, processing_ms, processed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            rusqlite::params![
                kind.as_str(),
                source_id,
                processed.is_relevant,
                processed.relevance_score as f64,
                processed.relevance_reason,
                processed.original_summary,
                processed.editorial_title,
                processed.editorial_teaser,
                processed.editorial_body,
                processed.image_prompt,
                processed.content_type,
                processed.model_name,
                processed.processing_ms as i64,
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e| annotate_conflict(e, source_id))?;

        if let Some(sf) = short_form {
            let hashtags = serde_json::to_string(&sf.hashtags)?;
            tx.execute(
                "INSERT INTO short_form_items
                 (source_kind, source_id, title, body, hashtags, formatted,
                  char_count, created_at, is_published)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0)",
                rusqlite::params![
                    kind.as_str(),
                    source_id,
                    sf.title,
                    sf.body,
                    hashtags,
                    sf.formatted,
                    sf.char_count as i64,
                    Utc::now().to_rfc3339(),
                ],
            )
            .map_err(|e| annotate_conflict(e, source_id))?;
        }

        tx.commit()?;
        debug!(source_id, "enrichment committed");
        Ok(())
    }

    // --- processed items ---------------------------------------------------

    pub fn exists_processed(&self, kind: SourceKind, source_id: &str) -> Result<bool> {
        let db = self.db.lock().unwrap();
        let count: i64 = db.query_row(
            "SELECT COUNT(*) FROM processed_items
             WHERE source_kind = ?1 AND source_id = ?2",
            rusqlite::params![kind.as_str(), source_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn get_processed(
        &self,
        kind: SourceKind,
        source_id: &str,
    ) -> Result<Option<ProcessedRecord>> {
        let db = self.db.lock().unwrap();
        match db.query_row(
            &format!(
                "{} WHERE source_kind = ?1 AND source_id = ?2",
                PROCESSED_SELECT
            ),
            rusqlite::params![kind.as_str(), source_id],
            row_to_processed,
        ) {
            Ok(r) => Ok(Some(r)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_processed(
        &self,
        kind: SourceKind,
        limit: usize,
        offset: usize,
        only_relevant: bool,
    ) -> Result<Vec<ProcessedRecord>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(&format!(
            "{} WHERE source_kind = ?1 AND (?2 = 0 OR is_relevant = 1)
             ORDER BY processed_at DESC LIMIT ?3 OFFSET ?4",
            PROCESSED_SELECT
        ))?;
        let rows = stmt.query_map(
            rusqlite::params![kind.as_str(), only_relevant, limit as i64, offset as i64],
            row_to_processed,
        )?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn count_processed(&self, kind: SourceKind, only_relevant: bool) -> Result<u64> {
        let db = self.db.lock().unwrap();
        let count: i64 = db.query_row(
            "SELECT COUNT(*) FROM processed_items
             WHERE source_kind = ?1 AND (?2 = 0 OR is_relevant = 1)",
            rusqlite::params![kind.as_str(), only_relevant],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub fn delete_processed(&self, kind: SourceKind, source_id: &str) -> Result<()> {
        let db = self.db.lock().unwrap();
        let n = db.execute(
            "DELETE FROM processed_items WHERE source_kind = ?1 AND source_id = ?2",
            rusqlite::params![kind.as_str(), source_id],
        )?;
        if n == 0 {
            return Err(StoreError::NotFound {
                source_id: source_id.to_string(),
            });
        }
        Ok(())
    }

    // --- short-form items --------------------------------------------------

    pub fn exists_short_form(&self, kind: SourceKind, source_id: &str) -> Result<bool> {
        let db = self.db.lock().unwrap();
        let count: i64 = db.query_row(
            "SELECT COUNT(*) FROM short_form_items
             WHERE source_kind = ?1 AND source_id = ?2",
            rusqlite::params![kind.as_str(), source_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn delete_short_form(&self, kind: SourceKind, source_id: &str) -> Result<()> {
        let db = self.db.lock().unwrap();
        let n = db.execute(
            "DELETE FROM short_form_items WHERE source_kind = ?1 AND source_id = ?2",
            rusqlite::params![kind.as_str(), source_id],
        )?;
        if n == 0 {
            return Err(StoreError::NotFound {
                source_id: source_id.to_string(),
            });
        }
        Ok(())
    }

    pub fn get_short_form(
        &self,
        kind: SourceKind,
        source_id: &str,
    ) -> Result<Option<ShortFormRecord>> {
        let db = self.db.lock().unwrap();
        match db.query_row(
            &format!(
                "{} WHERE source_kind = ?1 AND source_id = ?2",
                SHORT_FORM_SELECT
            ),
            rusqlite::params![kind.as_str(), source_id],
            row_to_short_form,
        ) {
            Ok(r) => Ok(Some(r)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_short_form(
        &self,
        kind: SourceKind,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ShortFormRecord>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(&format!(
            "{} WHERE source_kind = ?1 ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
            SHORT_FORM_SELECT
        ))?;
        let rows = stmt.query_map(
            rusqlite::params![kind.as_str(), limit as i64, offset as i64],
            row_to_short_form,
        )?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn count_short_form(&self, kind: SourceKind) -> Result<u64> {
        let db = self.db.lock().unwrap();
        let count: i64 = db.query_row(
            "SELECT COUNT(*) FROM short_form_items WHERE source_kind = ?1",
            [kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// The only post-insert mutation short-form records get: publication
    /// state, both fields together so the publish invariant holds.
    pub fn mark_published(
        &self,
        kind: SourceKind,
        source_id: &str,
        platform_message_id: i64,
    ) -> Result<()> {
        let db = self.db.lock().unwrap();
        let n = db.execute(
            "UPDATE short_form_items
             SET is_published = 1, published_at = ?1, platform_message_id = ?2
             WHERE source_kind = ?3 AND source_id = ?4",
            rusqlite::params![
                Utc::now().to_rfc3339(),
                platform_message_id,
                kind.as_str(),
                source_id
            ],
        )?;
        if n == 0 {
            return Err(StoreError::NotFound {
                source_id: source_id.to_string(),
            });
        }
        Ok(())
    }

    // --- statistics --------------------------------------------------------

    pub fn stats(&self) -> Result<StoreStats> {
        let db = self.db.lock().unwrap();
        let mut per_source = BTreeMap::new();
        let mut total = 0u64;

        for kind in SourceKind::ALL {
            let raw_count: i64 = db.query_row(
                "SELECT COUNT(*) FROM raw_items WHERE source_kind = ?1",
                [kind.as_str()],
                |row| row.get(0),
            )?;
            let processed_count: i64 = db.query_row(
                "SELECT COUNT(*) FROM processed_items WHERE source_kind = ?1",
                [kind.as_str()],
                |row| row.get(0),
            )?;
            let relevant_count: i64 = db.query_row(
                "SELECT COUNT(*) FROM processed_items
                 WHERE source_kind = ?1 AND is_relevant = 1",
                [kind.as_str()],
                |row| row.get(0),
            )?;
            let short_form_count: i64 = db.query_row(
                "SELECT COUNT(*) FROM short_form_items WHERE source_kind = ?1",
                [kind.as_str()],
                |row| row.get(0),
            )?;
            let latest: Option<String> = db
                .query_row(
                    "SELECT fetched_at FROM raw_items
                     WHERE source_kind = ?1 ORDER BY fetched_at DESC LIMIT 1",
                    [kind.as_str()],
                    |row| row.get(0),
                )
                .ok();

            total += (raw_count + processed_count + short_form_count) as u64;
            per_source.insert(
                kind.as_str().to_string(),
                SourceStats {
                    raw_count: raw_count as u64,
                    processed_count: processed_count as u64,
                    relevant_count: relevant_count as u64,
                    short_form_count: short_form_count as u64,
                    latest_fetched_at: latest.and_then(|s| parse_ts(&s)),
                },
            );
        }

        Ok(StoreStats {
            total_items: total,
            per_source,
        })
    }
}

const RAW_SELECT: &str = "SELECT id, source_kind, source_id, title, body, url, author,
        published_at, fetched_at, metadata, vector_id FROM raw_items";

const PROCESSED_SELECT: &str = "SELECT id, source_kind, source_id, is_relevant, relevance_score,
        relevance_reason, original_summary, editorial_title, editorial_teaser,
        editorial_body, image_prompt, content_type, model_name, processing_ms,
        processed_at FROM processed_items";

const SHORT_FORM_SELECT: &str = "SELECT id, source_kind, source_id, title, body, hashtags,
        formatted, char_count, created_at, published_at, platform_message_id,
        is_published FROM short_form_items";

/// Carry the offending source_id into conflict errors; the generic From impl
/// cannot know it.
fn annotate_conflict(e: rusqlite::Error, source_id: &str) -> StoreError {
    match StoreError::from(e) {
        StoreError::Conflict { .. } => StoreError::Conflict {
            source_id: source_id.to_string(),
        },
        other => other,
    }
}

fn parse_ts(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn row_to_raw(row: &Row<'_>) -> rusqlite::Result<RawRecord> {
    let kind_str: String = row.get(1)?;
    let published_at: Option<String> = row.get(7)?;
    let fetched_at: String = row.get(8)?;
    let metadata_json: String = row.get(9)?;
    Ok(RawRecord {
        id: row.get(0)?,
        source_kind: kind_str.parse().unwrap_or(SourceKind::ForumPost),
        source_id: row.get(2)?,
        title: row.get(3)?,
        body: row.get(4)?,
        url: row.get(5)?,
        author: row.get(6)?,
        published_at: published_at.as_deref().and_then(parse_ts),
        fetched_at: parse_ts(&fetched_at).unwrap_or_default(),
        metadata: serde_json::from_str::<BTreeMap<String, MetaValue>>(&metadata_json)
            .unwrap_or_default(),
        vector_id: row.get(10)?,
    })
}

fn row_to_processed(row: &Row<'_>) -> rusqlite::Result<ProcessedRecord> {
    let kind_str: String = row.get(1)?;
    let processed_at: String = row.get(14)?;
    let processing_ms: i64 = row.get(13)?;
    let relevance_score: f64 = row.get(4)?;
    Ok(ProcessedRecord {
        id: row.get(0)?,
        source_kind: kind_str.parse().unwrap_or(SourceKind::ForumPost),
        source_id: row.get(2)?,
        is_relevant: row.get(3)?,
        relevance_score: relevance_score as f32,
        relevance_reason: row.get(5)?,
        original_summary: row.get(6)?,
        editorial_title: row.get(7)?,
        editorial_teaser: row.get(8)?,
        editorial_body: row.get(9)?,
        image_prompt: row.get(10)?,
        content_type: row.get(11)?,
        model_name: row.get(12)?,
        processing_ms: processing_ms as u64,
        processed_at: parse_ts(&processed_at).unwrap_or_default(),
    })
}

fn row_to_short_form(row: &Row<'_>) -> rusqlite::Result<ShortFormRecord> {
    let kind_str: String = row.get(1)?;
    let hashtags_json: String = row.get(5)?;
    let char_count: i64 = row.get(7)?;
    let created_at: String = row.get(8)?;
    let published_at: Option<String> = row.get(9)?;
    Ok(ShortFormRecord {
        id: row.get(0)?,
        source_kind: kind_str.parse().unwrap_or(SourceKind::ForumPost),
        source_id: row.get(2)?,
        title: row.get(3)?,
        body: row.get(4)?,
        hashtags: serde_json::from_str(&hashtags_json).unwrap_or_default(),
        formatted: row.get(6)?,
        char_count: char_count as usize,
        created_at: parse_ts(&created_at).unwrap_or_default(),
        published_at: published_at.as_deref().and_then(parse_ts),
        platform_message_id: row.get(10)?,
        is_published: row.get(11)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use newsroom_core::types::MetaValue;

    fn item(kind: SourceKind, source_id: &str) -> RawItem {
        let mut metadata = BTreeMap::new();
        metadata.insert("board".to_string(), MetaValue::from("rust"));
        metadata.insert("score".to_string(), MetaValue::from(42i64));
        RawItem {
            source_kind: kind,
            source_id: source_id.to_string(),
            title: "New LLM paper: attention is enough".to_string(),
            body: "Authors show a surprisingly small model matching the baseline.".to_string(),
            url: format!("https://example.com/{}", source_id),
            author: Some("alice".to_string()),
            published_at: None,
            fetched_at: Utc::now(),
            metadata,
        }
    }

    fn processed(relevant: bool) -> NewProcessed {
        NewProcessed {
            is_relevant: relevant,
            relevance_score: if relevant { 0.9 } else { 0.2 },
            relevance_reason: "Reason text long enough to satisfy the minimum word count rule."
                .to_string(),
            original_summary: Some("A summary.".to_string()),
            editorial_title: relevant.then(|| "Edited title".to_string()),
            editorial_teaser: relevant.then(|| "Teaser.".to_string()),
            editorial_body: relevant.then(|| "Edited body.".to_string()),
            image_prompt: relevant.then(|| "An illustration.".to_string()),
            content_type: relevant.then(|| "news".to_string()),
            model_name: "gpt-oss:20b".to_string(),
            processing_ms: 1200,
        }
    }

    fn short_form() -> NewShortForm {
        NewShortForm {
            title: "Short title".to_string(),
            body: "Short body.".to_string(),
            hashtags: vec!["ai".into(), "llm".into(), "research".into()],
            formatted: "**Short body.**".to_string(),
            char_count: 15,
        }
    }

    #[test]
    fn insert_and_get_raw_round_trip() {
        let store = RecordStore::open_in_memory().unwrap();
        store.insert_raw(&item(SourceKind::ForumPost, "abc123")).unwrap();

        let rec = store
            .get_raw(SourceKind::ForumPost, "abc123")
            .unwrap()
            .unwrap();
        assert_eq!(rec.source_id, "abc123");
        assert_eq!(rec.metadata.get("board"), Some(&MetaValue::from("rust")));
        assert!(rec.vector_id.is_none());
    }

    #[test]
    fn duplicate_insert_is_a_conflict() {
        let store = RecordStore::open_in_memory().unwrap();
        store.insert_raw(&item(SourceKind::ForumPost, "abc123")).unwrap();
        let err = store
            .insert_raw(&item(SourceKind::ForumPost, "abc123"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { ref source_id } if source_id == "abc123"));
        // same id under a different kind is fine
        store.insert_raw(&item(SourceKind::BlogArticle, "abc123")).unwrap();
    }

    #[test]
    fn delete_raw_rolls_back() {
        let store = RecordStore::open_in_memory().unwrap();
        store.insert_raw(&item(SourceKind::ForumPost, "x2")).unwrap();
        store.delete_raw(SourceKind::ForumPost, "x2").unwrap();
        assert!(!store.exists_raw(SourceKind::ForumPost, "x2").unwrap());
        assert!(store.delete_raw(SourceKind::ForumPost, "x2").is_err());
    }

    #[test]
    fn enrichment_commits_all_three_writes() {
        let store = RecordStore::open_in_memory().unwrap();
        store.insert_raw(&item(SourceKind::ForumPost, "abc123")).unwrap();

        store
            .commit_enrichment(
                SourceKind::ForumPost,
                "abc123",
                Some("9f2c1a00-0000-5000-8000-000000000001"),
                &processed(true),
                Some(&short_form()),
            )
            .unwrap();

        let raw = store.get_raw(SourceKind::ForumPost, "abc123").unwrap().unwrap();
        assert!(raw.vector_id.is_some());
        let proc = store
            .get_processed(SourceKind::ForumPost, "abc123")
            .unwrap()
            .unwrap();
        assert!(proc.is_relevant);
        let sf = store
            .get_short_form(SourceKind::ForumPost, "abc123")
            .unwrap()
            .unwrap();
        assert_eq!(sf.hashtags.len(), 3);
        assert!(!sf.is_published);
    }

    #[test]
    fn enrichment_conflict_leaves_raw_untouched() {
        let store = RecordStore::open_in_memory().unwrap();
        store.insert_raw(&item(SourceKind::ForumPost, "abc123")).unwrap();

        // first worker wins
        store
            .commit_enrichment(SourceKind::ForumPost, "abc123", None, &processed(false), None)
            .unwrap();

        // second worker: processed insert conflicts, vector attach must not stick
        let err = store
            .commit_enrichment(
                SourceKind::ForumPost,
                "abc123",
                Some("9f2c1a00-0000-5000-8000-000000000002"),
                &processed(true),
                Some(&short_form()),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        let raw = store.get_raw(SourceKind::ForumPost, "abc123").unwrap().unwrap();
        assert!(raw.vector_id.is_none(), "rolled-back tx must not attach vector_id");
        assert!(store
            .get_short_form(SourceKind::ForumPost, "abc123")
            .unwrap()
            .is_none());
    }

    #[test]
    fn list_raw_filter_matches_metadata() {
        let store = RecordStore::open_in_memory().unwrap();
        store.insert_raw(&item(SourceKind::ForumPost, "a1")).unwrap();
        let mut other = item(SourceKind::ForumPost, "a2");
        other.metadata.insert("board".into(), MetaValue::from("python"));
        store.insert_raw(&other).unwrap();

        let rust_only = store
            .list_raw(SourceKind::ForumPost, 10, 0, Some("rust"))
            .unwrap();
        assert_eq!(rust_only.len(), 1);
        assert_eq!(rust_only[0].source_id, "a1");

        let all = store.list_raw(SourceKind::ForumPost, 10, 0, None).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn mark_published_sets_all_publish_fields() {
        let store = RecordStore::open_in_memory().unwrap();
        store.insert_raw(&item(SourceKind::ForumPost, "p1")).unwrap();
        store
            .commit_enrichment(
                SourceKind::ForumPost,
                "p1",
                None,
                &processed(true),
                Some(&short_form()),
            )
            .unwrap();

        store.mark_published(SourceKind::ForumPost, "p1", 777).unwrap();
        let sf = store
            .get_short_form(SourceKind::ForumPost, "p1")
            .unwrap()
            .unwrap();
        assert!(sf.is_published);
        assert_eq!(sf.platform_message_id, Some(777));
        assert!(sf.published_at.is_some());
    }

    #[test]
    fn stats_counts_per_kind() {
        let store = RecordStore::open_in_memory().unwrap();
        store.insert_raw(&item(SourceKind::ForumPost, "s1")).unwrap();
        store.insert_raw(&item(SourceKind::TechArticle, "s2")).unwrap();
        store
            .commit_enrichment(SourceKind::ForumPost, "s1", None, &processed(true), None)
            .unwrap();

        let stats = store.stats().unwrap();
        let forum = &stats.per_source["forum_post"];
        assert_eq!(forum.raw_count, 1);
        assert_eq!(forum.processed_count, 1);
        assert_eq!(forum.relevant_count, 1);
        assert!(forum.latest_fetched_at.is_some());
        let tech = &stats.per_source["tech_article"];
        assert_eq!(tech.raw_count, 1);
        assert_eq!(tech.processed_count, 0);
    }
}
