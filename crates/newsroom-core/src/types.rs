use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source family an item was ingested from.
///
/// Each kind has its own vector collection and its own relevance policy
/// (see the editorial service's tech-article override).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    ForumPost,
    TechArticle,
    ChatMessage,
    BlogArticle,
}

impl SourceKind {
    pub const ALL: [SourceKind; 4] = [
        SourceKind::ForumPost,
        SourceKind::TechArticle,
        SourceKind::ChatMessage,
        SourceKind::BlogArticle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::ForumPost => "forum_post",
            SourceKind::TechArticle => "tech_article",
            SourceKind::ChatMessage => "chat_message",
            SourceKind::BlogArticle => "blog_article",
        }
    }

    /// Name of the vector collection holding embeddings for this kind.
    pub fn collection_name(&self) -> &'static str {
        match self {
            SourceKind::ForumPost => "forum_posts",
            SourceKind::TechArticle => "tech_articles",
            SourceKind::ChatMessage => "chat_messages",
            SourceKind::BlogArticle => "blog_articles",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "forum_post" => Ok(SourceKind::ForumPost),
            "tech_article" => Ok(SourceKind::TechArticle),
            "chat_message" => Ok(SourceKind::ChatMessage),
            "blog_article" => Ok(SourceKind::BlogArticle),
            other => Err(format!("unknown source kind: {}", other)),
        }
    }
}

/// Scalar metadata value attached to a raw item (score, tags, channel, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        MetaValue::Text(s.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        MetaValue::Text(s)
    }
}

impl From<i64> for MetaValue {
    fn from(v: i64) -> Self {
        MetaValue::Int(v)
    }
}

impl From<bool> for MetaValue {
    fn from(v: bool) -> Self {
        MetaValue::Bool(v)
    }
}

/// Normalized output of any source driver. `(source_kind, source_id)` is the
/// item's identity everywhere downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawItem {
    pub source_kind: SourceKind,
    pub source_id: String,
    pub title: String,
    pub body: String,
    pub url: String,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub fetched_at: DateTime<Utc>,
    /// Source-specific scalars: score, tags, channel name, views, etc.
    /// BTreeMap keeps serialization order stable.
    pub metadata: BTreeMap<String, MetaValue>,
}

impl RawItem {
    /// Title and body joined the way the dedup and editorial stages see it.
    pub fn combined_text(&self) -> String {
        if self.body.is_empty() {
            self.title.clone()
        } else {
            format!("{}\n\n{}", self.title, self.body)
        }
    }
}

/// Editorial content classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    News,
    Research,
    Tutorial,
    Humor,
    Discussion,
    Meme,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::News => "news",
            ContentType::Research => "research",
            ContentType::Tutorial => "tutorial",
            ContentType::Humor => "humor",
            ContentType::Discussion => "discussion",
            ContentType::Meme => "meme",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    /// Tolerant mapping of model-produced labels. Unknown labels fall back
    /// to `Discussion` at the call site, not here.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "news" | "article" | "announcement" => Ok(ContentType::News),
            "research" | "paper" | "science" => Ok(ContentType::Research),
            "tutorial" | "guide" | "howto" | "how-to" => Ok(ContentType::Tutorial),
            "humor" | "humour" | "joke" | "funny" => Ok(ContentType::Humor),
            "discussion" | "question" | "opinion" => Ok(ContentType::Discussion),
            "meme" | "shitpost" => Ok(ContentType::Meme),
            other => Err(format!("unknown content type: {}", other)),
        }
    }
}

/// Per-job counters. Strictly monotone while a job runs; the final values
/// become the job's `result` map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeCounters {
    /// New items persisted.
    pub saved: u32,
    /// Dropped before any write: validation failures, exact duplicates,
    /// write-time unique-constraint conflicts.
    pub skipped: u32,
    /// Items rolled back after a near-neighbor hit above the threshold.
    pub semantic_duplicates: u32,
    /// Items that made it through the editorial stage as relevant.
    pub editorial_processed: u32,
    /// Record-store failures; the job continues with the next item.
    pub errors: u32,
}

impl ScrapeCounters {
    pub fn merge(&mut self, other: &ScrapeCounters) {
        self.saved += other.saved;
        self.skipped += other.skipped;
        self.semantic_duplicates += other.semantic_duplicates;
        self.editorial_processed += other.editorial_processed;
        self.errors += other.errors;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_kind_round_trips_through_str() {
        for kind in SourceKind::ALL {
            assert_eq!(kind.as_str().parse::<SourceKind>().unwrap(), kind);
        }
    }

    #[test]
    fn source_kind_rejects_unknown() {
        assert!("rss_feed".parse::<SourceKind>().is_err());
    }

    #[test]
    fn collection_names_are_distinct() {
        let names: std::collections::HashSet<_> =
            SourceKind::ALL.iter().map(|k| k.collection_name()).collect();
        assert_eq!(names.len(), SourceKind::ALL.len());
    }

    #[test]
    fn content_type_tolerates_label_variants() {
        assert_eq!("How-To".parse::<ContentType>().unwrap(), ContentType::Tutorial);
        assert_eq!("PAPER".parse::<ContentType>().unwrap(), ContentType::Research);
        assert!("poetry".parse::<ContentType>().is_err());
    }

    #[test]
    fn combined_text_skips_separator_for_empty_body() {
        let mut item = sample_item();
        item.body.clear();
        assert_eq!(item.combined_text(), item.title);
    }

    #[test]
    fn counters_merge_adds_fields() {
        let mut a = ScrapeCounters {
            saved: 2,
            skipped: 1,
            ..Default::default()
        };
        let b = ScrapeCounters {
            saved: 3,
            errors: 1,
            ..Default::default()
        };
        a.merge(&b);
        assert_eq!(a.saved, 5);
        assert_eq!(a.skipped, 1);
        assert_eq!(a.errors, 1);
    }

    fn sample_item() -> RawItem {
        RawItem {
            source_kind: SourceKind::ForumPost,
            source_id: "abc123".into(),
            title: "New LLM paper".into(),
            body: "Authors show something.".into(),
            url: "https://example.com/abc123".into(),
            author: Some("alice".into()),
            published_at: None,
            fetched_at: Utc::now(),
            metadata: BTreeMap::new(),
        }
    }
}
