//! Link-aggregator forum driver.
//!
//! Pulls the newest posts per board from the forum's public JSON listing
//! (`/r/{board}/new.json`) and normalises them. Self-posts carry their text
//! in `selftext`; link posts have an empty body.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use newsroom_core::types::{MetaValue, RawItem, SourceKind};

use crate::driver::{get_json, pace, MonotoneClock, SourceDriver};
use crate::error::FetchError;

/// Per-request page size; the listing endpoint caps at 100.
const PAGE_LIMIT: usize = 100;

pub struct ForumDriver {
    client: reqwest::Client,
    base_url: String,
    delay_ms: u64,
    timeout: Duration,
}

impl ForumDriver {
    pub fn new(base_url: &str, delay_ms: u64, timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("newsroom-aggregator/0.3")
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
            delay_ms,
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

#[async_trait]
impl SourceDriver for ForumDriver {
    fn kind(&self) -> SourceKind {
        SourceKind::ForumPost
    }

    async fn fetch(
        &self,
        filters: &[String],
        max_items: usize,
    ) -> Result<Vec<RawItem>, FetchError> {
        let mut items = Vec::new();
        let mut clock = MonotoneClock::new();

        for (i, board) in filters.iter().enumerate() {
            if items.len() >= max_items {
                break;
            }
            if i > 0 {
                pace(self.delay_ms).await;
            }

            let url = format!(
                "{}/r/{}/new.json?limit={}",
                self.base_url,
                board,
                PAGE_LIMIT.min(max_items)
            );
            debug!(board = %board, "fetching forum listing");
            let listing: Listing = get_json(&self.client, &url, self.timeout).await?;

            for child in listing.data.children {
                if items.len() >= max_items {
                    break;
                }
                items.push(normalize(child.data, board, clock.next()));
            }
        }

        debug!(count = items.len(), "forum fetch complete");
        Ok(items)
    }
}

fn normalize(post: Post, board: &str, fetched_at: DateTime<Utc>) -> RawItem {
    let mut metadata = BTreeMap::new();
    metadata.insert("board".to_string(), MetaValue::from(board));
    metadata.insert("score".to_string(), MetaValue::from(post.score));
    metadata.insert("num_comments".to_string(), MetaValue::from(post.num_comments));
    metadata.insert("is_self".to_string(), MetaValue::from(post.is_self));
    if let Some(flair) = post.link_flair_text {
        metadata.insert("flair".to_string(), MetaValue::from(flair));
    }

    let published_at = DateTime::from_timestamp(post.created_utc as i64, 0);
    if published_at.is_none() {
        warn!(post_id = %post.id, "unparseable created_utc on forum post");
    }

    RawItem {
        source_kind: SourceKind::ForumPost,
        source_id: post.id,
        title: post.title,
        body: post.selftext.unwrap_or_default(),
        url: post.url.unwrap_or_default(),
        author: post.author,
        published_at,
        fetched_at,
        metadata,
    }
}

// Listing endpoint response types (private — deserialization only)

#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    children: Vec<Child>,
}

#[derive(Deserialize)]
struct Child {
    data: Post,
}

#[derive(Deserialize)]
struct Post {
    id: String,
    title: String,
    #[serde(default)]
    selftext: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    num_comments: i64,
    #[serde(default)]
    created_utc: f64,
    #[serde(default)]
    is_self: bool,
    #[serde(default)]
    link_flair_text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "data": { "children": [
            { "data": {
                "id": "abc123",
                "title": "New LLM paper",
                "selftext": "Authors show things.",
                "url": "https://example.com/abc123",
                "author": "alice",
                "score": 321,
                "num_comments": 17,
                "created_utc": 1754000000.0,
                "is_self": true,
                "link_flair_text": "Research"
            }}
        ]}
    }"#;

    #[test]
    fn listing_parses_and_normalizes() {
        let listing: Listing = serde_json::from_str(SAMPLE).unwrap();
        let post = listing.data.children.into_iter().next().unwrap().data;
        let item = normalize(post, "MachineLearning", Utc::now());

        assert_eq!(item.source_kind, SourceKind::ForumPost);
        assert_eq!(item.source_id, "abc123");
        assert_eq!(item.body, "Authors show things.");
        assert_eq!(item.metadata.get("board"), Some(&MetaValue::from("MachineLearning")));
        assert_eq!(item.metadata.get("score"), Some(&MetaValue::from(321i64)));
        assert!(item.published_at.is_some());
    }

    #[test]
    fn missing_optional_fields_default() {
        let raw = r#"{"data":{"children":[{"data":{"id":"x","title":"t","created_utc":0.0}}]}}"#;
        let listing: Listing = serde_json::from_str(raw).unwrap();
        let post = listing.data.children.into_iter().next().unwrap().data;
        let item = normalize(post, "b", Utc::now());
        assert!(item.body.is_empty());
        assert!(item.author.is_none());
    }
}
