//! Long-form blogging-site driver.
//!
//! Pulls the latest posts per tag from the site's JSON listing. Paywalled
//! posts only expose their preview text; they are ingested anyway and the
//! flag is kept in metadata for downstream policy.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use newsroom_core::types::{MetaValue, RawItem, SourceKind};

use crate::driver::{get_json, pace, MonotoneClock, SourceDriver};
use crate::error::FetchError;

pub struct BlogDriver {
    client: reqwest::Client,
    base_url: String,
    delay_ms: u64,
    timeout: Duration,
}

impl BlogDriver {
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
impl SourceDriver for BlogDriver {
    fn kind(&self) -> SourceKind {
        SourceKind::BlogArticle
    }

    async fn fetch(
        &self,
        filters: &[String],
        max_items: usize,
    ) -> Result<Vec<RawItem>, FetchError> {
        let mut items = Vec::new();
        let mut clock = MonotoneClock::new();

        for (i, tag) in filters.iter().enumerate() {
            if items.len() >= max_items {
                break;
            }
            if i > 0 {
                pace(self.delay_ms).await;
            }

            let url = format!(
                "{}/tag/{}/latest?format=json&limit={}",
                self.base_url, tag, max_items
            );
            debug!(tag = %tag, "fetching blog listing");
            let listing: Listing = get_json(&self.client, &url, self.timeout).await?;

            for post in listing.posts {
                if items.len() >= max_items {
                    break;
                }
                items.push(normalize(post, tag, clock.next()));
            }
        }

        debug!(count = items.len(), "blog fetch complete");
        Ok(items)
    }
}

fn normalize(post: Post, tag: &str, fetched_at: DateTime<Utc>) -> RawItem {
    let mut metadata = BTreeMap::new();
    metadata.insert("tag".to_string(), MetaValue::from(tag));
    metadata.insert("claps".to_string(), MetaValue::from(post.claps));
    metadata.insert("is_paywalled".to_string(), MetaValue::from(post.is_paywalled));
    if let Some(publication) = post.publication {
        metadata.insert("publication".to_string(), MetaValue::from(publication));
    }

    let body = match (post.content, post.subtitle) {
        (Some(content), _) if !content.is_empty() => content,
        (_, Some(subtitle)) => subtitle,
        _ => String::new(),
    };

    RawItem {
        source_kind: SourceKind::BlogArticle,
        source_id: post.id,
        title: post.title,
        body,
        url: post.url,
        author: post.author,
        published_at: post
            .published_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc)),
        fetched_at,
        metadata,
    }
}

// Listing response types (private — deserialization only)

#[derive(Deserialize)]
struct Listing {
    posts: Vec<Post>,
}

#[derive(Deserialize)]
struct Post {
    id: String,
    title: String,
    #[serde(default)]
    subtitle: Option<String>,
    #[serde(default)]
    content: Option<String>,
    url: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    publication: Option<String>,
    #[serde(default)]
    claps: i64,
    #[serde(default)]
    is_paywalled: bool,
    #[serde(default)]
    published_at: Option<String>,
}
