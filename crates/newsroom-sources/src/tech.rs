//! Tech-publisher driver.
//!
//! The publisher exposes a per-hub article feed as JSON. Article text
//! arrives as sanitized HTML; we strip tags down to plain text here. The
//! full scraping stack (selectors, pagination, comments) is a separate
//! collaborator and out of scope.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use newsroom_core::types::{MetaValue, RawItem, SourceKind};

use crate::driver::{get_json, pace, MonotoneClock, SourceDriver};
use crate::error::FetchError;

pub struct TechDriver {
    client: reqwest::Client,
    base_url: String,
    delay_ms: u64,
    timeout: Duration,
}

impl TechDriver {
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
impl SourceDriver for TechDriver {
    fn kind(&self) -> SourceKind {
        SourceKind::TechArticle
    }

    async fn fetch(
        &self,
        filters: &[String],
        max_items: usize,
    ) -> Result<Vec<RawItem>, FetchError> {
        let mut items = Vec::new();
        let mut clock = MonotoneClock::new();

        for (i, hub) in filters.iter().enumerate() {
            if items.len() >= max_items {
                break;
            }
            if i > 0 {
                pace(self.delay_ms).await;
            }

            let url = format!(
                "{}/api/hubs/{}/articles?limit={}",
                self.base_url, hub, max_items
            );
            debug!(hub = %hub, "fetching hub feed");
            let feed: Feed = get_json(&self.client, &url, self.timeout).await?;

            for article in feed.articles {
                if items.len() >= max_items {
                    break;
                }
                items.push(normalize(article, hub, clock.next()));
            }
        }

        debug!(count = items.len(), "tech fetch complete");
        Ok(items)
    }
}

fn normalize(article: Article, hub: &str, fetched_at: DateTime<Utc>) -> RawItem {
    let mut metadata = BTreeMap::new();
    metadata.insert("hub".to_string(), MetaValue::from(hub));
    if !article.tags.is_empty() {
        metadata.insert("tags".to_string(), MetaValue::from(article.tags.join(",")));
    }
    if let Some(rt) = article.reading_time {
        metadata.insert("reading_time".to_string(), MetaValue::from(rt));
    }
    if let Some(views) = article.views {
        metadata.insert("views".to_string(), MetaValue::from(views));
    }

    RawItem {
        source_kind: SourceKind::TechArticle,
        source_id: article.id,
        title: article.title,
        body: strip_tags(&article.text_html),
        url: article.url,
        author: article.author,
        published_at: article
            .published_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc)),
        fetched_at,
        metadata,
    }
}

/// Minimal tag stripper for the feed's sanitized HTML. Block-level closers
/// become newlines so paragraphs survive.
fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut tag = String::new();

    for ch in html.chars() {
        match ch {
            '<' => {
                in_tag = true;
                tag.clear();
            }
            '>' if in_tag => {
                in_tag = false;
                let t = tag.trim_start_matches('/').to_lowercase();
                if matches!(t.as_str(), "p" | "br" | "br/" | "div" | "li" | "h1" | "h2" | "h3") {
                    if !out.ends_with('\n') {
                        out.push('\n');
                    }
                }
            }
            _ if in_tag => tag.push(ch),
            _ => out.push(ch),
        }
    }

    // Collapse entity leftovers we actually see in feeds.
    out.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .trim()
        .to_string()
}

// Feed response types (private — deserialization only)

#[derive(Deserialize)]
struct Feed {
    articles: Vec<Article>,
}

#[derive(Deserialize)]
struct Article {
    id: String,
    title: String,
    #[serde(default)]
    text_html: String,
    url: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    reading_time: Option<i64>,
    #[serde(default)]
    views: Option<i64>,
    #[serde(default)]
    published_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_keeps_paragraphs() {
        let html = "<p>First paragraph.</p><p>Second &amp; third.</p>";
        let text = strip_tags(html);
        assert_eq!(text, "First paragraph.\nSecond & third.");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(strip_tags("no markup here"), "no markup here");
    }

    #[test]
    fn feed_normalizes() {
        let raw = r#"{"articles":[{
            "id": "801234",
            "title": "Компилятор научился новому",
            "text_html": "<p>Текст статьи.</p>",
            "url": "https://example.com/801234",
            "author": "dev",
            "tags": ["compilers", "rust"],
            "reading_time": 7,
            "published_at": "2026-07-30T10:00:00+00:00"
        }]}"#;
        let feed: Feed = serde_json::from_str(raw).unwrap();
        let item = normalize(feed.articles.into_iter().next().unwrap(), "compilers", Utc::now());

        assert_eq!(item.source_kind, SourceKind::TechArticle);
        assert_eq!(item.body, "Текст статьи.");
        assert_eq!(item.metadata.get("hub"), Some(&MetaValue::from("compilers")));
        assert!(item.published_at.is_some());
    }
}
