//! Messaging-platform channel driver.
//!
//! Reads channel history from the export gateway's JSON API. Messages have
//! no title of their own; the first line stands in. The message id is only
//! unique within a channel, so the source id is `{channel}:{message_id}`.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use newsroom_core::types::{MetaValue, RawItem, SourceKind};

use crate::driver::{derive_title, get_json, pace, MonotoneClock, SourceDriver};
use crate::error::FetchError;

const TITLE_MAX_CHARS: usize = 120;

pub struct ChatDriver {
    client: reqwest::Client,
    base_url: String,
    delay_ms: u64,
    timeout: Duration,
}

impl ChatDriver {
    pub fn new(base_url: &str, delay_ms: u64, timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            delay_ms,
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

#[async_trait]
impl SourceDriver for ChatDriver {
    fn kind(&self) -> SourceKind {
        SourceKind::ChatMessage
    }

    async fn fetch(
        &self,
        filters: &[String],
        max_items: usize,
    ) -> Result<Vec<RawItem>, FetchError> {
        let mut items = Vec::new();
        let mut clock = MonotoneClock::new();

        for (i, channel) in filters.iter().enumerate() {
            if items.len() >= max_items {
                break;
            }
            if i > 0 {
                pace(self.delay_ms).await;
            }

            let url = format!(
                "{}/channels/{}/messages?limit={}",
                self.base_url, channel, max_items
            );
            debug!(channel = %channel, "fetching channel history");
            let history: History = get_json(&self.client, &url, self.timeout).await?;

            for msg in history.messages {
                if items.len() >= max_items {
                    break;
                }
                // Media-only messages carry no text worth ingesting.
                if msg.text.trim().is_empty() {
                    continue;
                }
                items.push(normalize(msg, channel, clock.next()));
            }
        }

        debug!(count = items.len(), "chat fetch complete");
        Ok(items)
    }
}

fn normalize(msg: Message, channel: &str, fetched_at: DateTime<Utc>) -> RawItem {
    let mut metadata = BTreeMap::new();
    metadata.insert("channel".to_string(), MetaValue::from(channel));
    metadata.insert("views".to_string(), MetaValue::from(msg.views));
    metadata.insert("forwards".to_string(), MetaValue::from(msg.forwards));
    metadata.insert("has_media".to_string(), MetaValue::from(msg.has_media));
    if let Some(media_type) = msg.media_type {
        metadata.insert("media_type".to_string(), MetaValue::from(media_type));
    }

    RawItem {
        source_kind: SourceKind::ChatMessage,
        source_id: format!("{}:{}", channel, msg.id),
        title: derive_title(&msg.text, TITLE_MAX_CHARS),
        body: msg.text,
        url: format!("https://t.me/{}/{}", channel, msg.id),
        author: msg.sender,
        published_at: msg
            .date
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc)),
        fetched_at,
        metadata,
    }
}

// History response types (private — deserialization only)

#[derive(Deserialize)]
struct History {
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct Message {
    id: i64,
    #[serde(default)]
    text: String,
    #[serde(default)]
    sender: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    views: i64,
    #[serde(default)]
    forwards: i64,
    #[serde(default)]
    has_media: bool,
    #[serde(default)]
    media_type: Option<String>,
}
