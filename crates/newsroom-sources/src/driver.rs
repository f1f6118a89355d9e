use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::de::DeserializeOwned;

use newsroom_core::sources::SourcesDescriptor;
use newsroom_core::types::{RawItem, SourceKind};

use crate::error::FetchError;

/// A source of normalized items.
///
/// `fetch` pulls up to `max_items` items for the given filters (boards,
/// hubs, channels, tags, whatever the kind calls them). Items come back in
/// source order with monotone `fetched_at` stamps.
#[async_trait]
pub trait SourceDriver: Send + Sync {
    fn kind(&self) -> SourceKind;

    async fn fetch(&self, filters: &[String], max_items: usize)
        -> Result<Vec<RawItem>, FetchError>;
}

/// Construct the driver for a kind from the sources descriptor.
pub fn build_driver(
    kind: SourceKind,
    descriptor: &SourcesDescriptor,
    fetch_delay_ms: u64,
    timeout_secs: u64,
) -> Box<dyn SourceDriver> {
    match kind {
        SourceKind::ForumPost => Box::new(crate::forum::ForumDriver::new(
            &descriptor.forum.base_url,
            fetch_delay_ms,
            timeout_secs,
        )),
        SourceKind::TechArticle => Box::new(crate::tech::TechDriver::new(
            &descriptor.tech.base_url,
            fetch_delay_ms,
            timeout_secs,
        )),
        SourceKind::ChatMessage => Box::new(crate::chat::ChatDriver::new(
            &descriptor.chat.base_url,
            fetch_delay_ms,
            timeout_secs,
        )),
        SourceKind::BlogArticle => Box::new(crate::blog::BlogDriver::new(
            &descriptor.blog.base_url,
            fetch_delay_ms,
            timeout_secs,
        )),
    }
}

/// Shared HTTP plumbing: GET a JSON document, classify failures.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<T, FetchError> {
    let resp = client.get(url).timeout(timeout).send().await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(FetchError::from_status(status.as_u16(), body));
    }
    resp.json::<T>()
        .await
        .map_err(|e| FetchError::Malformed(e.to_string()))
}

/// Pause between successive requests to one source.
pub(crate) async fn pace(delay_ms: u64) {
    if delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}

/// Hands out strictly increasing `fetched_at` stamps within one batch, so
/// batch ordering survives storage even when the wall clock stalls.
pub(crate) struct MonotoneClock {
    last: DateTime<Utc>,
}

impl MonotoneClock {
    pub fn new() -> Self {
        Self {
            last: Utc::now() - ChronoDuration::milliseconds(1),
        }
    }

    pub fn next(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        self.last = if now > self.last {
            now
        } else {
            self.last + ChronoDuration::milliseconds(1)
        };
        self.last
    }
}

/// First line of a text, bounded, for sources whose items carry no title.
pub(crate) fn derive_title(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().next().unwrap_or("").trim();
    if first_line.chars().count() <= max_chars {
        first_line.to_string()
    } else {
        first_line.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotone_clock_never_repeats() {
        let mut clock = MonotoneClock::new();
        let mut prev = clock.next();
        for _ in 0..100 {
            let next = clock.next();
            assert!(next > prev);
            prev = next;
        }
    }

    #[test]
    fn derived_title_takes_first_line() {
        assert_eq!(derive_title("headline\nrest of message", 50), "headline");
        let long = "x".repeat(200);
        assert_eq!(derive_title(&long, 50).chars().count(), 50);
        assert_eq!(derive_title("", 50), "");
    }
}
