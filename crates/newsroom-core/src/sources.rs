//! The sources descriptor: which boards, hubs, channels, and tags each
//! driver pulls from, plus the per-source endpoints.
//!
//! Lives in its own file (`sources.toml`) rather than `newsroom.toml` so the
//! filter trees can be edited without touching service configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{NewsroomError, Result};
use crate::types::SourceKind;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesDescriptor {
    #[serde(default)]
    pub forum: ForumSource,
    #[serde(default)]
    pub tech: TechSource,
    #[serde(default)]
    pub chat: ChatSource,
    #[serde(default)]
    pub blog: BlogSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForumSource {
    #[serde(default = "default_forum_base_url")]
    pub base_url: String,
    /// Boards polled when a job does not name its own.
    #[serde(default)]
    pub boards: Vec<String>,
}

impl Default for ForumSource {
    fn default() -> Self {
        Self {
            base_url: default_forum_base_url(),
            boards: vec!["MachineLearning".into(), "LocalLLaMA".into()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechSource {
    #[serde(default = "default_tech_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub hubs: Vec<String>,
}

impl Default for TechSource {
    fn default() -> Self {
        Self {
            base_url: default_tech_base_url(),
            hubs: vec!["artificial_intelligence".into(), "machine_learning".into()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSource {
    #[serde(default = "default_chat_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub channels: Vec<String>,
}

impl Default for ChatSource {
    fn default() -> Self {
        Self {
            base_url: default_chat_base_url(),
            channels: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogSource {
    #[serde(default = "default_blog_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Default for BlogSource {
    fn default() -> Self {
        Self {
            base_url: default_blog_base_url(),
            tags: vec!["machine-learning".into()],
        }
    }
}

fn default_forum_base_url() -> String {
    "https://www.reddit.com".to_string()
}
fn default_tech_base_url() -> String {
    "https://habr.com".to_string()
}
fn default_chat_base_url() -> String {
    "http://localhost:8081".to_string()
}
fn default_blog_base_url() -> String {
    "https://medium.com".to_string()
}

impl SourcesDescriptor {
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| NewsroomError::Config(format!("{}: {}", path, e)))
    }

    /// The default filter list for a kind, used when a job omits its own.
    pub fn default_filters(&self, kind: SourceKind) -> &[String] {
        match kind {
            SourceKind::ForumPost => &self.forum.boards,
            SourceKind::TechArticle => &self.tech.hubs,
            SourceKind::ChatMessage => &self.chat.channels,
            SourceKind::BlogArticle => &self.blog.tags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_descriptor_falls_back_to_defaults() {
        let desc = SourcesDescriptor::load("/nonexistent/sources.toml").unwrap();
        assert!(!desc.forum.boards.is_empty());
    }

    #[test]
    fn parses_filter_trees() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[forum]\nboards = [\"rust\"]\n\n[tech]\nhubs = [\"compilers\"]\n\n[chat]\nchannels = [\"ai_news\"]"
        )
        .unwrap();
        let desc = SourcesDescriptor::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(desc.default_filters(SourceKind::ForumPost), ["rust"]);
        assert_eq!(desc.default_filters(SourceKind::TechArticle), ["compilers"]);
        assert_eq!(desc.default_filters(SourceKind::ChatMessage), ["ai_news"]);
        // blog section omitted, defaults apply
        assert!(!desc.blog.tags.is_empty());
    }
}
