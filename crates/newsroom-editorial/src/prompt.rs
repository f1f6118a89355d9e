//! The editorial prompt document.
//!
//! A TOML file defines the editor's role, objective, and a numbered
//! pipeline of instructions. Those sections are composed into one system
//! prompt with the strict JSON output contract appended, so the document
//! can be tuned without recompiling.

use std::path::Path;

use serde::Deserialize;

use crate::error::EditorialError;

#[derive(Debug, Clone, Deserialize)]
pub struct PromptDocument {
    pub role: RoleSection,
    pub objective: ObjectiveSection,
    pub pipeline: PipelineSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleSection {
    pub identity: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectiveSection {
    pub goal: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSection {
    #[serde(rename = "step")]
    pub steps: Vec<PipelineStep>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineStep {
    pub number: u32,
    pub name: String,
    pub instruction: String,
}

const OUTPUT_CONTRACT: &str = r#"OUTPUT FORMAT:
Strict JSON only. No text before or after the JSON block.

If the item is relevant:
{
  "is_news": true,
  "relevance_score": 0.0,
  "relevance_reason": "...",
  "original_summary": "...",
  "rewritten_post": "...",
  "title": "...",
  "teaser": "...",
  "image_prompt": "...",
  "content_type": "news|research|tutorial|humor|discussion|meme"
}

If it is not:
{
  "is_news": false,
  "relevance_score": 0.0,
  "relevance_reason": "..."
}

RULES:
- Facts above everything.
- Headlines hook with meaning, not clickbait.
- Always rewrite in your own words.
- JSON only, nothing else."#;

/// Fallback prompt document compiled into the binary. Used when no
/// `editorial_prompt.toml` is deployed; jobs still run, just with the stock
/// editorial persona.
const BUILTIN: &str = r#"
[role]
identity = "You are the duty editor of a technology news channel. You turn raw posts from forums, tech publishers, chats, and blogs into tight, factual news pieces."

[objective]
goal = "Decide whether the post is worth publishing, and if so rewrite it into a short news item in the channel's voice."

[[pipeline.step]]
number = 1
name = "Relevance check"
instruction = "Judge whether the post carries technology news value: releases, research results, incidents, notable tooling. Score relevance from 0 to 1."

[[pipeline.step]]
number = 2
name = "Fact extraction"
instruction = "Pull out the verifiable facts: who, what, when, numbers, sources. Ignore opinions and hype."

[[pipeline.step]]
number = 3
name = "Rewrite"
instruction = "Write the piece from the facts in your own words: a hooking but honest title, a one-sentence teaser, and a body of three to six short paragraphs."

[[pipeline.step]]
number = 4
name = "Illustration"
instruction = "Describe one image that would illustrate the piece, as a concise generation prompt."
"#;

impl PromptDocument {
    /// Load the document, falling back to the built-in default when the file
    /// does not exist. Parse errors in an existing file still fail loudly.
    pub fn load_or_builtin(path: &str) -> Result<Self, EditorialError> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            tracing::warn!(path, "prompt document missing, using built-in default");
            Ok(Self::builtin())
        }
    }

    pub fn builtin() -> Self {
        // The built-in document is a compile-time constant; parsing it can
        // only fail if the constant itself is broken, which tests catch.
        toml::from_str(BUILTIN).expect("builtin prompt document is valid")
    }

    pub fn load(path: &str) -> Result<Self, EditorialError> {
        if !Path::new(path).exists() {
            return Err(EditorialError::Prompt(format!(
                "prompt document not found: {}",
                path
            )));
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|e| EditorialError::Prompt(format!("{}: {}", path, e)))?;
        let doc: PromptDocument =
            toml::from_str(&raw).map_err(|e| EditorialError::Prompt(e.to_string()))?;
        if doc.pipeline.steps.is_empty() {
            return Err(EditorialError::Prompt("pipeline has no steps".into()));
        }
        Ok(doc)
    }

    /// Compose role + objective + numbered steps + output contract into the
    /// system prompt sent with every editorial call.
    pub fn system_prompt(&self) -> String {
        let steps = self
            .pipeline
            .steps
            .iter()
            .map(|s| format!("{}. {}\n{}", s.number, s.name.trim(), s.instruction.trim()))
            .collect::<Vec<_>>()
            .join("\n\n");

        format!(
            "{}\n\nGOAL: {}\n\nINSTRUCTIONS:\n\n{}\n\n{}",
            self.role.identity.trim(),
            self.objective.goal.trim(),
            steps,
            OUTPUT_CONTRACT
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[role]
identity = "You are a newsroom editor."

[objective]
goal = "Turn raw posts into short news pieces."

[[pipeline.step]]
number = 1
name = "Relevance"
instruction = "Decide whether the post is news."

[[pipeline.step]]
number = 2
name = "Rewrite"
instruction = "Rewrite the post in house style."
"#;

    #[test]
    fn loads_and_composes_system_prompt() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let doc = PromptDocument::load(file.path().to_str().unwrap()).unwrap();

        let prompt = doc.system_prompt();
        assert!(prompt.starts_with("You are a newsroom editor."));
        assert!(prompt.contains("1. Relevance"));
        assert!(prompt.contains("2. Rewrite"));
        assert!(prompt.contains("Strict JSON only"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(PromptDocument::load("/nonexistent/prompt.toml").is_err());
    }

    #[test]
    fn builtin_document_parses_and_composes() {
        let doc = PromptDocument::builtin();
        assert!(doc.pipeline.steps.len() >= 3);
        assert!(doc.system_prompt().contains("OUTPUT FORMAT"));
    }

    #[test]
    fn load_or_builtin_falls_back() {
        let doc = PromptDocument::load_or_builtin("/nonexistent/prompt.toml").unwrap();
        assert!(!doc.pipeline.steps.is_empty());
    }

    #[test]
    fn empty_pipeline_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"[role]\nidentity = \"x\"\n[objective]\ngoal = \"y\"\n[pipeline]\nstep = []\n",
        )
        .unwrap();
        assert!(PromptDocument::load(file.path().to_str().unwrap()).is_err());
    }
}
