use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use newsroom_core::types::{ContentType, SourceKind};
use newsroom_llm::{GenerateRequest, OllamaClient};

use crate::error::EditorialError;
use crate::parse::{self, truncate_chars};
use crate::prompt::PromptDocument;
use crate::types::{EditorialReview, EditorialVerdict, ShortFormDraft};

/// Editorial rewriting wants some creative range.
const EDITORIAL_TEMPERATURE: f32 = 0.7;
/// Short-form rendering should stay close to the source text.
const SHORT_FORM_TEMPERATURE: f32 = 0.3;
/// User payload cap before the `<<<`/`>>>` delimiters are applied.
const INPUT_MAX_CHARS: usize = 3000;
/// Hard cap on the rendered short-form text.
pub const SHORT_FORM_MAX_CHARS: usize = 3500;
const HASHTAGS_MIN: usize = 3;
const HASHTAGS_MAX: usize = 5;

const SHORT_FORM_SYSTEM_PROMPT: &str = r#"You are a channel editor condensing news posts for a chat feed.

Given a post, produce a compact rendering:
- keep the facts, drop the padding,
- body at most 3000 characters,
- 3 to 5 topical hashtags,
- "formatted" is the body with lightweight markup (**bold** for the lead, *italic* for emphasis, `code` for identifiers).

OUTPUT FORMAT:
Strict JSON only, no text around it:
{
  "title": "...",
  "body": "...",
  "hashtags": ["tag1", "tag2", "tag3"],
  "formatted": "...",
  "char_count": 0
}"#;

/// The editorial stage: structured prompt in, validated structured result out.
pub struct EditorialService {
    llm: Arc<OllamaClient>,
    system_prompt: String,
}

impl EditorialService {
    pub fn new(llm: Arc<OllamaClient>, prompt_doc: &PromptDocument) -> Self {
        let system_prompt = prompt_doc.system_prompt();
        info!(
            model = llm.model(),
            prompt_chars = system_prompt.len(),
            "editorial service ready"
        );
        Self { llm, system_prompt }
    }

    /// Run one item through the editorial pipeline.
    ///
    /// Backend failure is an `Err`; a model reply, however mangled, is always
    /// an `Ok` verdict thanks to the repairing parser. Tech articles carry
    /// the curated-source policy: never dropped, score floor 0.8.
    pub async fn review(
        &self,
        title: &str,
        body: &str,
        kind: SourceKind,
    ) -> Result<EditorialReview, EditorialError> {
        let started = Instant::now();
        let user_prompt = build_user_prompt(title, body);

        debug!(%kind, title_chars = title.len(), body_chars = body.len(), "editorial review");

        let response = self
            .llm
            .generate(&GenerateRequest {
                system: self.system_prompt.clone(),
                user: user_prompt,
                temperature: EDITORIAL_TEMPERATURE,
                max_output_tokens: Some(2000),
            })
            .await?;

        if response.trim().is_empty() {
            return Err(EditorialError::EmptyResponse);
        }

        let default_relevant = kind == SourceKind::TechArticle;
        let mut verdict = parse::parse_verdict(&response, title, body, default_relevant);

        if verdict.is_relevant && verdict.content_type.is_none() {
            verdict.content_type = Some(self.classify(&verdict).await);
        }

        let review = EditorialReview {
            verdict,
            model_name: self.llm.model().to_string(),
            processing_ms: started.elapsed().as_millis() as u64,
        };
        debug!(
            relevant = review.verdict.is_relevant,
            score = review.verdict.relevance_score,
            ms = review.processing_ms,
            "editorial review done"
        );
        Ok(review)
    }

    /// Whether the generation backend answers at all. The orchestrator's
    /// services-health gate asks this before attempting enrichment.
    pub async fn backend_alive(&self) -> bool {
        self.llm.health_check().await
    }

    /// Render a relevant item into the size-bounded short form.
    ///
    /// Unlike `review`, this is strict: a missing field fails the call and no
    /// short-form record is created.
    pub async fn render_short_form(
        &self,
        title: &str,
        body: &str,
    ) -> Result<ShortFormDraft, EditorialError> {
        let response = self
            .llm
            .generate(&GenerateRequest {
                system: SHORT_FORM_SYSTEM_PROMPT.to_string(),
                user: build_user_prompt(title, body),
                temperature: SHORT_FORM_TEMPERATURE,
                max_output_tokens: Some(1500),
            })
            .await?;

        if response.trim().is_empty() {
            return Err(EditorialError::EmptyResponse);
        }

        validate_short_form(&response)
    }

    async fn classify(&self, verdict: &EditorialVerdict) -> ContentType {
        let title = verdict.editorial_title.as_deref().unwrap_or("");
        let teaser = verdict.editorial_teaser.as_deref().unwrap_or("");
        match self.llm.classify_content_type(title, teaser).await {
            Some(ct) => ct,
            None => {
                warn!("content type classification unusable, defaulting");
                ContentType::Discussion
            }
        }
    }
}

fn build_user_prompt(title: &str, body: &str) -> String {
    let mut content = format!("Title: {}\n\nText:\n{}", title, body);
    if content.chars().count() > INPUT_MAX_CHARS {
        content = truncate_chars(&content, INPUT_MAX_CHARS);
        content.push_str("\n\n[text truncated]");
    }
    format!(
        "Process the following post:\n\n<<<\n{}\n>>>\n\nReturn ONLY JSON, no extra text.",
        content
    )
}

/// Parse and validate the short-form reply. `char_count` is recomputed from
/// `formatted`; the model's own count is ignored.
fn validate_short_form(response: &str) -> Result<ShortFormDraft, EditorialError> {
    let value = parse::parse_json(response).ok_or(EditorialError::InvalidShortForm(
        "no JSON object in response".into(),
    ))?;
    let obj = value
        .as_object()
        .ok_or(EditorialError::InvalidShortForm("not a JSON object".into()))?;

    let title = required_str(obj, "title")?;
    let mut body = required_str(obj, "body")?;
    let mut formatted = required_str(obj, "formatted")?;

    let mut hashtags: Vec<String> = obj
        .get("hashtags")
        .and_then(|v| v.as_array())
        .ok_or(EditorialError::MissingField("hashtags"))?
        .iter()
        .filter_map(|v| v.as_str())
        .map(|t| t.trim_start_matches('#').trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    if hashtags.len() < HASHTAGS_MIN {
        return Err(EditorialError::InvalidShortForm(format!(
            "{} hashtags, need at least {}",
            hashtags.len(),
            HASHTAGS_MIN
        )));
    }
    hashtags.truncate(HASHTAGS_MAX);

    if body.chars().count() > SHORT_FORM_MAX_CHARS {
        body = truncate_chars(&body, SHORT_FORM_MAX_CHARS);
    }
    if formatted.chars().count() > SHORT_FORM_MAX_CHARS {
        formatted = truncate_chars(&formatted, SHORT_FORM_MAX_CHARS);
    }
    let char_count = formatted.chars().count();

    Ok(ShortFormDraft {
        title,
        body,
        hashtags,
        formatted,
        char_count,
    })
}

fn required_str(
    obj: &serde_json::Map<String, serde_json::Value>,
    key: &'static str,
) -> Result<String, EditorialError> {
    obj.get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .ok_or(EditorialError::MissingField(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_prompt_is_delimited_and_capped() {
        let prompt = build_user_prompt("short", "body text");
        assert!(prompt.contains("<<<"));
        assert!(prompt.contains(">>>"));
        assert!(prompt.contains("Title: short"));

        let long = build_user_prompt("t", &"x".repeat(10_000));
        assert!(long.contains("[text truncated]"));
        // payload cap plus the fixed wrapper text
        assert!(long.chars().count() < INPUT_MAX_CHARS + 200);
    }

    #[test]
    fn short_form_happy_path() {
        let raw = r##"{"title": "T", "body": "B", "hashtags": ["#ai", "llm", "rust"],
                      "formatted": "**B**", "char_count": 999}"##;
        let draft = validate_short_form(raw).unwrap();
        assert_eq!(draft.title, "T");
        assert_eq!(draft.hashtags, vec!["ai", "llm", "rust"]);
        // model's char_count is ignored in favor of the real one
        assert_eq!(draft.char_count, 5);
    }

    #[test]
    fn short_form_missing_field_fails() {
        let raw = r#"{"title": "T", "hashtags": ["a", "b", "c"], "formatted": "x"}"#;
        assert!(matches!(
            validate_short_form(raw),
            Err(EditorialError::MissingField("body"))
        ));
    }

    #[test]
    fn short_form_too_few_hashtags_fails() {
        let raw = r#"{"title": "T", "body": "B", "hashtags": ["one", "two"], "formatted": "B"}"#;
        assert!(validate_short_form(raw).is_err());
    }

    #[test]
    fn short_form_extra_hashtags_are_truncated() {
        let raw = r#"{"title": "T", "body": "B",
            "hashtags": ["a", "b", "c", "d", "e", "f", "g"], "formatted": "B"}"#;
        let draft = validate_short_form(raw).unwrap();
        assert_eq!(draft.hashtags.len(), 5);
    }

    #[test]
    fn short_form_oversized_formatted_is_bounded() {
        let big = "y".repeat(SHORT_FORM_MAX_CHARS + 500);
        let raw = format!(
            r#"{{"title": "T", "body": "B", "hashtags": ["a","b","c"], "formatted": "{}"}}"#,
            big
        );
        let draft = validate_short_form(&raw).unwrap();
        assert_eq!(draft.char_count, SHORT_FORM_MAX_CHARS);
        assert_eq!(draft.formatted.chars().count(), draft.char_count);
    }
}
