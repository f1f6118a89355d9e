//! Verdict parsing and repair.
//!
//! Models wrap JSON in fences, use single quotes, emit placeholder strings,
//! and drop keys. The protocol here is fixed:
//!
//! 1. strip fence wrappers,
//! 2. take the substring from the first `{` to the last `}`,
//! 3. strict parse; on failure retry once after swapping single quotes for
//!    double quotes and collapsing newlines,
//! 4. scrub placeholder values, coerce booleans and scores,
//! 5. synthesize missing required keys and fill editorial defaults.
//!
//! The result is total: any non-empty input yields a verdict.

use serde_json::Value;
use tracing::debug;

use newsroom_core::types::ContentType;

use crate::types::EditorialVerdict;

/// Values the model emits when it means "nothing".
const PLACEHOLDERS: [&str; 5] = ["n/a", "none", "null", "undefined", ""];

/// Relevance floor used when synthesizing `is_news` from a score alone.
const RELEVANCE_CUTOFF: f32 = 0.6;

/// Teaser length cap in characters.
pub const TEASER_MAX_CHARS: usize = 200;

const DEFAULT_REASON: &str =
    "The model returned no usable reasoning for this item, so a default verdict \
     was synthesized from the remaining fields.";

/// Score floor applied to sources whose items are kept regardless of the
/// model's verdict.
pub const DEFAULT_RELEVANT_FLOOR: f32 = 0.8;

/// Parse a raw model reply into a verdict, repairing whatever is repairable.
/// `original_title` and `original_body` feed the editorial-field defaults.
///
/// `default_relevant` encodes the curated-source policy: the item is kept
/// even when the model says no, and its score never drops below
/// [`DEFAULT_RELEVANT_FLOOR`].
pub fn parse_verdict(
    raw: &str,
    original_title: &str,
    original_body: &str,
    default_relevant: bool,
) -> EditorialVerdict {
    let value = parse_json(raw).unwrap_or(Value::Null);
    let obj = value.as_object().cloned().unwrap_or_default();

    let score = obj.get("relevance_score").and_then(coerce_score);
    let mut is_relevant = match obj.get("is_news").and_then(coerce_bool) {
        Some(flag) => flag,
        // Missing flag: fall back to the score, then to "not relevant".
        None => score.map(|s| s > RELEVANCE_CUTOFF).unwrap_or(false),
    };
    let mut relevance_score = score
        .unwrap_or(if is_relevant { 0.7 } else { 0.3 })
        .clamp(0.0, 1.0);

    let mut relevance_reason = get_text(&obj, "relevance_reason")
        .unwrap_or_else(|| DEFAULT_REASON.to_string());

    if default_relevant {
        if !is_relevant {
            is_relevant = true;
            relevance_reason = format!(
                "Kept by curated-source policy despite the model's verdict: {}",
                relevance_reason
            );
        }
        relevance_score = relevance_score.max(DEFAULT_RELEVANT_FLOOR);
    }

    let original_summary = get_text(&obj, "original_summary");
    let content_type = get_text(&obj, "content_type")
        .and_then(|label| label.parse::<ContentType>().ok());

    if !is_relevant {
        return EditorialVerdict {
            is_relevant: false,
            relevance_score,
            relevance_reason,
            original_summary,
            editorial_title: None,
            editorial_teaser: None,
            editorial_body: None,
            image_prompt: None,
            content_type,
        };
    }

    // Relevant: every editorial field gets a value, model-provided or default.
    let editorial_title =
        get_text(&obj, "title").unwrap_or_else(|| original_title.to_string());
    let editorial_body = get_text(&obj, "rewritten_post")
        .or_else(|| original_summary.clone())
        .unwrap_or_else(|| original_body.to_string());
    let editorial_teaser = get_text(&obj, "teaser")
        .map(|t| truncate_chars(&t, TEASER_MAX_CHARS))
        .unwrap_or_else(|| truncate_chars(&editorial_body, TEASER_MAX_CHARS));
    let image_prompt = get_text(&obj, "image_prompt").unwrap_or_else(|| {
        format!(
            "Editorial illustration for a technology news story titled \"{}\"",
            editorial_title
        )
    });

    EditorialVerdict {
        is_relevant: true,
        relevance_score,
        relevance_reason,
        original_summary,
        editorial_title: Some(editorial_title),
        editorial_teaser: Some(editorial_teaser),
        editorial_body: Some(editorial_body),
        image_prompt: Some(image_prompt),
        content_type,
    }
}

/// Fence-strip, brace-extract, strict parse, one-shot lenient reparse.
pub fn parse_json(raw: &str) -> Option<Value> {
    let stripped = strip_fences(raw.trim());
    let candidate = extract_braces(stripped)?;

    match serde_json::from_str(candidate) {
        Ok(v) => Some(v),
        Err(first_err) => {
            let repaired = candidate.replace('\'', "\"").replace('\n', " ");
            match serde_json::from_str(&repaired) {
                Ok(v) => {
                    debug!("verdict JSON recovered by lenient reparse");
                    Some(v)
                }
                Err(_) => {
                    debug!(error = %first_err, "verdict JSON unparseable");
                    None
                }
            }
        }
    }
}

fn strip_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json") on the opening fence line.
    let rest = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn extract_braces(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end >= start).then(|| &text[start..=end])
}

fn is_placeholder(s: &str) -> bool {
    let normalized = s.trim().to_lowercase();
    PLACEHOLDERS.contains(&normalized.as_str())
}

/// Fetch a string field, treating placeholder strings as absent.
fn get_text(obj: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) if !is_placeholder(s) => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Coerce common truthy/falsy spellings.
fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|v| v != 0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "da" | "1" => Some(true),
            "false" | "no" | "net" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Coerce a number or numeric string; placeholders count as missing.
fn coerce_score(value: &Value) -> Option<f32> {
    match value {
        Value::Number(n) => n.as_f64().map(|v| v as f32),
        Value::String(s) if !is_placeholder(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect()
}
