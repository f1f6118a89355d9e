use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use newsroom_core::types::ContentType;

use crate::budget::{truncate_at_word, ContextBudget};
use crate::error::LlmError;

/// Base backoff before the first retry; doubles per attempt.
const BACKOFF_BASE_MS: u64 = 500;
/// Embedding requests are small and fast; they get a shorter timeout than
/// generation.
const EMBED_TIMEOUT_SECS: u64 = 30;
/// Embedding input cap in characters. Oversized input degrades embedding
/// quality long before it hits the model limit.
const EMBED_MAX_CHARS: usize = 8000;

pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    embedding_model: String,
    timeout: Duration,
    max_retries: u32,
    budget: ContextBudget,
    max_output_tokens: u32,
}

/// A single generation call. `system` empty means plain completion mode.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_output_tokens: Option<u32>,
}

impl OllamaClient {
    pub fn new(
        base_url: &str,
        model: &str,
        embedding_model: &str,
        timeout_secs: u64,
        max_retries: u32,
        context_window: u32,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            embedding_model: embedding_model.to_string(),
            timeout: Duration::from_secs(timeout_secs),
            max_retries,
            budget: ContextBudget::for_window(context_window),
            max_output_tokens: ContextBudget::output_tokens(context_window),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// GET /api/tags with a short timeout. Used by the orchestrator's
    /// services-health step and the /health endpoint.
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!(error = %e, "llm health check failed");
                false
            }
        }
    }

    /// Embed `text` with the configured embedding model.
    ///
    /// Input is truncated to a fixed character cap before the call. The
    /// response must carry a non-empty vector.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let input = truncate_at_word(text, EMBED_MAX_CHARS);
        let body = serde_json::json!({
            "model": self.embedding_model,
            "prompt": input,
        });
        let url = format!("{}/api/embeddings", self.base_url);

        let resp = self
            .with_retries(|| {
                self.client
                    .post(&url)
                    .json(&body)
                    .timeout(Duration::from_secs(EMBED_TIMEOUT_SECS))
            })
            .await?;

        let parsed: EmbeddingResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Malformed(e.to_string()))?;

        if parsed.embedding.is_empty() {
            return Err(LlmError::Malformed("empty embedding in response".into()));
        }
        debug!(dim = parsed.embedding.len(), "embedding received");
        Ok(parsed.embedding)
    }

    /// Generate text. Non-empty system prompt routes through /api/chat with a
    /// system role message; otherwise /api/generate.
    pub async fn generate(&self, req: &GenerateRequest) -> Result<String, LlmError> {
        let (system, user) = self.budget.fit(&req.system, &req.user);
        let max_tokens = req
            .max_output_tokens
            .unwrap_or(self.max_output_tokens)
            .min(self.max_output_tokens);

        if system.is_empty() {
            self.generate_completion(&user, req.temperature, max_tokens).await
        } else {
            self.generate_chat(&system, &user, req.temperature, max_tokens)
                .await
        }
    }

    /// Map a free-form content label (or the title/teaser pair when no label
    /// was produced) into the enum. Returns `None` when the model's answer is
    /// unusable; callers pick their own fallback.
    pub async fn classify_content_type(
        &self,
        title: &str,
        teaser: &str,
    ) -> Option<ContentType> {
        let req = GenerateRequest {
            system: "You are a content classifier. Answer with exactly one word: \
                     news, research, tutorial, humor, discussion, or meme."
                .into(),
            user: format!("Title: {}\nTeaser: {}", title, teaser),
            temperature: 0.2,
            max_output_tokens: Some(10),
        };
        match self.generate(&req).await {
            Ok(answer) => answer.trim().parse().ok(),
            Err(e) => {
                warn!(error = %e, "content type classification failed");
                None
            }
        }
    }

    async fn generate_chat(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "stream": false,
            "options": {
                "temperature": temperature,
                "num_predict": max_tokens,
            },
        });
        let url = format!("{}/api/chat", self.base_url);
        debug!(model = %self.model, "sending chat request");

        let resp = self
            .with_retries(|| self.client.post(&url).json(&body).timeout(self.timeout))
            .await?;

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Malformed(e.to_string()))?;
        Ok(parsed.message.content.trim().to_string())
    }

    async fn generate_completion(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "temperature": temperature,
                "num_predict": max_tokens,
            },
        });
        let url = format!("{}/api/generate", self.base_url);
        debug!(model = %self.model, "sending generate request");

        let resp = self
            .with_retries(|| self.client.post(&url).json(&body).timeout(self.timeout))
            .await?;

        let parsed: CompletionResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Malformed(e.to_string()))?;
        Ok(parsed.response.trim().to_string())
    }

    /// Issue the request built by `build`, retrying transient failures with
    /// exponential backoff. 429 and 5xx are retried; other 4xx never are.
    async fn with_retries<F>(&self, build: F) -> Result<reqwest::Response, LlmError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0u32;
        loop {
            let result = match build().send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return Ok(resp);
                    }
                    let message = resp.text().await.unwrap_or_default();
                    Err(LlmError::Rejected {
                        status: status.as_u16(),
                        message,
                    })
                }
                Err(e) if e.is_connect() || e.is_timeout() => {
                    Err(LlmError::Unavailable(e.to_string()))
                }
                Err(e) => Err(LlmError::Http(e)),
            };

            match result {
                Err(err) if err.is_retryable() && attempt + 1 < self.max_retries => {
                    let delay = BACKOFF_BASE_MS << attempt;
                    warn!(attempt, delay_ms = delay, error = %err, "retrying llm request");
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

// Ollama API response types (private — deserialization only)

#[derive(Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    response: String,
}
