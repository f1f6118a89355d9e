use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 8780;
pub const DEFAULT_BIND: &str = "127.0.0.1";
/// Hard cap on `max_items` accepted by job submission.
pub const MAX_ITEMS_CAP: u32 = 500;

/// Top-level config (newsroom.toml + NEWSROOM_* env overrides).
///
/// Loaded exactly once in `main` and passed by handle into every component;
/// no component re-reads the environment after startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsroomConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub vector: VectorConfig,
    #[serde(default)]
    pub dedup: DedupConfig,
    #[serde(default)]
    pub editorial: EditorialConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub logstore: LogStoreConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
}

impl Default for NewsroomConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            database: DatabaseConfig::default(),
            ollama: OllamaConfig::default(),
            vector: VectorConfig::default(),
            dedup: DedupConfig::default(),
            editorial: EditorialConfig::default(),
            pipeline: PipelineConfig::default(),
            logstore: LogStoreConfig::default(),
            sources: SourcesConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,
    /// Generation model.
    #[serde(default = "default_model")]
    pub model: String,
    /// Embedding model; its output dimension must match `vector.dimension`.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    /// Per-request timeout for generation calls. Generation can take tens of
    /// seconds on large models.
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Model context window in tokens; the client reserves ~25% for output.
    #[serde(default = "default_context_window")]
    pub context_window: u32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_model(),
            embedding_model: default_embedding_model(),
            timeout_secs: default_llm_timeout(),
            max_retries: default_max_retries(),
            context_window: default_context_window(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorConfig {
    #[serde(default = "default_qdrant_url")]
    pub url: String,
    /// Fixed per embedding model. Switching models requires recreating the
    /// collections; a mismatch against an existing collection aborts startup.
    #[serde(default = "default_dimension")]
    pub dimension: u32,
    #[serde(default = "default_vector_timeout")]
    pub timeout_secs: u64,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            url: default_qdrant_url(),
            dimension: default_dimension(),
            timeout_secs: default_vector_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Cosine similarity at or above this flags a semantic duplicate.
    /// Raising it makes dedup stricter (fewer items flagged).
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            score_threshold: default_score_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorialConfig {
    /// Path to the editorial prompt document.
    #[serde(default = "default_prompt_path")]
    pub prompt_path: String,
}

impl Default for EditorialConfig {
    fn default() -> Self {
        Self {
            prompt_path: default_prompt_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Items whose `title + body` is shorter than this skip dedup and
    /// editorial but keep the raw record.
    #[serde(default = "default_min_text_length")]
    pub min_text_length: usize,
    /// Editorial worker pool size within one job.
    #[serde(default = "default_max_parallel_tasks")]
    pub max_parallel_tasks: usize,
    /// Runner-wide cap on concurrently running jobs.
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,
    #[serde(default = "default_max_items")]
    pub default_max_items: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_text_length: default_min_text_length(),
            max_parallel_tasks: default_max_parallel_tasks(),
            max_concurrent_jobs: default_max_concurrent_jobs(),
            default_max_items: default_max_items(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogStoreConfig {
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_max_logs")]
    pub max_logs: usize,
    /// When false, the file backend is used without probing Redis.
    #[serde(default = "bool_true")]
    pub prefer_redis: bool,
}

impl Default for LogStoreConfig {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
            log_dir: default_log_dir(),
            max_logs: default_max_logs(),
            prefer_redis: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Path to sources.toml (per-source boards/hubs/channels/tags).
    #[serde(default = "default_sources_path")]
    pub descriptor_path: String,
    /// Delay between successive fetch requests to one source, milliseconds.
    #[serde(default = "default_fetch_delay_ms")]
    pub fetch_delay_ms: u64,
    #[serde(default = "default_source_timeout")]
    pub timeout_secs: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            descriptor_path: default_sources_path(),
            fetch_delay_ms: default_fetch_delay_ms(),
            timeout_secs: default_source_timeout(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_db_path() -> String {
    "newsroom.db".to_string()
}
fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_model() -> String {
    "gpt-oss:20b".to_string()
}
fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}
fn default_llm_timeout() -> u64 {
    300
}
fn default_max_retries() -> u32 {
    3
}
fn default_context_window() -> u32 {
    8192
}
fn default_qdrant_url() -> String {
    "http://localhost:6333".to_string()
}
fn default_dimension() -> u32 {
    768
}
fn default_vector_timeout() -> u64 {
    30
}
fn default_score_threshold() -> f32 {
    0.95
}
fn default_prompt_path() -> String {
    "config/editorial_prompt.toml".to_string()
}
fn default_min_text_length() -> usize {
    50
}
fn default_max_parallel_tasks() -> usize {
    1
}
fn default_max_concurrent_jobs() -> usize {
    4
}
fn default_max_items() -> u32 {
    25
}
fn default_redis_url() -> String {
    "redis://localhost:6379/0".to_string()
}
fn default_log_dir() -> String {
    "logs".to_string()
}
fn default_max_logs() -> usize {
    1000
}
fn default_sources_path() -> String {
    "config/sources.toml".to_string()
}
fn default_fetch_delay_ms() -> u64 {
    1000
}
fn default_source_timeout() -> u64 {
    30
}
fn bool_true() -> bool {
    true
}

impl NewsroomConfig {
    /// Load config from a TOML file with NEWSROOM_* env var overrides.
    ///
    /// Nested keys use a double underscore in the environment, e.g.
    /// `NEWSROOM_OLLAMA__BASE_URL` overrides `ollama.base_url`.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path.unwrap_or("newsroom.toml");

        let config: NewsroomConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("NEWSROOM_").split("__"))
            .extract()
            .map_err(|e| crate::error::NewsroomError::Config(e.to_string()))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_sane() {
        let cfg = NewsroomConfig::default();
        assert_eq!(cfg.gateway.port, DEFAULT_PORT);
        assert_eq!(cfg.dedup.score_threshold, 0.95);
        assert_eq!(cfg.pipeline.max_parallel_tasks, 1);
        assert_eq!(cfg.vector.dimension, 768);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = NewsroomConfig::load(Some("/nonexistent/newsroom.toml")).unwrap();
        assert_eq!(cfg.ollama.model, "gpt-oss:20b");
    }

    #[test]
    fn toml_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[dedup]\nscore_threshold = 0.9\n\n[pipeline]\nmin_text_length = 80"
        )
        .unwrap();
        let cfg = NewsroomConfig::load(file.path().to_str()).unwrap();
        assert_eq!(cfg.dedup.score_threshold, 0.9);
        assert_eq!(cfg.pipeline.min_text_length, 80);
        // untouched sections keep their defaults
        assert_eq!(cfg.gateway.bind, DEFAULT_BIND);
    }
}
