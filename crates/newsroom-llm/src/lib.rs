//! `newsroom-llm` — Ollama-backed embedding and generation clients.
//!
//! One HTTP client serves both concerns:
//!
//! - [`OllamaClient::embed`] turns text into a fixed-dimension vector via
//!   `/api/embeddings`.
//! - [`OllamaClient::generate`] produces text via `/api/chat` when a system
//!   prompt is present and `/api/generate` otherwise, with retry/backoff on
//!   transient failures and context-window budgeting on the input.

pub mod budget;
pub mod client;
pub mod error;

pub use budget::ContextBudget;
pub use client::{GenerateRequest, OllamaClient};
pub use error::LlmError;
