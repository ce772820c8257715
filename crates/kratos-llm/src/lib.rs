//! Kratos LLM: the language-generation capability.
//!
//! The pipeline depends only on `LanguageModel::complete(prompt) -> text`.
//! `ChatClient` implements it against any OpenAI-compatible
//! chat-completions endpoint (Groq, OpenAI, vLLM, Ollama, ...).

pub mod client;

use async_trait::async_trait;

pub use client::ChatClient;

/// Errors from the language-generation capability.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM configuration error: {0}")]
    Config(String),

    #[error("LLM request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("LLM API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("LLM returned no completion")]
    EmptyResponse,
}

/// Given a prompt, return text.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}
