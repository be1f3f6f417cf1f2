//! Provider abstractions for embeddings and language models
//!
//! This module provides trait-based abstractions that allow switching between
//! a local Ollama server and the OpenAI API.

pub mod embedding;
pub mod llm;
pub mod ollama;
pub mod openai;

pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{BackendProvider, RagConfig};
use crate::error::{Error, Result};

/// Build the embedding and LLM providers for the configured backend
pub fn from_config(
    config: &RagConfig,
) -> Result<(Arc<dyn EmbeddingProvider>, Arc<dyn LlmProvider>)> {
    match config.backend {
        BackendProvider::Ollama => {
            tracing::info!("Using Ollama backend at {}", config.llm.base_url);
            let provider = ollama::OllamaProvider::new(&config.llm)?;
            let (embedder, llm) = provider.split();
            Ok((Arc::new(embedder), Arc::new(llm)))
        }
        BackendProvider::OpenAi => {
            tracing::info!("Using OpenAI backend at {}", config.llm.openai_base_url);
            let client = Arc::new(openai::OpenAiClient::new(&config.llm)?);
            Ok((
                Arc::new(openai::OpenAiEmbedder::new(Arc::clone(&client))),
                Arc::new(openai::OpenAiLlm::new(client)),
            ))
        }
    }
}

/// Map a transport error, separating timeouts from other failures
pub(crate) fn request_failed(
    service: &str,
    timeout_secs: u64,
    err: reqwest::Error,
    wrap: fn(String) -> Error,
) -> Error {
    if err.is_timeout() {
        Error::timeout(service, timeout_secs)
    } else {
        wrap(format!("{} request failed: {}", service, err))
    }
}

/// Retry a request with exponential backoff
///
/// Only retryable errors are retried; `max_retries = 0` calls once.
pub(crate) async fn retry_request<F, Fut, T>(max_retries: u32, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable() && attempt < max_retries => {
                let delay = Duration::from_secs(2u64.pow(attempt));
                tracing::warn!(
                    "Request failed (attempt {}/{}): {}, retrying in {:?}",
                    attempt + 1,
                    max_retries + 1,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
