//! LLM provider trait for text completion

use async_trait::async_trait;
use crate::error::Result;

/// Trait for language model completion
///
/// Calls are stateless and non-deterministic: the same prompt may produce a
/// different completion on every call.
///
/// Implementations:
/// - `OllamaLlm`: Local Ollama server
/// - `OpenAiLlm`: OpenAI chat completions
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete a prompt
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
