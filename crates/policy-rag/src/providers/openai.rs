//! OpenAI client for embeddings and chat completions

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::LlmProvider;
use super::{request_failed, retry_request};

// ── OpenAI API request/response types ──────────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Pull the API's error message out of a failed response body
fn error_detail(body: String) -> String {
    serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

/// OpenAI API client shared by the embedder and the LLM provider
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    config: LlmConfig,
}

impl OpenAiClient {
    /// Create a new client; the API key comes from config or `OPENAI_API_KEY`
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(crate::config::OPENAI_API_KEY_ENV).ok())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                Error::Config("OpenAI backend selected but no API key is configured".to_string())
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            config: config.clone(),
        })
    }

    /// Embed texts, split into requests of at most `embed_batch_size` inputs
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let batch_size = self.config.embed_batch_size.max(1);
        let mut vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(batch_size) {
            vectors.extend(self.embed_request(batch).await?);
        }

        Ok(vectors)
    }

    async fn embed_request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.config.openai_base_url);
        let url = url.as_str();
        let timeout_secs = self.config.timeout_secs;

        tracing::debug!(
            batch_size = texts.len(),
            model = %self.config.embed_model,
            "Embedding batch"
        );

        retry_request(self.config.max_retries, || async move {
            let request = EmbeddingRequest {
                model: &self.config.embed_model,
                input: texts.iter().map(String::as_str).collect(),
            };

            let response = self
                .client
                .post(url)
                .bearer_auth(&self.api_key)
                .json(&request)
                .send()
                .await
                .map_err(|e| request_failed("OpenAI embeddings", timeout_secs, e, Error::Embedding))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(Error::embedding(format!(
                    "API returned {}: {}",
                    status,
                    error_detail(body)
                )));
            }

            let parsed: EmbeddingResponse = response
                .json()
                .await
                .map_err(|e| Error::embedding(format!("Failed to parse embedding response: {}", e)))?;

            if parsed.data.len() != texts.len() {
                return Err(Error::embedding(format!(
                    "Expected {} embeddings, got {}",
                    texts.len(),
                    parsed.data.len()
                )));
            }

            Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
        })
        .await
    }

    /// Single-message chat completion
    pub async fn chat(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.config.openai_base_url);
        let url = url.as_str();
        let timeout_secs = self.config.timeout_secs;

        retry_request(self.config.max_retries, || async move {
            let request = ChatRequest {
                model: &self.config.generate_model,
                messages: vec![ChatMessage {
                    role: "user",
                    content: prompt,
                }],
                temperature: self.config.temperature,
            };

            let response = self
                .client
                .post(url)
                .bearer_auth(&self.api_key)
                .json(&request)
                .send()
                .await
                .map_err(|e| request_failed("OpenAI chat", timeout_secs, e, Error::Llm))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(Error::llm(format!(
                    "API returned {}: {}",
                    status,
                    error_detail(body)
                )));
            }

            let parsed: ChatResponse = response
                .json()
                .await
                .map_err(|e| Error::llm(format!("Failed to parse chat response: {}", e)))?;

            parsed
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .ok_or_else(|| Error::llm("API returned no completion"))
        })
        .await
    }

    /// Check the API key and connectivity
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.config.openai_base_url);
        match self.client.get(&url).bearer_auth(&self.api_key).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}

/// Embedding provider backed by the OpenAI embeddings API
pub struct OpenAiEmbedder {
    client: Arc<OpenAiClient>,
}

impl OpenAiEmbedder {
    /// Create from a shared client
    pub fn new(client: Arc<OpenAiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client
            .embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::embedding("API returned empty response"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.client.embed_batch(texts).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.client.config.embed_model
    }
}

/// LLM provider backed by OpenAI chat completions
pub struct OpenAiLlm {
    client: Arc<OpenAiClient>,
}

impl OpenAiLlm {
    /// Create from a shared client
    pub fn new(client: Arc<OpenAiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LlmProvider for OpenAiLlm {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.client.chat(prompt).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.client.config.generate_model
    }
}
