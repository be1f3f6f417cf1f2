//! Application state for the policy RAG server

use std::sync::Arc;
use std::time::Duration;

use crate::chat::ChatEngine;
use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::index::{IndexBuilder, SharedIndex, VectorIndex};
use crate::providers::{self, EmbeddingProvider, LlmProvider};
use crate::session::SessionStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Index, built or loaded once at startup
    index: SharedIndex,
    /// Per-turn pipeline over the index
    engine: Arc<ChatEngine>,
    /// Embedding provider (Ollama or OpenAI)
    embedding_provider: Arc<dyn EmbeddingProvider>,
    /// LLM provider (Ollama or OpenAI)
    llm_provider: Arc<dyn LlmProvider>,
    /// Live conversations
    sessions: SessionStore,
}

impl AppState {
    /// Create the providers, then load or build the index
    ///
    /// Fails when there is no persisted index and it cannot be built.
    pub async fn new(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing policy RAG state (backend: {:?})...", config.backend);

        let (embedder, llm) = providers::from_config(&config)?;
        tracing::info!(
            embed_model = embedder.model(),
            generate_model = llm.model(),
            "Providers initialized"
        );

        let builder = IndexBuilder::from_config(&config, Arc::clone(&embedder));
        let index = SharedIndex::new();
        index.get_or_init(&builder).await?;

        Self::assemble(config, index, embedder, llm)
    }

    /// Create state over an already available index
    pub fn with_index(
        config: RagConfig,
        index: VectorIndex,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Result<Self> {
        Self::assemble(config, SharedIndex::ready(index), embedder, llm)
    }

    fn assemble(
        config: RagConfig,
        index: SharedIndex,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Result<Self> {
        let loaded = index
            .get()
            .ok_or_else(|| Error::IndexUnavailable("Index not initialized".to_string()))?;

        let engine = Arc::new(ChatEngine::from_config(
            &config,
            loaded,
            Arc::clone(&embedder),
            Arc::clone(&llm),
        ));

        let sessions = match config.server.session_idle_secs {
            0 => SessionStore::new(),
            secs => SessionStore::with_idle_timeout(Duration::from_secs(secs)),
        };

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                index,
                engine,
                embedding_provider: embedder,
                llm_provider: llm,
                sessions,
            }),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the chat pipeline
    pub fn engine(&self) -> &Arc<ChatEngine> {
        &self.inner.engine
    }

    /// Get the loaded index, if initialization has finished
    pub fn index(&self) -> Option<Arc<VectorIndex>> {
        self.inner.index.get()
    }

    /// Get the embedding provider
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.inner.embedding_provider
    }

    /// Get the LLM provider
    pub fn llm_provider(&self) -> &Arc<dyn LlmProvider> {
        &self.inner.llm_provider
    }

    /// Get the session registry
    pub fn sessions(&self) -> &SessionStore {
        &self.inner.sessions
    }
}
