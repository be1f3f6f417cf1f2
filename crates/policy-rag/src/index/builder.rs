//! Index build-or-load at startup

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::OnceCell;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::ingestion::{DirectoryProvider, DocumentProvider, StaticProvider, TextChunker};
use crate::providers::EmbeddingProvider;
use crate::types::Chunk;

use super::store::{corpus_fingerprint, VectorIndex};

/// Loads the persisted index or builds and persists a new one
pub struct IndexBuilder {
    directory: PathBuf,
    verify_fingerprint: bool,
    dimensions: usize,
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    documents: Arc<dyn DocumentProvider>,
}

impl IndexBuilder {
    /// Create a builder over an explicit document provider
    pub fn new(
        config: &RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        documents: Arc<dyn DocumentProvider>,
    ) -> Self {
        Self {
            directory: config.index.directory.clone(),
            verify_fingerprint: config.index.verify_fingerprint,
            dimensions: config.embeddings.dimensions,
            chunker: TextChunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap),
            embedder,
            documents,
        }
    }

    /// Create a builder reading `documents_dir`, or the demo corpus when unset
    pub fn from_config(config: &RagConfig, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        let documents: Arc<dyn DocumentProvider> = match &config.index.documents_dir {
            Some(dir) => Arc::new(DirectoryProvider::new(dir.clone())),
            None => Arc::new(StaticProvider::demo()),
        };
        Self::new(config, embedder, documents)
    }

    /// Load the persisted index if there is one, otherwise build it
    ///
    /// A persisted index is reused as is unless `verify_fingerprint` is set and
    /// the current corpus no longer matches it.
    pub async fn load_or_build(&self) -> Result<VectorIndex> {
        if VectorIndex::exists(&self.directory) {
            let dir = self.directory.clone();
            let index = tokio::task::spawn_blocking(move || VectorIndex::load(&dir))
                .await
                .map_err(|e| Error::Internal(format!("Task join error: {}", e)))??;

            if index.meta().embed_model != self.embedder.model() {
                tracing::warn!(
                    index_model = %index.meta().embed_model,
                    query_model = %self.embedder.model(),
                    "Persisted index was built with a different embedding model"
                );
            }

            if !index.is_empty() && index.meta().dimensions != self.dimensions {
                tracing::warn!(
                    index_dimensions = index.meta().dimensions,
                    configured = self.dimensions,
                    "Persisted index dimensions differ from configuration"
                );
            }

            if self.verify_fingerprint {
                let chunks = self.load_chunks().await?;
                let current = corpus_fingerprint(&chunks);
                if current != index.meta().fingerprint {
                    tracing::info!(
                        dir = %self.directory.display(),
                        "Corpus changed since the index was built, rebuilding"
                    );
                    return self.build_from_chunks(chunks).await;
                }
            }

            tracing::info!(
                dir = %self.directory.display(),
                chunks = index.len(),
                "Loaded persisted index"
            );
            return Ok(index);
        }

        let chunks = self.load_chunks().await?;
        self.build_from_chunks(chunks).await
    }

    async fn load_chunks(&self) -> Result<Vec<Chunk>> {
        let documents = self.documents.load_documents().await?;
        let chunks = self.chunker.chunk_documents(&documents);
        tracing::debug!(
            provider = self.documents.name(),
            documents = documents.len(),
            chunks = chunks.len(),
            "Chunked corpus"
        );
        Ok(chunks)
    }

    async fn build_from_chunks(&self, chunks: Vec<Chunk>) -> Result<VectorIndex> {
        if chunks.is_empty() {
            tracing::warn!("Corpus produced no chunks; serving an empty index");
            return Ok(VectorIndex::empty(self.embedder.model()));
        }

        let start = Instant::now();
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await.map_err(|e| {
            Error::IndexUnavailable(format!(
                "No persisted index at {} and embedding failed: {}",
                self.directory.display(),
                e
            ))
        })?;

        let index = VectorIndex::from_parts(chunks, vectors, self.embedder.model())?;

        let dir = self.directory.clone();
        let index = tokio::task::spawn_blocking(move || index.save(&dir).map(|_| index))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))??;

        tracing::info!(
            dir = %self.directory.display(),
            chunks = index.len(),
            dimensions = index.meta().dimensions,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Built and persisted index"
        );
        Ok(index)
    }
}

/// At-most-once startup gate around the index
///
/// Concurrent callers wait for the first build instead of starting their own.
#[derive(Default)]
pub struct SharedIndex {
    cell: OnceCell<Arc<VectorIndex>>,
}

impl SharedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an index that is already available
    pub fn ready(index: VectorIndex) -> Self {
        Self {
            cell: OnceCell::new_with(Some(Arc::new(index))),
        }
    }

    /// Get the index, building or loading it on first use
    pub async fn get_or_init(&self, builder: &IndexBuilder) -> Result<Arc<VectorIndex>> {
        self.cell
            .get_or_try_init(|| async { builder.load_or_build().await.map(Arc::new) })
            .await
            .cloned()
    }

    /// The index if initialization has completed
    pub fn get(&self) -> Option<Arc<VectorIndex>> {
        self.cell.get().cloned()
    }
}
