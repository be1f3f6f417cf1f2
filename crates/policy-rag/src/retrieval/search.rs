//! Query-time retrieval over the shared index

use std::sync::Arc;
use std::time::Instant;

use crate::error::Result;
use crate::index::VectorIndex;
use crate::providers::EmbeddingProvider;
use crate::types::RetrievedChunk;

/// Embeds a query and returns the most similar chunks
pub struct Retriever {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl Retriever {
    pub fn new(index: Arc<VectorIndex>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { index, embedder }
    }

    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    /// Top `k` chunks for `query`, most similar first
    ///
    /// An empty index returns an empty result without calling the embedder.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        if self.index.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let query_embedding = self.embedder.embed(query).await?;
        let results = self.index.search(&query_embedding, k)?;

        tracing::debug!(
            k,
            results = results.len(),
            top_score = results.first().map(|r| r.score).unwrap_or(0.0),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Retrieved chunks"
        );

        Ok(results)
    }
}
