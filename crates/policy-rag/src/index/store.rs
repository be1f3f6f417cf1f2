//! In-process vector index with exact cosine search and directory persistence
//!
//! A persisted index is a directory holding two files:
//! - `index.json`: every chunk with its embedding vector, in insertion order
//! - `meta.json`: embedding model, dimensions, chunk count, corpus fingerprint

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{Chunk, RetrievedChunk};

/// File holding chunks and vectors
pub const INDEX_FILE: &str = "index.json";

/// File holding index metadata
pub const META_FILE: &str = "meta.json";

/// A chunk paired with its embedding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// Metadata stored next to a persisted index
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexMeta {
    /// Embedding model the vectors were produced with
    pub embed_model: String,
    /// Vector dimensions (0 for an empty index)
    pub dimensions: usize,
    /// Number of chunks
    pub chunk_count: usize,
    /// sha256 over chunk sources and texts
    pub fingerprint: String,
    /// When the index was built
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
struct IndexFile {
    entries: Vec<IndexEntry>,
}

/// Read-only similarity index over (chunk, vector) pairs
#[derive(Debug, Clone)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    meta: IndexMeta,
}

impl VectorIndex {
    /// An index with no chunks; every search returns nothing
    pub fn empty(embed_model: impl Into<String>) -> Self {
        Self {
            entries: Vec::new(),
            meta: IndexMeta {
                embed_model: embed_model.into(),
                dimensions: 0,
                chunk_count: 0,
                fingerprint: corpus_fingerprint(&[]),
                created_at: Utc::now(),
            },
        }
    }

    /// Pair chunks with their vectors
    ///
    /// Fails when the counts differ or the vectors do not share one dimension.
    pub fn from_parts(
        chunks: Vec<Chunk>,
        vectors: Vec<Vec<f32>>,
        embed_model: impl Into<String>,
    ) -> Result<Self> {
        if chunks.len() != vectors.len() {
            return Err(Error::index(format!(
                "{} chunks but {} vectors",
                chunks.len(),
                vectors.len()
            )));
        }

        let dimensions = vectors.first().map(Vec::len).unwrap_or(0);
        if let Some(bad) = vectors.iter().position(|v| v.len() != dimensions) {
            return Err(Error::index(format!(
                "Vector {} has {} dimensions, expected {}",
                bad,
                vectors[bad].len(),
                dimensions
            )));
        }

        let fingerprint = corpus_fingerprint(&chunks);
        let entries: Vec<IndexEntry> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexEntry { chunk, vector })
            .collect();

        Ok(Self {
            meta: IndexMeta {
                embed_model: embed_model.into(),
                dimensions,
                chunk_count: entries.len(),
                fingerprint,
                created_at: Utc::now(),
            },
            entries,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn meta(&self) -> &IndexMeta {
        &self.meta
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Top `k` chunks by cosine similarity, most similar first
    ///
    /// Equal scores keep insertion order. An empty index yields an empty result.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<RetrievedChunk>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        if query.len() != self.meta.dimensions {
            return Err(Error::index(format!(
                "Query has {} dimensions but the index has {}; was it built with a different embedding model?",
                query.len(),
                self.meta.dimensions
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(query, &entry.vector)))
            .collect();

        // sort_by is stable, so ties stay in insertion order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| RetrievedChunk {
                chunk: self.entries[i].chunk.clone(),
                score,
            })
            .collect())
    }

    /// Whether `dir` holds a persisted index
    pub fn exists(dir: &Path) -> bool {
        dir.join(INDEX_FILE).is_file() && dir.join(META_FILE).is_file()
    }

    /// Persist into `dir`, creating it if needed
    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;

        let writer = BufWriter::new(File::create(dir.join(INDEX_FILE))?);
        serde_json::to_writer(
            writer,
            &IndexFile {
                entries: self.entries.clone(),
            },
        )?;

        // Metadata last: a directory without meta.json is not treated as an index
        let writer = BufWriter::new(File::create(dir.join(META_FILE))?);
        serde_json::to_writer_pretty(writer, &self.meta)?;

        tracing::debug!(dir = %dir.display(), chunks = self.len(), "Index persisted");
        Ok(())
    }

    /// Load a persisted index from `dir`
    pub fn load(dir: &Path) -> Result<Self> {
        let meta: IndexMeta = read_json(&dir.join(META_FILE))?;
        let file: IndexFile = read_json(&dir.join(INDEX_FILE))?;

        if file.entries.len() != meta.chunk_count {
            return Err(Error::index(format!(
                "{} lists {} chunks but {} holds {}",
                META_FILE,
                meta.chunk_count,
                INDEX_FILE,
                file.entries.len()
            )));
        }
        if let Some(entry) = file.entries.iter().find(|e| e.vector.len() != meta.dimensions) {
            return Err(Error::index(format!(
                "Chunk {} has a {}-dimensional vector, expected {}",
                entry.chunk.position,
                entry.vector.len(),
                meta.dimensions
            )));
        }

        Ok(Self {
            entries: file.entries,
            meta,
        })
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path)
        .map_err(|e| Error::index(format!("Failed to open {}: {}", path.display(), e)))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| Error::index(format!("Failed to parse {}: {}", path.display(), e)))
}

/// sha256 over every chunk's source and text, hex encoded
pub fn corpus_fingerprint(chunks: &[Chunk]) -> String {
    let mut hasher = Sha256::new();
    for chunk in chunks {
        hasher.update(chunk.source.as_bytes());
        hasher.update([0u8]);
        hasher.update(chunk.text.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

/// Cosine similarity; 0.0 when either vector has zero magnitude
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn chunk(text: &str, source: &str, position: u32) -> Chunk {
        Chunk::new(
            text.to_string(),
            source.to_string(),
            position,
            0,
            text.chars().count(),
        )
    }

    fn sample_index() -> VectorIndex {
        VectorIndex::from_parts(
            vec![
                chunk("Extras cover includes dental.", "extras.txt", 0),
                chunk("Gold hospital cover includes private room.", "gold.txt", 1),
                chunk("Claims can be submitted online.", "claims.txt", 2),
            ],
            vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0], vec![0.7, 0.7, 0.0]],
            "test-embed",
        )
        .unwrap()
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_search_orders_by_similarity() {
        let index = sample_index();
        let results = index.search(&[1.0, 0.1, 0.0], 3).unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].chunk.source, "extras.txt");
        assert_eq!(results[1].chunk.source, "claims.txt");
        assert_eq!(results[2].chunk.source, "gold.txt");
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let index = VectorIndex::from_parts(
            vec![chunk("first", "a", 0), chunk("second", "b", 1), chunk("third", "c", 2)],
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0]],
            "m",
        )
        .unwrap();

        let results = index.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(results[0].chunk.text, "first");
        assert_eq!(results[1].chunk.text, "third");
    }

    #[test]
    fn test_empty_index_returns_nothing() {
        let index = VectorIndex::empty("m");
        assert!(index.search(&[1.0, 2.0, 3.0], 4).unwrap().is_empty());
        assert!(index.is_empty());
    }

    #[test]
    fn test_dimension_mismatch() {
        let index = sample_index();
        assert!(matches!(index.search(&[1.0, 0.0], 2), Err(Error::Index(_))));

        let err = VectorIndex::from_parts(
            vec![chunk("a", "a", 0), chunk("b", "b", 1)],
            vec![vec![1.0, 0.0], vec![1.0]],
            "m",
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let index = sample_index();

        assert!(!VectorIndex::exists(dir.path()));
        index.save(dir.path()).unwrap();
        assert!(VectorIndex::exists(dir.path()));

        let loaded = VectorIndex::load(dir.path()).unwrap();
        assert_eq!(loaded.entries(), index.entries());
        assert_eq!(loaded.meta().embed_model, "test-embed");
        assert_eq!(loaded.meta().dimensions, 3);
        assert_eq!(loaded.meta().fingerprint, index.meta().fingerprint);
    }

    #[test]
    fn test_load_rejects_inconsistent_meta() {
        let dir = tempfile::tempdir().unwrap();
        sample_index().save(dir.path()).unwrap();

        let meta_path = dir.path().join(META_FILE);
        let mut meta: IndexMeta =
            serde_json::from_str(&std::fs::read_to_string(&meta_path).unwrap()).unwrap();
        meta.chunk_count = 7;
        std::fs::write(&meta_path, serde_json::to_string(&meta).unwrap()).unwrap();

        assert!(matches!(VectorIndex::load(dir.path()), Err(Error::Index(_))));
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = [chunk("Dental", "extras.txt", 0)];
        let b = [chunk("Optical", "extras.txt", 0)];
        assert_eq!(corpus_fingerprint(&a), corpus_fingerprint(&a));
        assert_ne!(corpus_fingerprint(&a), corpus_fingerprint(&b));
    }

    fn arb_index() -> impl Strategy<Value = VectorIndex> {
        prop::collection::vec(prop::collection::vec(-1.0f32..1.0, 4), 0..30).prop_map(|vectors| {
            let chunks = (0..vectors.len())
                .map(|i| chunk(&format!("chunk {}", i), "doc", i as u32))
                .collect();
            VectorIndex::from_parts(chunks, vectors, "m").unwrap()
        })
    }

    proptest! {
        #[test]
        fn search_never_exceeds_k(
            index in arb_index(),
            query in prop::collection::vec(-1.0f32..1.0, 4),
            k in 0usize..10,
        ) {
            let results = index.search(&query, k).unwrap();
            prop_assert!(results.len() <= k);
            prop_assert_eq!(results.len(), k.min(index.len()));
        }

        #[test]
        fn search_is_sorted_descending(
            index in arb_index(),
            query in prop::collection::vec(-1.0f32..1.0, 4),
        ) {
            let results = index.search(&query, 10).unwrap();
            for pair in results.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
                if pair[0].score == pair[1].score {
                    prop_assert!(pair[0].chunk.position < pair[1].chunk.position);
                }
            }
        }
    }
}
