//! Text chunking into overlapping fixed-size windows

use crate::types::{Chunk, SourceDocument};

/// Text chunker with configurable size and overlap
///
/// Sizes are measured in characters. A window is cut at the last whitespace
/// inside it when one exists past the overlap region, so words are rarely
/// split; the next window always starts exactly `overlap` characters before
/// the previous one ended.
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap between consecutive chunks
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker
    ///
    /// `overlap` is clamped below `chunk_size` so every window makes progress.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
        }
    }

    /// Chunk every document, assigning corpus-wide positions in order
    ///
    /// Blank documents contribute no chunks and are logged.
    pub fn chunk_documents(&self, documents: &[SourceDocument]) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for doc in documents {
            if doc.is_blank() {
                tracing::warn!(source = %doc.source, "Skipping document with no usable text");
                continue;
            }

            let start_position = chunks.len() as u32;
            let doc_chunks = self.chunk_text(&doc.text, &doc.source, start_position);
            tracing::debug!(source = %doc.source, chunks = doc_chunks.len(), "Chunked document");
            chunks.extend(doc_chunks);
        }

        chunks
    }

    /// Chunk one document's text
    pub fn chunk_text(&self, text: &str, source: &str, start_position: u32) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let mut chunks = Vec::new();
        let mut start = 0usize;
        let mut position = start_position;

        loop {
            let end = self.window_end(&chars, start);
            let content: String = chars[start..end].iter().collect();

            chunks.push(Chunk::new(
                content,
                source.to_string(),
                position,
                start,
                end,
            ));
            position += 1;

            if end >= total {
                break;
            }
            start = end - self.overlap;
        }

        chunks
    }

    /// End of the window starting at `start` (exclusive)
    fn window_end(&self, chars: &[char], start: usize) -> usize {
        let hard_end = (start + self.chunk_size).min(chars.len());
        if hard_end == chars.len() {
            return hard_end;
        }

        // Prefer ending on whitespace, but never inside the overlap region
        let earliest = start + self.overlap + 1;
        (earliest..hard_end)
            .rev()
            .find(|&i| chars[i].is_whitespace())
            .map(|i| i + 1)
            .unwrap_or(hard_end)
    }
}
