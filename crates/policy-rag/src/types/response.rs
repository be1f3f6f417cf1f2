//! Response types for retrieval and chat turns

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use super::document::Chunk;
use crate::session::Turn;

/// A chunk returned by the retriever with its relevance score
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedChunk {
    /// The retrieved chunk
    pub chunk: Chunk,
    /// Cosine similarity to the query (-1.0 to 1.0, higher is more similar)
    pub score: f32,
}

/// Answer produced for one turn
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    /// Raw model output
    pub text: String,
    /// Filenames of disclosed sources; `None` when the grounding check failed
    pub sources: Option<BTreeSet<String>>,
}

impl Answer {
    /// An answer whose sources are not disclosed
    pub fn undisclosed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sources: None,
        }
    }

    /// Whether sources are shown alongside this answer
    pub fn discloses_sources(&self) -> bool {
        self.sources.is_some()
    }
}

/// What the session boundary returns to the caller
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    /// Formatted answer text
    pub answer: String,
    /// Disclosed source filenames (absent when not grounded)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sources: Option<BTreeSet<String>>,
    /// Number of chunks retrieved for this turn
    pub chunks_retrieved: usize,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

impl ChatResponse {
    /// Build a response from a formatted answer and its disclosure decision
    pub fn new(
        answer: String,
        sources: Option<BTreeSet<String>>,
        chunks_retrieved: usize,
        processing_time_ms: u64,
    ) -> Self {
        Self {
            answer,
            sources,
            chunks_retrieved,
            processing_time_ms,
        }
    }

    /// Sources for display, as a comma separated list
    pub fn sources_line(&self) -> Option<String> {
        self.sources
            .as_ref()
            .map(|s| s.iter().cloned().collect::<Vec<_>>().join(", "))
    }
}

/// Response from the bare retrieval endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieveResponse {
    /// Retrieved chunks, most similar first
    pub results: Vec<RetrievedChunk>,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// A newly created conversation session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCreated {
    pub session_id: Uuid,
}

/// Turns recorded in a session, oldest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub session_id: Uuid,
    pub turns: Vec<Turn>,
}

/// Confirmation that a session's history is now empty
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearResponse {
    pub cleared: bool,
    pub turns: usize,
}

impl ClearResponse {
    pub fn cleared() -> Self {
        Self {
            cleared: true,
            turns: 0,
        }
    }
}
