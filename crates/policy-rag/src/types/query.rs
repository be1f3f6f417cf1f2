//! Request types for the session boundary

use serde::{Deserialize, Serialize};

/// A question asked within a conversation session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    /// The question to answer
    pub question: String,
}

/// A bare retrieval request (used by evaluation tooling)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieveRequest {
    /// Query text
    pub query: String,
    /// Number of chunks to return (defaults to the configured top_k)
    #[serde(default)]
    pub k: Option<usize>,
}
