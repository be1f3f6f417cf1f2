//! policy-rag: Conversational question answering over health insurance policy documents
//!
//! Policy documents are chunked, embedded, and held in a persisted similarity
//! index. Each question is answered by a language model from the retrieved
//! policy text only; sources are disclosed when the answer visibly reuses that
//! text, and multi-turn context is kept per session.

pub mod chat;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod generation;
pub mod index;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use chat::ChatEngine;
pub use config::RagConfig;
pub use error::{Error, Result};
pub use session::{Conversation, Turn};
pub use types::{
    document::{Chunk, SourceDocument},
    response::{Answer, ChatResponse, RetrievedChunk},
};
