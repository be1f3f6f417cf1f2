//! Core types for the policy RAG system

pub mod document;
pub mod query;
pub mod response;

pub use document::{Chunk, FileType, SourceDocument};
pub use query::{AskRequest, RetrieveRequest};
pub use response::{
    Answer, ChatResponse, ClearResponse, HistoryResponse, RetrieveResponse, RetrievedChunk,
    SessionCreated,
};
