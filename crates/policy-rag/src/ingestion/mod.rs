//! Document ingestion: source providers and chunking

mod chunker;
pub mod provider;

pub use chunker::TextChunker;
pub use provider::{DirectoryProvider, DocumentProvider, StaticProvider};
