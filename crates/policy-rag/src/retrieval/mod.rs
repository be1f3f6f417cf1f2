//! Retrieval of relevant chunks for a query

pub mod search;

pub use search::Retriever;
