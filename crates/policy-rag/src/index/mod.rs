//! Similarity index: in-process store and startup build-or-load

pub mod builder;
pub mod store;

pub use builder::{IndexBuilder, SharedIndex};
pub use store::{cosine_similarity, IndexEntry, IndexMeta, VectorIndex};
