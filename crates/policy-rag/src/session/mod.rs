//! Conversation state and the session registry

pub mod conversation;
pub mod store;

pub use conversation::{Conversation, Turn};
pub use store::{SessionHandle, SessionStore};
