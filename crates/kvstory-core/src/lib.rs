//! Core types and trait definitions for the kvstory content store.
//!
//! This crate is deliberately free of HTTP and database dependencies. The API,
//! the SQLite backend and the client all depend on it.

pub mod envelope;
pub mod error;
pub mod index;
pub mod kv;
pub mod memory;
pub mod story;

pub use envelope::Envelope;
pub use error::{Error, Result};
pub use index::{INDEX_KEY, StoryIndex, story_key};
pub use kv::{KvBackend, KvConnector};
pub use memory::{MemoryNamespace, MemoryStore};
pub use story::Story;

/// Namespace the store operates in unless configured otherwise.
pub const DEFAULT_NAMESPACE: &str = "kvstory";
