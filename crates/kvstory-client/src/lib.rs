//! Typed client for the kvstory HTTP API.
//!
//! [`StoryClient`] wraps the four story endpoints and keeps observable state
//! (the current list, an in-flight flag, the last error) for a UI layer.

pub mod client;
pub mod error;

pub use client::{ApiConfig, StoryClient};
pub use error::{ClientError, Result};
