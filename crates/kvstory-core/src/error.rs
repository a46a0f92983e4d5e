//! Error types for `kvstory-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("story_list 格式错误，预期为数组")]
  MalformedIndex,

  #[error("backend unavailable: {0}")]
  Unavailable(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
