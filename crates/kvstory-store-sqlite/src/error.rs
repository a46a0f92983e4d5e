//! Error type for `kvstory-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("invalid namespace: {0:?}")]
  InvalidNamespace(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
