//! [`SqliteStore`], the SQLite implementation of [`KvConnector`].

use std::{path::Path, sync::Arc};

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use serde_json::Value;

use kvstory_core::{KvBackend, KvConnector};

use crate::{Error, Result, schema::SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A key-value store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

impl KvConnector for SqliteStore {
  type Backend = SqliteNamespace;
  type Error = Error;

  fn connect(&self, namespace: &str) -> Result<SqliteNamespace> {
    if namespace.trim().is_empty() {
      return Err(Error::InvalidNamespace(namespace.to_owned()));
    }
    Ok(SqliteNamespace {
      conn:      self.conn.clone(),
      namespace: Arc::from(namespace),
    })
  }
}

// ─── Namespace handle ────────────────────────────────────────────────────────

/// One namespace of a [`SqliteStore`].
#[derive(Clone)]
pub struct SqliteNamespace {
  conn:      tokio_rusqlite::Connection,
  namespace: Arc<str>,
}

impl KvBackend for SqliteNamespace {
  type Error = Error;

  async fn get(&self, key: &str) -> Result<Option<Value>> {
    let ns = self.namespace.to_string();
    let key = key.to_owned();

    let raw: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT value FROM entries WHERE namespace = ?1 AND key = ?2",
              rusqlite::params![ns, key],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(raw.map(|s| serde_json::from_str(&s)).transpose()?)
  }

  async fn put(&self, key: &str, value: String) -> Result<()> {
    let ns = self.namespace.to_string();
    let key = key.to_owned();
    let at = Utc::now().to_rfc3339();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO entries (namespace, key, value, updated_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (namespace, key)
           DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
          rusqlite::params![ns, key, value, at],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete(&self, key: &str) -> Result<bool> {
    let ns = self.namespace.to_string();
    let key = key.to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM entries WHERE namespace = ?1 AND key = ?2",
          rusqlite::params![ns, key],
        )?;
        Ok(())
      })
      .await?;
    Ok(true)
  }
}
