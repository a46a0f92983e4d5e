//! In-process [`KvConnector`] used by tests and throwaway servers.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, MutexGuard},
};

use serde_json::Value;

use crate::{Error, KvBackend, KvConnector, Result};

type Namespaces = HashMap<String, HashMap<String, String>>;

/// A key-value store held in memory. Cloning shares the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
  inner: Arc<Mutex<Namespaces>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }
}

impl KvConnector for MemoryStore {
  type Backend = MemoryNamespace;
  type Error = Error;

  fn connect(&self, namespace: &str) -> Result<MemoryNamespace> {
    Ok(MemoryNamespace {
      inner:     self.inner.clone(),
      namespace: Arc::from(namespace),
    })
  }
}

/// One namespace of a [`MemoryStore`].
#[derive(Clone)]
pub struct MemoryNamespace {
  inner:     Arc<Mutex<Namespaces>>,
  namespace: Arc<str>,
}

impl MemoryNamespace {
  fn lock(&self) -> MutexGuard<'_, Namespaces> {
    // A poisoned map is still structurally valid; keep serving it.
    self.inner.lock().unwrap_or_else(|e| e.into_inner())
  }

  /// Every key currently stored in this namespace.
  pub fn keys(&self) -> Vec<String> {
    self
      .lock()
      .get(self.namespace.as_ref())
      .map(|ns| ns.keys().cloned().collect())
      .unwrap_or_default()
  }
}

impl KvBackend for MemoryNamespace {
  type Error = Error;

  async fn get(&self, key: &str) -> Result<Option<Value>> {
    let raw = self
      .lock()
      .get(self.namespace.as_ref())
      .and_then(|ns| ns.get(key).cloned());
    raw.map(|s| serde_json::from_str(&s)).transpose().map_err(Error::from)
  }

  async fn put(&self, key: &str, value: String) -> Result<()> {
    self
      .lock()
      .entry(self.namespace.to_string())
      .or_default()
      .insert(key.to_owned(), value);
    Ok(())
  }

  async fn delete(&self, key: &str) -> Result<bool> {
    if let Some(ns) = self.lock().get_mut(self.namespace.as_ref()) {
      ns.remove(key);
    }
    Ok(true)
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[tokio::test]
  async fn put_get_delete() {
    let kv = MemoryStore::new().connect("test").unwrap();
    kv.put("a", r#"{"x":1}"#.into()).await.unwrap();
    assert_eq!(kv.get("a").await.unwrap(), Some(json!({ "x": 1 })));
    assert!(kv.delete("a").await.unwrap());
    assert_eq!(kv.get("a").await.unwrap(), None);
  }

  #[tokio::test]
  async fn namespaces_are_isolated() {
    let store = MemoryStore::new();
    let a = store.connect("a").unwrap();
    let b = store.connect("b").unwrap();
    a.put("k", "1".into()).await.unwrap();
    assert_eq!(b.get("k").await.unwrap(), None);
    assert_eq!(store.connect("a").unwrap().get("k").await.unwrap(), Some(json!(1)));
  }

  #[tokio::test]
  async fn deleting_absent_key_succeeds() {
    let kv = MemoryStore::new().connect("test").unwrap();
    assert!(kv.delete("missing").await.unwrap());
  }

  #[tokio::test]
  async fn invalid_json_surfaces_as_error() {
    let kv = MemoryStore::new().connect("test").unwrap();
    kv.put("bad", "{not json".into()).await.unwrap();
    assert!(kv.get("bad").await.is_err());
  }
}
