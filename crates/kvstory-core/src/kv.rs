//! The key-value backend abstraction.
//!
//! A [`KvConnector`] is created once at startup and handed to the API. Each
//! request calls [`KvConnector::connect`] with the namespace it works in and
//! gets back a cheap [`KvBackend`] handle scoped to that namespace.

use std::future::Future;

use serde_json::Value;

/// A handle onto one namespace of a key-value store.
///
/// The backend serialises operations on a single key but offers no
/// transactions across keys. Handles are cheap to clone so per-key reads can
/// be spawned onto the runtime.
pub trait KvBackend: Clone + Send + Sync + 'static {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read `key` and decode it as JSON. Returns `None` if the key is absent.
  fn get(
    &self,
    key: &str,
  ) -> impl Future<Output = Result<Option<Value>, Self::Error>> + Send;

  /// Store `value` (a serialised JSON document) under `key`, replacing any
  /// previous value.
  fn put(
    &self,
    key: &str,
    value: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send;

  /// Remove `key`. The returned flag is the backend's own verdict on whether
  /// the deletion succeeded; deleting an absent key is not an error.
  fn delete(&self, key: &str)
  -> impl Future<Output = Result<bool, Self::Error>> + Send;
}

/// Factory for [`KvBackend`] handles.
pub trait KvConnector: Send + Sync + 'static {
  type Backend: KvBackend;
  type Error: std::error::Error + Send + Sync + 'static;

  /// Open a handle onto `namespace`. Failing here means the store is
  /// unavailable for the whole request.
  fn connect(&self, namespace: &str) -> Result<Self::Backend, Self::Error>;
}
