//! The `{ success, data?, error? }` wire envelope.
//!
//! Handlers and the client work with typed `Result`s; the envelope is only the
//! serialised form that crosses HTTP.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
  pub success: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub data:    Option<T>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error:   Option<String>,
}

impl<T> Envelope<T> {
  pub fn ok(data: T) -> Self {
    Self { success: true, data: Some(data), error: None }
  }

  pub fn err(message: impl Into<String>) -> Self {
    Self { success: false, data: None, error: Some(message.into()) }
  }

  /// Convert into a `Result`, using `fallback` when a failed envelope carries
  /// no message.
  pub fn into_result(self, fallback: &str) -> Result<Option<T>, String> {
    if self.success {
      Ok(self.data)
    } else {
      Err(self.error.unwrap_or_else(|| fallback.to_owned()))
    }
  }
}
