//! Key naming and the denormalised story index.
//!
//! The index lives under [`INDEX_KEY`] as a JSON array of id strings. It is
//! maintained by read-modify-write alongside the per-story entries and is not
//! guaranteed to agree with them.

use serde_json::Value;

use crate::{
  Error, Result,
  story::{is_truthy, scalar_to_string},
};

/// Key of the index entry.
pub const INDEX_KEY: &str = "story_list";

/// Key of the entry holding story `id`.
pub fn story_key(id: &str) -> String { format!("story_{id}") }

/// Ordered, duplicate-free list of story ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryIndex {
  ids: Vec<String>,
}

impl StoryIndex {
  /// Decode the index from the value stored under [`INDEX_KEY`].
  ///
  /// An absent or falsy value is an empty index. Any other non-array value
  /// fails with [`Error::MalformedIndex`]. Numeric ids are stringified; empty
  /// and non-scalar items are skipped.
  ///
  /// Skipped items and duplicates are not kept: the next save or delete
  /// writes the index back as the canonical id list only.
  pub fn from_value(value: Option<Value>) -> Result<Self> {
    let items = match value {
      None => return Ok(Self::default()),
      Some(Value::Array(items)) => items,
      Some(v) if !is_truthy(&v) => return Ok(Self::default()),
      Some(_) => return Err(Error::MalformedIndex),
    };

    let mut index = Self::default();
    for item in items.iter().filter(|v| is_truthy(v)) {
      if let Some(id) = scalar_to_string(item) {
        index.push(id);
      }
    }
    Ok(index)
  }

  pub fn ids(&self) -> &[String] { &self.ids }

  pub fn len(&self) -> usize { self.ids.len() }

  pub fn is_empty(&self) -> bool { self.ids.is_empty() }

  pub fn contains(&self, id: &str) -> bool { self.ids.iter().any(|i| i == id) }

  /// Append `id` unless already present. Returns whether it was added.
  pub fn push(&mut self, id: impl Into<String>) -> bool {
    let id = id.into();
    if self.contains(&id) {
      return false;
    }
    self.ids.push(id);
    true
  }

  /// Remove `id`. Returns whether it was present.
  pub fn remove(&mut self, id: &str) -> bool {
    let before = self.ids.len();
    self.ids.retain(|i| i != id);
    self.ids.len() != before
  }

  /// Serialised form written back under [`INDEX_KEY`].
  pub fn to_json_string(&self) -> Result<String> {
    Ok(serde_json::to_string(&self.ids)?)
  }
}

impl FromIterator<String> for StoryIndex {
  fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
    let mut index = Self::default();
    for id in iter {
      index.push(id);
    }
    index
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn missing_index_is_empty() {
    assert!(StoryIndex::from_value(None).unwrap().is_empty());
    assert!(StoryIndex::from_value(Some(json!(null))).unwrap().is_empty());
  }

  #[test]
  fn non_array_index_is_malformed() {
    let err = StoryIndex::from_value(Some(json!({ "0": "1" }))).unwrap_err();
    assert!(matches!(err, Error::MalformedIndex));
    assert!(StoryIndex::from_value(Some(json!("1,2"))).is_err());
  }

  #[test]
  fn mixed_ids_are_canonicalised_and_deduplicated() {
    let index =
      StoryIndex::from_value(Some(json!(["1", 2, "", null, "2", "3"]))).unwrap();
    assert_eq!(index.ids(), ["1", "2", "3"]);
  }

  #[test]
  fn rewrite_keeps_only_canonical_ids() {
    let mut index =
      StoryIndex::from_value(Some(json!([0, "a", { "x": 1 }, 7, "a"]))).unwrap();
    index.remove("a");
    assert_eq!(index.to_json_string().unwrap(), r#"["7"]"#);
  }

  #[test]
  fn push_ignores_duplicates() {
    let mut index = StoryIndex::default();
    assert!(index.push("a"));
    assert!(!index.push("a"));
    assert_eq!(index.len(), 1);
  }

  #[test]
  fn remove_preserves_order() {
    let mut index: StoryIndex =
      ["1", "2", "3"].into_iter().map(String::from).collect();
    assert!(index.remove("2"));
    assert!(!index.remove("9"));
    assert_eq!(index.to_json_string().unwrap(), r#"["1","3"]"#);
  }

  #[test]
  fn story_keys_are_prefixed() {
    assert_eq!(story_key("42"), "story_42");
  }
}
