//! Index reconciliation.
//!
//! A crash between deleting an entry and rewriting the index leaves ids in
//! the index that no longer resolve. Listing already skips those; this pass
//! removes them for good.

use kvstory_core::{KvBackend, story::is_truthy, story_key};

use crate::{error::ApiError, stories::read_index};

/// Remove every id whose entry is missing from the index. Returns the removed
/// ids in index order; the index is only rewritten when something changed.
pub async fn prune_index<B: KvBackend>(kv: &B) -> Result<Vec<String>, ApiError> {
  let mut index = read_index(kv).await?;

  let mut orphans = Vec::new();
  for id in index.ids() {
    let entry = kv.get(&story_key(id)).await.map_err(ApiError::store)?;
    if !entry.as_ref().is_some_and(is_truthy) {
      orphans.push(id.clone());
    }
  }

  if orphans.is_empty() {
    return Ok(orphans);
  }

  for id in &orphans {
    index.remove(id);
  }
  kv.put(kvstory_core::INDEX_KEY, index.to_json_string()?)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(pruned = orphans.len(), "pruned orphaned index entries");
  Ok(orphans)
}

#[cfg(test)]
mod tests {
  use kvstory_core::{INDEX_KEY, KvConnector, MemoryStore, StoryIndex};

  use super::*;

  #[tokio::test]
  async fn removes_only_missing_entries() {
    let kv = MemoryStore::new().connect("test").unwrap();
    kv.put(INDEX_KEY, r#"["1","2","3"]"#.into()).await.unwrap();
    kv.put("story_1", r#"{"id":"1"}"#.into()).await.unwrap();
    kv.put("story_3", r#"{"id":"3"}"#.into()).await.unwrap();

    let pruned = prune_index(&kv).await.unwrap();
    assert_eq!(pruned, ["2"]);

    let index = StoryIndex::from_value(kv.get(INDEX_KEY).await.unwrap()).unwrap();
    assert_eq!(index.ids(), ["1", "3"]);
  }

  #[tokio::test]
  async fn consistent_index_is_left_alone() {
    let kv = MemoryStore::new().connect("test").unwrap();
    kv.put(INDEX_KEY, r#"["1"]"#.into()).await.unwrap();
    kv.put("story_1", r#"{"id":"1"}"#.into()).await.unwrap();

    assert!(prune_index(&kv).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn malformed_index_is_reported() {
    let kv = MemoryStore::new().connect("test").unwrap();
    kv.put(INDEX_KEY, r#"{"not":"an array"}"#.into()).await.unwrap();

    assert!(matches!(
      prune_index(&kv).await,
      Err(ApiError::MalformedIndex)
    ));
  }
}
