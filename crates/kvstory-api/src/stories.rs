//! The four story operations, written against any [`KvBackend`].
//!
//! | Method   | Path              | Notes |
//! |----------|-------------------|-------|
//! | `GET`    | `/api/stories`    | All indexed stories that still have an entry |
//! | `GET`    | `/api/story/:id`  | 404 if the entry is missing |
//! | `POST`   | `/api/story`      | Body: story JSON; `id`, `title`, `content` required |
//! | `DELETE` | `/api/story/:id`  | Removes the entry, then its index membership |
//!
//! Entry and index writes are two separate backend calls with nothing tying
//! them together; see [`crate::repair`] for cleaning up after a crash between
//! them.

use kvstory_core::{
  INDEX_KEY, KvBackend, Story, StoryIndex,
  story::{is_truthy, now_timestamp},
  story_key,
};
use serde_json::Value;
use tokio::task::JoinSet;

use crate::error::ApiError;

pub const SAVED_MESSAGE: &str = "故事保存成功";
pub const DELETED_MESSAGE: &str = "故事删除成功";

/// Fields a POST body must carry with a truthy value.
const REQUIRED_FIELDS: [&str; 3] = ["id", "title", "content"];

/// Read and decode the index.
pub async fn read_index<B: KvBackend>(kv: &B) -> Result<StoryIndex, ApiError> {
  let raw = kv.get(INDEX_KEY).await.map_err(ApiError::store)?;
  StoryIndex::from_value(raw).map_err(|e| {
    tracing::warn!("story index is not an array");
    ApiError::from(e)
  })
}

async fn write_index<B: KvBackend>(
  kv: &B,
  index: &StoryIndex,
) -> Result<(), ApiError> {
  kv.put(INDEX_KEY, index.to_json_string()?)
    .await
    .map_err(ApiError::store)
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// Every story named by the index, in index order.
///
/// Entries are fetched concurrently. Ids whose entry is missing are dropped
/// without comment; entries that are not JSON objects are dropped with a
/// warning.
pub async fn list<B: KvBackend>(kv: &B) -> Result<Vec<Story>, ApiError> {
  let index = read_index(kv).await?;

  let mut tasks = JoinSet::new();
  for (pos, id) in index.ids().iter().cloned().enumerate() {
    let kv = kv.clone();
    tasks.spawn(async move {
      let raw = kv.get(&story_key(&id)).await?;
      Ok::<_, B::Error>((pos, id, raw))
    });
  }

  let mut found = Vec::with_capacity(index.len());
  while let Some(joined) = tasks.join_next().await {
    let (pos, id, raw) = joined
      .map_err(|e| ApiError::Internal(e.to_string()))?
      .map_err(ApiError::store)?;
    let Some(raw) = raw.filter(is_truthy) else {
      tracing::debug!(%id, "indexed story has no entry");
      continue;
    };
    let mut story = match Story::from_value(raw) {
      Ok(story) => story,
      Err(e) => {
        tracing::warn!(%id, error = %e, "skipping undecodable story entry");
        continue;
      }
    };
    story.id = id;
    story.fill_defaults();
    found.push((pos, story));
  }

  found.sort_by_key(|(pos, _)| *pos);
  Ok(found.into_iter().map(|(_, story)| story).collect())
}

// ─── Get one ──────────────────────────────────────────────────────────────────

pub async fn get<B: KvBackend>(kv: &B, id: &str) -> Result<Story, ApiError> {
  if id.is_empty() {
    return Err(ApiError::EmptyId);
  }

  let raw = kv
    .get(&story_key(id))
    .await
    .map_err(ApiError::store)?
    .filter(is_truthy)
    .ok_or(ApiError::StoryNotFound)?;

  let mut story = Story::from_value(raw)?;
  if story.id.is_empty() {
    story.id = id.to_owned();
  }
  story.fill_defaults();
  Ok(story)
}

// ─── Create / update ──────────────────────────────────────────────────────────

/// Write the story in `body` and make sure the index names it. Returns the
/// record as stored.
///
/// `updateTime` is always restamped; `createTime` is kept when the caller
/// sends one, so edits can carry the original creation time forward.
pub async fn save<B: KvBackend>(kv: &B, body: Value) -> Result<Story, ApiError> {
  let Value::Object(fields) = &body else {
    return Err(ApiError::MissingFields);
  };
  let complete = REQUIRED_FIELDS
    .iter()
    .all(|f| fields.get(*f).is_some_and(is_truthy));
  if !complete {
    return Err(ApiError::MissingFields);
  }

  let mut story = Story::from_value(body)?;
  // A nested object passes the truthiness check but decodes to nothing.
  if story.id.is_empty() || story.title.is_empty() || story.content.is_empty() {
    return Err(ApiError::MissingFields);
  }
  let now = now_timestamp();
  if story.create_time.is_empty() {
    story.create_time = now.clone();
  }
  story.update_time = now;
  story.fill_defaults();

  kv.put(&story_key(&story.id), serde_json::to_string(&story)?)
    .await
    .map_err(ApiError::store)?;

  let mut index = read_index(kv).await?;
  if index.push(story.id.clone()) {
    write_index(kv, &index).await?;
  }

  tracing::info!(id = %story.id, "story saved");
  Ok(story)
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// Delete the entry, then drop `id` from the index. The index is left alone
/// if the backend reports the entry delete as failed.
pub async fn delete<B: KvBackend>(kv: &B, id: &str) -> Result<(), ApiError> {
  if id.is_empty() {
    return Err(ApiError::EmptyId);
  }

  let deleted = kv.delete(&story_key(id)).await.map_err(ApiError::store)?;
  if !deleted {
    tracing::warn!(%id, "backend refused to delete story entry");
    return Err(ApiError::DeleteFailed);
  }

  let mut index = read_index(kv).await?;
  index.remove(id);
  write_index(kv, &index).await?;

  tracing::info!(%id, "story deleted");
  Ok(())
}
