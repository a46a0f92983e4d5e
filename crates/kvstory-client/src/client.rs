//! Async HTTP client wrapping the kvstory JSON API.
//!
//! Besides returning typed results, [`StoryClient`] keeps three observable
//! state cells for a UI to render from: the current story list, an in-flight
//! flag, and the last error message. Each is a [`tokio::sync::watch`] channel;
//! call the `subscribe_*` methods to be woken on change.
//!
//! Calls are not serialised against each other. Two overlapping calls may
//! interleave their updates to the flag and the error cell.

use std::time::Duration;

use anyhow::{Context as _, bail};
use kvstory_core::{Envelope, Story, story::now_timestamp};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tokio::sync::watch;

use crate::error::{ClientError, Result};

/// Connection settings for the kvstory API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub timeout:  Duration,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: "http://localhost:8787".to_owned(),
      timeout:  Duration::from_secs(30),
    }
  }
}

/// Sets the in-flight flag for as long as it lives.
struct Loading<'a>(&'a watch::Sender<bool>);

impl<'a> Loading<'a> {
  fn start(flag: &'a watch::Sender<bool>) -> Self {
    flag.send_replace(true);
    Self(flag)
  }
}

impl Drop for Loading<'_> {
  fn drop(&mut self) { self.0.send_replace(false); }
}

/// Async HTTP client for the story API with observable local state.
pub struct StoryClient {
  client:  Client,
  base:    Url,
  stories: watch::Sender<Vec<Story>>,
  loading: watch::Sender<bool>,
  error:   watch::Sender<String>,
}

impl StoryClient {
  pub fn new(config: ApiConfig) -> anyhow::Result<Self> {
    let base = Url::parse(&config.base_url)
      .with_context(|| format!("invalid base URL {:?}", config.base_url))?;
    if base.cannot_be_a_base() {
      bail!("base URL {:?} cannot carry a path", config.base_url);
    }
    let client = Client::builder()
      .timeout(config.timeout)
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self {
      client,
      base,
      stories: watch::Sender::new(Vec::new()),
      loading: watch::Sender::new(false),
      error: watch::Sender::new(String::new()),
    })
  }

  // ── State ─────────────────────────────────────────────────────────────────

  /// Snapshot of the story list from the last successful fetch.
  pub fn stories(&self) -> Vec<Story> { self.stories.borrow().clone() }

  pub fn story_count(&self) -> usize { self.stories.borrow().len() }

  pub fn is_loading(&self) -> bool { *self.loading.borrow() }

  /// The last error message, or empty if the last call succeeded.
  pub fn error(&self) -> String { self.error.borrow().clone() }

  pub fn subscribe_stories(&self) -> watch::Receiver<Vec<Story>> {
    self.stories.subscribe()
  }

  pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
    self.loading.subscribe()
  }

  pub fn subscribe_error(&self) -> watch::Receiver<String> {
    self.error.subscribe()
  }

  /// Find a story in the locally held list. No network call.
  pub fn get_story_by_id(&self, id: &str) -> Option<Story> {
    self.stories.borrow().iter().find(|s| s.id == id).cloned()
  }

  /// Clear the list, the in-flight flag and the error.
  pub fn reset_state(&self) {
    self.stories.send_replace(Vec::new());
    self.loading.send_replace(false);
    self.error.send_replace(String::new());
  }

  // ── Helpers ───────────────────────────────────────────────────────────────

  fn url(&self, segments: &[&str]) -> Url {
    let mut url = self.base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().push("api").extend(segments);
    }
    url
  }

  async fn request<T: DeserializeOwned>(
    &self,
    req: RequestBuilder,
    fallback: &str,
  ) -> Result<Option<T>> {
    let resp = req.send().await?;
    if !resp.status().is_success() {
      return Err(ClientError::Status(resp.status()));
    }
    let envelope: Envelope<T> = resp.json().await?;
    envelope.into_result(fallback).map_err(ClientError::Server)
  }

  /// Store the message of a failed `result` in the error cell.
  fn record<T>(&self, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
      tracing::debug!(error = %e, "story request failed");
      self.error.send_replace(e.to_string());
    }
    result
  }

  fn check_id(&self, id: &str) -> Result<()> {
    if id.is_empty() {
      return self.record(Err(ClientError::InvalidId));
    }
    Ok(())
  }

  // ── Operations ────────────────────────────────────────────────────────────

  /// `GET /api/stories`. Replaces the held list on success.
  pub async fn fetch_stories(&self) -> Result<Vec<Story>> {
    let _loading = Loading::start(&self.loading);
    self.error.send_replace(String::new());

    let result = self
      .request::<Vec<Story>>(self.client.get(self.url(&["stories"])), "获取故事列表失败")
      .await
      .map(|data| {
        data
          .unwrap_or_default()
          .into_iter()
          .map(Story::with_defaults)
          .collect::<Vec<_>>()
      });
    let stories = self.record(result)?;

    self.stories.send_replace(stories.clone());
    Ok(stories)
  }

  /// `GET /api/story/:id`
  pub async fn fetch_story_by_id(&self, id: &str) -> Result<Story> {
    self.check_id(id)?;

    let _loading = Loading::start(&self.loading);
    self.error.send_replace(String::new());

    let result = self
      .request::<Story>(self.client.get(self.url(&["story", id])), "获取故事详情失败")
      .await
      .and_then(|data| {
        data.ok_or_else(|| ClientError::Server("获取故事详情失败".to_owned()))
      });
    self.record(result)
  }

  /// `POST /api/story`, then refresh the list.
  ///
  /// Rejected locally, without a request, unless `id`, `title`, `content`,
  /// `createTime` and `updateTime` are all set.
  pub async fn save_story(&self, story: &Story) -> Result<()> {
    let missing: Vec<&'static str> = [
      ("id", &story.id),
      ("title", &story.title),
      ("content", &story.content),
      ("createTime", &story.create_time),
      ("updateTime", &story.update_time),
    ]
    .into_iter()
    .filter(|(_, value)| value.is_empty())
    .map(|(name, _)| name)
    .collect();
    if !missing.is_empty() {
      return self.record(Err(ClientError::MissingFields(missing)));
    }

    let _loading = Loading::start(&self.loading);
    self.error.send_replace(String::new());

    let result = self
      .request::<String>(self.client.post(self.url(&["story"])).json(story), "保存故事失败")
      .await;
    self.record(result)?;

    self.refresh().await;
    Ok(())
  }

  /// Stamp `update_time` with the local clock, then [`Self::save_story`].
  /// The server restamps it on write, so the local value is only advisory.
  pub async fn update_story(&self, story: &mut Story) -> Result<()> {
    story.update_time = now_timestamp();
    self.save_story(story).await
  }

  /// `DELETE /api/story/:id`, then refresh the list.
  pub async fn delete_story(&self, id: &str) -> Result<()> {
    self.check_id(id)?;

    let _loading = Loading::start(&self.loading);
    self.error.send_replace(String::new());

    let result = self
      .request::<String>(self.client.delete(self.url(&["story", id])), "删除故事失败")
      .await;
    self.record(result)?;

    self.refresh().await;
    Ok(())
  }

  /// Re-list after a write. A failed refresh is already recorded in the error
  /// cell and does not fail the write.
  async fn refresh(&self) {
    if let Err(e) = self.fetch_stories().await {
      tracing::warn!(error = %e, "refresh after write failed");
    }
  }
}
