//! The `Story` record and the defaulting rules shared by server and client.
//!
//! Stored entries are loosely typed JSON written by earlier versions of the
//! store and by hand, so every string field is read leniently: numbers are
//! stringified, while falsy values (`null`, `false`, `0`, `""`) and nested
//! arrays or objects read as empty and so pick up their default. Fields the
//! record does not know about are carried through untouched in
//! [`Story::extra`].

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::Result;

// ─── Defaults ────────────────────────────────────────────────────────────────

pub const DEFAULT_TITLE: &str = "无标题";
pub const DEFAULT_INTRO: &str = "无简介";
pub const DEFAULT_COVER: &str = "https://picsum.photos/1440/1080";
pub const DEFAULT_AUTHOR: &str = "匿名作者";
pub const DEFAULT_STORY_TYPE: &str = "未分类";

/// Number of characters of `content` used when backfilling `intro`.
pub const INTRO_LEN: usize = 100;

// ─── Story ───────────────────────────────────────────────────────────────────

/// A single story, persisted under [`crate::story_key`] as one JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
  #[serde(default, deserialize_with = "lenient_string")]
  pub id:          String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub title:       String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub content:     String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub intro:       String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub cover:       String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub author:      String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub story_type:  String,
  /// RFC 3339 timestamp; written once on creation.
  #[serde(default, deserialize_with = "lenient_string")]
  pub create_time: String,
  /// RFC 3339 timestamp; restamped on every write.
  #[serde(default, deserialize_with = "lenient_string")]
  pub update_time: String,
  /// Any other fields present on the stored record.
  #[serde(flatten)]
  pub extra:       Map<String, Value>,
}

impl Story {
  /// Convenience constructor with only the required fields set.
  pub fn new(
    id: impl Into<String>,
    title: impl Into<String>,
    content: impl Into<String>,
  ) -> Self {
    Self {
      id: id.into(),
      title: title.into(),
      content: content.into(),
      ..Self::default()
    }
  }

  /// Decode a story from a raw JSON value as returned by the backend.
  pub fn from_value(value: Value) -> Result<Self> {
    Ok(serde_json::from_value(value)?)
  }

  /// Fill every absent display field with its default.
  ///
  /// `intro` falls back to the first [`INTRO_LEN`] characters of `content`, or
  /// to [`DEFAULT_INTRO`] when there is no content either. `update_time` falls
  /// back to `create_time`.
  pub fn fill_defaults(&mut self) {
    if self.title.is_empty() {
      self.title = DEFAULT_TITLE.to_owned();
    }
    if self.intro.is_empty() {
      self.intro = if self.content.is_empty() {
        DEFAULT_INTRO.to_owned()
      } else {
        excerpt(&self.content)
      };
    }
    if self.cover.is_empty() {
      self.cover = DEFAULT_COVER.to_owned();
    }
    if self.author.is_empty() {
      self.author = DEFAULT_AUTHOR.to_owned();
    }
    if self.story_type.is_empty() {
      self.story_type = DEFAULT_STORY_TYPE.to_owned();
    }
    if self.update_time.is_empty() {
      self.update_time = self.create_time.clone();
    }
  }

  /// [`Story::fill_defaults`] by value.
  pub fn with_defaults(mut self) -> Self {
    self.fill_defaults();
    self
  }
}

/// The first [`INTRO_LEN`] characters of `content`.
pub fn excerpt(content: &str) -> String {
  content.chars().take(INTRO_LEN).collect()
}

/// Current UTC time in the `2024-01-31T12:00:00.000Z` form.
pub fn now_timestamp() -> String {
  Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// JavaScript-style truthiness, used for "required field" checks on raw
/// request bodies.
pub fn is_truthy(value: &Value) -> bool {
  match value {
    Value::Null => false,
    Value::Bool(b) => *b,
    Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
    Value::String(s) => !s.is_empty(),
    Value::Array(_) | Value::Object(_) => true,
  }
}

/// Canonical string form of a scalar JSON value, or `None` for values that
/// cannot name a story.
pub fn scalar_to_string(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    Value::Null | Value::Array(_) | Value::Object(_) => None,
  }
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Value::deserialize(deserializer)?;
  if !is_truthy(&value) {
    return Ok(String::new());
  }
  Ok(scalar_to_string(&value).unwrap_or_default())
}
