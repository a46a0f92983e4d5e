//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every variant renders as a failed [`Envelope`] with the matching status
//! code, so no handler ever returns an unstructured error body.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use kvstory_core::Envelope;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("请求 URL 格式非法，无法解析")]
  MalformedUrl,

  #[error("故事ID不能为空")]
  EmptyId,

  #[error("故事ID、标题、内容不能为空")]
  MissingFields,

  #[error("故事不存在")]
  StoryNotFound,

  #[error("接口不存在")]
  RouteNotFound,

  #[error("story_list 格式错误，预期为数组")]
  MalformedIndex,

  #[error("故事删除失败")]
  DeleteFailed,

  #[error("KV 存储不可用：{0}")]
  Unavailable(String),

  #[error("操作异常：{0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("操作异常：{0}")]
  Internal(String),
}

impl ApiError {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::MalformedUrl | Self::EmptyId | Self::MissingFields => {
        StatusCode::BAD_REQUEST
      }
      Self::StoryNotFound | Self::RouteNotFound => StatusCode::NOT_FOUND,
      Self::MalformedIndex
      | Self::DeleteFailed
      | Self::Unavailable(_)
      | Self::Store(_)
      | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<kvstory_core::Error> for ApiError {
  fn from(e: kvstory_core::Error) -> Self {
    match e {
      kvstory_core::Error::MalformedIndex => Self::MalformedIndex,
      kvstory_core::Error::Unavailable(m) => Self::Unavailable(m),
      other => Self::Internal(other.to_string()),
    }
  }
}

impl From<serde_json::Error> for ApiError {
  fn from(e: serde_json::Error) -> Self { Self::Internal(e.to_string()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    } else {
      tracing::debug!(error = %self, %status, "request rejected");
    }
    (status, Json(Envelope::<()>::err(self.to_string()))).into_response()
  }
}
