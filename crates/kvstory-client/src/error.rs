//! Error type for `kvstory-client`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
  #[error("故事ID格式错误（必须为非空字符串）")]
  InvalidId,

  #[error("故事必填字段为空：{}", .0.join(", "))]
  MissingFields(Vec<&'static str>),

  #[error("网络异常：{0}")]
  Network(#[from] reqwest::Error),

  #[error("网络异常：请求失败：{0}")]
  Status(reqwest::StatusCode),

  /// The server answered with a failed envelope.
  #[error("{0}")]
  Server(String),
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;
