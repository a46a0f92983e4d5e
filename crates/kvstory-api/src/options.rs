//! CORS preflight handler, answered for any path without touching the store.

use axum::{
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};

pub fn handler() -> Response {
  (
    StatusCode::NO_CONTENT,
    [
      (header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*")),
      (
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, DELETE, OPTIONS"),
      ),
      (
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Accept"),
      ),
      (header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400")),
    ],
  )
    .into_response()
}
