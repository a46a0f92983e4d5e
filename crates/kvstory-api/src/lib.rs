//! JSON HTTP API for kvstory.
//!
//! Exposes an axum [`Router`] backed by any [`KvConnector`]. Every response is
//! a JSON [`Envelope`](kvstory_core::Envelope) carrying
//! `Access-Control-Allow-Origin: *`; `OPTIONS` on any path is answered as a
//! CORS preflight without touching the store.

pub mod error;
pub mod options;
pub mod repair;
pub mod stories;

pub use error::ApiError;

use std::{any::Any, sync::Arc};

use axum::{
  Json, Router,
  body::Bytes,
  extract::{
    Path, State,
    rejection::{BytesRejection, PathRejection},
  },
  http::{HeaderValue, Method, header},
  response::{IntoResponse, Response},
  routing::any,
};
use kvstory_core::{Envelope, KvConnector};
use tower::ServiceBuilder;
use tower_http::{
  catch_panic::CatchPanicLayer, set_header::SetResponseHeaderLayer,
  trace::TraceLayer,
};

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers: the backend factory and the
/// namespace every request connects to.
pub struct AppState<C: KvConnector> {
  pub connector: Arc<C>,
  pub namespace: Arc<str>,
}

impl<C: KvConnector> AppState<C> {
  pub fn new(connector: C, namespace: impl Into<Arc<str>>) -> Self {
    Self {
      connector: Arc::new(connector),
      namespace: namespace.into(),
    }
  }

  /// Open this request's backend handle.
  fn backend(&self) -> Result<C::Backend, ApiError> {
    self
      .connector
      .connect(&self.namespace)
      .map_err(|e| ApiError::Unavailable(e.to_string()))
  }
}

impl<C: KvConnector> Clone for AppState<C> {
  fn clone(&self) -> Self {
    Self {
      connector: self.connector.clone(),
      namespace: self.namespace.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the story API router.
pub fn router<C: KvConnector>(state: AppState<C>) -> Router {
  Router::new()
    .route("/api/stories", any(stories_handler::<C>))
    .route("/api/story", any(story_collection_handler::<C>))
    .route("/api/story/", any(story_empty_id_handler::<C>))
    .route("/api/story/{*rest}", any(story_resource_handler::<C>))
    .fallback(fallback_handler::<C>)
    .with_state(state)
    .layer(
      ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
          header::ACCESS_CONTROL_ALLOW_ORIGIN,
          HeaderValue::from_static("*"),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response)),
    )
}

fn ok<T: serde::Serialize>(data: T) -> Response {
  Json(Envelope::ok(data)).into_response()
}

/// The id is the last segment of the path, so `/api/story/a/b` names `b` and
/// `/api/story/a/` names nothing.
fn trailing_segment(rest: &str) -> &str {
  rest.rsplit('/').next().unwrap_or_default()
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
  let detail = if let Some(s) = panic.downcast_ref::<String>() {
    s.clone()
  } else if let Some(s) = panic.downcast_ref::<&str>() {
    (*s).to_owned()
  } else {
    "未知操作异常".to_owned()
  };
  ApiError::Internal(detail).into_response()
}

// ─── Route handlers ──────────────────────────────────────────────────────────

async fn stories_handler<C: KvConnector>(
  State(state): State<AppState<C>>,
  method: Method,
) -> Result<Response, ApiError> {
  if method == Method::OPTIONS {
    return Ok(options::handler());
  }
  let kv = state.backend()?;
  match method.as_str() {
    "GET" => Ok(ok(stories::list(&kv).await?)),
    _ => Err(ApiError::RouteNotFound),
  }
}

async fn story_collection_handler<C: KvConnector>(
  State(state): State<AppState<C>>,
  method: Method,
  body: Result<Bytes, BytesRejection>,
) -> Result<Response, ApiError> {
  if method == Method::OPTIONS {
    return Ok(options::handler());
  }
  let kv = state.backend()?;
  match method.as_str() {
    "POST" => {
      let body = body.map_err(|e| ApiError::Internal(e.body_text()))?;
      let value = serde_json::from_slice(&body)?;
      stories::save(&kv, value).await?;
      Ok(ok(stories::SAVED_MESSAGE))
    }
    _ => Err(ApiError::RouteNotFound),
  }
}

async fn story_empty_id_handler<C: KvConnector>(
  State(state): State<AppState<C>>,
  method: Method,
) -> Result<Response, ApiError> {
  story_by_id(&state, method, "").await
}

async fn story_resource_handler<C: KvConnector>(
  State(state): State<AppState<C>>,
  method: Method,
  rest: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
  if method == Method::OPTIONS {
    return Ok(options::handler());
  }
  let Path(rest) = rest.map_err(|_| ApiError::MalformedUrl)?;
  story_by_id(&state, method, trailing_segment(&rest)).await
}

async fn story_by_id<C: KvConnector>(
  state: &AppState<C>,
  method: Method,
  id: &str,
) -> Result<Response, ApiError> {
  if method == Method::OPTIONS {
    return Ok(options::handler());
  }
  let kv = state.backend()?;
  match method.as_str() {
    "GET" => Ok(ok(stories::get(&kv, id).await?)),
    "DELETE" => {
      stories::delete(&kv, id).await?;
      Ok(ok(stories::DELETED_MESSAGE))
    }
    _ => Err(ApiError::RouteNotFound),
  }
}

async fn fallback_handler<C: KvConnector>(
  State(state): State<AppState<C>>,
  method: Method,
) -> Result<Response, ApiError> {
  if method == Method::OPTIONS {
    return Ok(options::handler());
  }
  state.backend()?;
  Err(ApiError::RouteNotFound)
}
