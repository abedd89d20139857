//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure is answered with `{"error": "<message>"}`.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Unknown database.
  #[error("not found: {0}")]
  NotFound(String),

  /// Malformed schema description or query parameters.
  #[error("bad request: {0}")]
  BadRequest(String),

  /// The graph store could not be read or written.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Wrap a store's associated error type.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let message = match &self {
      Self::NotFound(m) | Self::BadRequest(m) => m.clone(),
      Self::Store(e) => {
        tracing::error!(error = %e, "store failure");
        e.to_string()
      }
    };
    (self.status(), Json(json!({ "error": message }))).into_response()
  }
}
