//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler. Rendered as `{"detail": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("internal error: {0}")]
  Internal(String),
}

impl From<roster_core::Error> for ApiError {
  fn from(e: roster_core::Error) -> Self {
    use roster_core::Error;

    match e {
      Error::NotFound { .. } => ApiError::NotFound(e.to_string()),
      Error::Validation(m) | Error::ConstraintViolation(m) => {
        ApiError::BadRequest(m)
      }
      Error::NoOpUpdate => ApiError::BadRequest(e.to_string()),
      Error::Versioning(m) => ApiError::Internal(m),
      Error::Store(source) => {
        tracing::error!(error = %source, "store failure");
        ApiError::Internal(source.to_string())
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, detail) = match self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
      ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
    };
    (status, Json(json!({ "detail": detail }))).into_response()
  }
}
