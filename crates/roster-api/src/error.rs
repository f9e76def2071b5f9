//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure is rendered as `{"error": <title>, "details": <message>}`.
//! Store errors carry an [`ErrorKind`] which alone decides the status code.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use roster_core::{Classify, ErrorKind};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("caller identity missing")]
  Unauthorized,

  #[error("{source}")]
  Store {
    kind:   ErrorKind,
    source: Box<dyn std::error::Error + Send + Sync>,
  },
}

impl ApiError {
  pub fn store<E>(e: E) -> Self
  where
    E: Classify + std::error::Error + Send + Sync + 'static,
  {
    Self::Store { kind: e.kind(), source: Box::new(e) }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::Unauthorized => StatusCode::UNAUTHORIZED,
      Self::Store { kind, .. } => match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Consistency => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let (error, details) = match &self {
      ApiError::NotFound(m) => ("not found", m.clone()),
      ApiError::BadRequest(m) => ("invalid request", m.clone()),
      ApiError::Unauthorized => (
        "unauthorized",
        "the x-user-id header is required for this operation".to_owned(),
      ),
      ApiError::Store { kind: ErrorKind::Persistence, source } => {
        tracing::error!(error = %source, "storage failure");
        ("internal error", "the operation could not be completed".to_owned())
      }
      ApiError::Store { kind, source } => {
        let title = match kind {
          ErrorKind::Validation => "validation failed",
          ErrorKind::Conflict => "conflict",
          ErrorKind::NotFound => "not found",
          _ => "inconsistent request",
        };
        (title, source.to_string())
      }
    };
    (status, Json(json!({ "error": error, "details": details }))).into_response()
  }
}
