//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error renders as `{"message": "..."}`; validation failures add the
//! offending `"field"`.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use hiroba_core::{DomainError, Error as CoreError, ValidationError};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("invalid {}: {}", .0.field, .0.message)]
  Validation(ValidationError),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("authentication required")]
  Unauthorized,

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a backend error: domain refusals become 4xx, anything else is
  /// an opaque 500.
  pub fn from_store<E: DomainError>(e: E) -> Self {
    match e.as_domain() {
      Some(domain) => Self::from_domain(domain),
      None => ApiError::Store(Box::new(e)),
    }
  }

  fn from_domain(e: &CoreError) -> Self {
    match e {
      CoreError::PostNotFound(_)
      | CoreError::CommentNotFound(_)
      | CoreError::NotificationNotFound(_) => ApiError::NotFound(e.to_string()),
      CoreError::PostClosed(_) => ApiError::Conflict(e.to_string()),
      CoreError::Forbidden(_) => ApiError::Forbidden(e.to_string()),
      CoreError::Validation(v) => ApiError::Validation(v.clone()),
      CoreError::InvalidPolicy(_) => ApiError::Store(e.to_string().into()),
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<ValidationError> for ApiError {
  fn from(e: ValidationError) -> Self { ApiError::Validation(e) }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { ApiError::BadRequest(rejection.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let body = match &self {
      ApiError::Validation(v) => json!({ "message": v.message, "field": v.field }),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        json!({ "message": "internal server error" })
      }
      ApiError::BadRequest(m)
      | ApiError::Forbidden(m)
      | ApiError::NotFound(m)
      | ApiError::Conflict(m) => json!({ "message": m }),
      ApiError::Unauthorized => json!({ "message": self.to_string() }),
    };
    (status, Json(body)).into_response()
  }
}
