//! Handlers for comment endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/posts/:id/comments` | Oldest first; 404 if the post is missing |
//! | `POST`   | `/posts/:id/comments` | Body: `{"content":"..."}`; 201, or 409 if the post is closed |
//! | `PATCH`  | `/comments/:id` | Owner only. Body: `{"content":"..."}` |
//! | `DELETE` | `/comments/:id` | Owner only. Returns 204 |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use hiroba_core::{
  ValidationError,
  comment::{Comment, CommentBody},
  store::ForumStore,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{
  error::ApiError,
  extract::{Caller, Origin, Payload, author, required_str},
};

#[derive(Debug, Deserialize)]
pub struct CommentPayload {
  pub content: Option<Value>,
}

impl TryFrom<CommentPayload> for CommentBody {
  type Error = ValidationError;

  fn try_from(b: CommentPayload) -> Result<Self, Self::Error> {
    CommentBody::new(required_str("content", &b.content)?)
  }
}

/// `GET /posts/:id/comments`
pub async fn list<S: ForumStore>(
  State(store): State<Arc<S>>,
  Path(post_id): Path<Uuid>,
) -> Result<Json<Vec<Comment>>, ApiError> {
  let comments = store
    .list_comments(post_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(comments))
}

/// `POST /posts/:id/comments`
pub async fn create<S: ForumStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  origin: Origin,
  Path(post_id): Path<Uuid>,
  Payload(body): Payload<CommentPayload>,
) -> Result<impl IntoResponse, ApiError> {
  let body = CommentBody::try_from(body)?;
  let comment = store
    .create_comment(post_id, body, author(caller, origin))
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(comment)))
}

/// `PATCH /comments/:id`
pub async fn update<S: ForumStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
  Payload(body): Payload<CommentPayload>,
) -> Result<Json<Comment>, ApiError> {
  let body = CommentBody::try_from(body)?;
  let comment = store
    .update_comment(id, &caller.user_id, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(comment))
}

/// `DELETE /comments/:id`
pub async fn delete_one<S: ForumStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  store
    .delete_comment(id, &caller.user_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}
