//! Handlers for `/posts` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/posts` | `?community=japan\|korea` (default `japan`), optional `&category=` |
//! | `GET`    | `/posts/:id` | 404 if missing or expired |
//! | `POST`   | `/posts` | Body: [`CreatePostBody`]; returns 201 |
//! | `PATCH`  | `/posts/:id` | Owner only. Body: [`UpdatePostBody`] |
//! | `DELETE` | `/posts/:id` | Owner only. Returns 204 |
//! | `POST`   | `/posts/:id/reopen` | Owner only. Revives a closed post |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use hiroba_core::{
  ValidationError,
  post::{Category, Community, NewPost, Post, PostEdit, PostQuery, PostView},
  store::ForumStore,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{
  error::ApiError,
  extract::{Caller, Origin, Payload, author, optional_str, required_str},
};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  pub community: Option<String>,
  pub category:  Option<String>,
}

impl TryFrom<ListParams> for PostQuery {
  type Error = ValidationError;

  fn try_from(p: ListParams) -> Result<Self, Self::Error> {
    Ok(PostQuery {
      community: p
        .community
        .as_deref()
        .map(str::parse::<Community>)
        .transpose()?
        .unwrap_or_default(),
      category:  p.category.as_deref().map(str::parse::<Category>).transpose()?,
    })
  }
}

/// `GET /posts[?community=<community>][&category=<category>]`
pub async fn list<S: ForumStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<PostView>>, ApiError> {
  let query = PostQuery::try_from(params)?;
  let posts = store.list_posts(query).await.map_err(ApiError::from_store)?;
  Ok(Json(posts))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /posts/:id`
pub async fn get_one<S: ForumStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<PostView>, ApiError> {
  let post = store
    .get_post(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("post {id} not found")))?;
  Ok(Json(post))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /posts`. Every field is required; they are
/// loose here only so a missing or mistyped field reports which one it was.
#[derive(Debug, Deserialize)]
pub struct CreatePostBody {
  pub title:     Option<Value>,
  pub content:   Option<Value>,
  pub category:  Option<Value>,
  pub community: Option<Value>,
}

impl TryFrom<CreatePostBody> for NewPost {
  type Error = ValidationError;

  fn try_from(b: CreatePostBody) -> Result<Self, Self::Error> {
    NewPost::new(
      required_str("title", &b.title)?,
      required_str("content", &b.content)?,
      required_str("category", &b.category)?.parse()?,
      required_str("community", &b.community)?.parse()?,
    )
  }
}

/// `POST /posts`, returns 201 and the stored [`Post`].
pub async fn create<S: ForumStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  origin: Origin,
  Payload(body): Payload<CreatePostBody>,
) -> Result<impl IntoResponse, ApiError> {
  let input = NewPost::try_from(body)?;
  let post = store
    .create_post(input, author(caller, origin))
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(post_id = %post.post_id, community = %post.community, "post created");
  Ok((StatusCode::CREATED, Json(post)))
}

// ─── Update ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdatePostBody {
  pub title:    Option<Value>,
  pub content:  Option<Value>,
  pub category: Option<Value>,
}

impl TryFrom<UpdatePostBody> for PostEdit {
  type Error = ValidationError;

  fn try_from(b: UpdatePostBody) -> Result<Self, Self::Error> {
    PostEdit::new(
      optional_str("title", &b.title)?,
      optional_str("content", &b.content)?,
      optional_str("category", &b.category)?
        .map(str::parse::<Category>)
        .transpose()?,
    )
  }
}

/// `PATCH /posts/:id`
pub async fn update<S: ForumStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
  Payload(body): Payload<UpdatePostBody>,
) -> Result<Json<Post>, ApiError> {
  let edit = PostEdit::try_from(body)?;
  let post = store
    .update_post(id, &caller.user_id, edit)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(post))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /posts/:id`
pub async fn delete_one<S: ForumStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  store
    .delete_post(id, &caller.user_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Reopen ───────────────────────────────────────────────────────────────────

/// `POST /posts/:id/reopen`
pub async fn reopen<S: ForumStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
) -> Result<Json<Post>, ApiError> {
  let post = store
    .reopen_post(id, &caller.user_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(post))
}
