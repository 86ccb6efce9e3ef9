//! Handlers for `/notifications` endpoints. Both require a caller.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use hiroba_core::{notification::Notification, store::ForumStore};
use uuid::Uuid;

use crate::{error::ApiError, extract::Caller};

/// `GET /notifications`: the caller's notifications, newest first.
pub async fn list<S: ForumStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
) -> Result<Json<Vec<Notification>>, ApiError> {
  let notifications = store
    .list_notifications(&caller.user_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(notifications))
}

/// `PATCH /notifications/:id/read`
pub async fn mark_read<S: ForumStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
) -> Result<Json<Notification>, ApiError> {
  let notification = store
    .mark_notification_read(id, &caller.user_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(notification))
}
