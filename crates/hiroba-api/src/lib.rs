//! JSON REST API for Hiroba.
//!
//! Exposes an axum [`Router`] backed by any [`hiroba_core::store::ForumStore`].
//! Authentication, origin resolution, TLS and transport concerns are the
//! caller's responsibility: an upstream layer attaches [`Caller`] and
//! [`OriginToken`](hiroba_core::origin::OriginToken) request extensions.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", hiroba_api::api_router(store.clone()))
//! ```

pub mod comments;
pub mod error;
pub mod extract;
pub mod notifications;
pub mod posts;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, patch, post},
};
use hiroba_core::store::ForumStore;

pub use error::ApiError;
pub use extract::Caller;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: ForumStore + 'static,
{
  Router::new()
    // Posts
    .route("/posts", get(posts::list::<S>).post(posts::create::<S>))
    .route(
      "/posts/{id}",
      get(posts::get_one::<S>)
        .patch(posts::update::<S>)
        .delete(posts::delete_one::<S>),
    )
    .route("/posts/{id}/reopen", post(posts::reopen::<S>))
    // Comments
    .route(
      "/posts/{id}/comments",
      get(comments::list::<S>).post(comments::create::<S>),
    )
    .route(
      "/comments/{id}",
      patch(comments::update::<S>).delete(comments::delete_one::<S>),
    )
    // Notifications
    .route("/notifications", get(notifications::list::<S>))
    .route("/notifications/{id}/read", patch(notifications::mark_read::<S>))
    .with_state(store)
}

#[cfg(test)]
mod tests;
