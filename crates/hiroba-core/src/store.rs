//! The `ForumStore` and `UserStore` traits.
//!
//! Both are implemented by storage backends (e.g. `hiroba-store-sqlite`) but
//! are composed independently by the caller: the API layer only sees
//! `ForumStore`, the auth layer only sees `UserStore`.

use std::future::Future;

use uuid::Uuid;

use crate::{
  DomainError,
  comment::{Comment, CommentBody},
  lifecycle::SweepReport,
  notification::Notification,
  post::{Author, NewPost, Post, PostEdit, PostQuery, PostView},
  user::{NewUser, User},
};

// ─── Forum ───────────────────────────────────────────────────────────────────

/// Abstraction over the forum's durable store.
///
/// Lifecycle transitions are the store's responsibility: reads apply the
/// close and purge rules lazily, and [`sweep`](ForumStore::sweep) applies
/// them to every post at once.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ForumStore: Send + Sync {
  type Error: DomainError;

  // ── Posts ─────────────────────────────────────────────────────────────

  /// Posts in a community, newest first. Expired posts are purged before the
  /// listing is read.
  fn list_posts(
    &self,
    query: PostQuery,
  ) -> impl Future<Output = Result<Vec<PostView>, Self::Error>> + Send + '_;

  /// A single post, with the close transition applied and persisted if due.
  /// Returns `None` if the post does not exist or has expired.
  fn get_post(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<PostView>, Self::Error>> + Send + '_;

  fn create_post(
    &self,
    input: NewPost,
    author: Author,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + '_;

  /// Owner-only content edit. Does not count as activity.
  fn update_post<'a>(
    &'a self,
    id: Uuid,
    user_id: &'a str,
    edit: PostEdit,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + 'a;

  /// Owner-only delete; comments and notifications go with it.
  fn delete_post<'a>(
    &'a self,
    id: Uuid,
    user_id: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Owner-only reopen: clears the closed flag and restarts the inactivity
  /// clock from now.
  fn reopen_post<'a>(
    &'a self,
    id: Uuid,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + 'a;

  // ── Comments ──────────────────────────────────────────────────────────

  /// Comments on a post, oldest first.
  fn list_comments(
    &self,
    post_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + '_;

  /// Add a comment to an open post.
  ///
  /// Atomically inserts the comment, bumps the post's `last_activity_at` to
  /// the comment's timestamp, and notifies the post author unless they wrote
  /// the comment. Fails with `PostClosed` if the post is closed (or due to
  /// close), leaving the store untouched.
  fn create_comment(
    &self,
    post_id: Uuid,
    body: CommentBody,
    author: Author,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  fn update_comment<'a>(
    &'a self,
    id: Uuid,
    user_id: &'a str,
    body: CommentBody,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + 'a;

  fn delete_comment<'a>(
    &'a self,
    id: Uuid,
    user_id: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Notifications ─────────────────────────────────────────────────────

  /// Notifications addressed to `user_id`, newest first.
  fn list_notifications<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Notification>, Self::Error>> + Send + 'a;

  /// Mark one of `user_id`'s notifications read. Notifications addressed to
  /// someone else are reported as not found.
  fn mark_notification_read<'a>(
    &'a self,
    id: Uuid,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Notification, Self::Error>> + Send + 'a;

  // ── Lifecycle ─────────────────────────────────────────────────────────

  /// Close every stale post and purge every expired one.
  fn sweep(&self) -> impl Future<Output = Result<SweepReport, Self::Error>> + Send + '_;
}

// ─── Users ───────────────────────────────────────────────────────────────────

/// Credential storage for the auth collaborator.
pub trait UserStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Create a user, or replace the password hash of an existing one with the
  /// same username.
  fn upsert_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  fn find_user_by_name<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;
}
