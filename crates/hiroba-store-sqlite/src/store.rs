//! [`SqliteStore`]: the SQLite implementation of [`ForumStore`].

use std::{path::Path, sync::Arc};

use chrono::{DateTime, SubsecRound as _, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use hiroba_core::{
  Error as CoreError,
  clock::{Clock, SystemClock},
  comment::{Comment, CommentBody},
  lifecycle::{LifecyclePolicy, SweepReport},
  notification::{self, Notification, NotificationKind},
  post::{Author, NewPost, Post, PostEdit, PostQuery, PostView},
  store::ForumStore,
};

use crate::{
  Result,
  encode::{
    COMMENT_COLUMNS, NOTIFICATION_COLUMNS, POST_COLUMNS, RawComment, RawNotification,
    RawPost, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

/// Result of work done on the connection thread: SQL failures travel in the
/// outer `Result`, domain refusals in this inner one.
type Outcome<T> = std::result::Result<T, CoreError>;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Hiroba forum store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
  pub(crate) clock: Arc<dyn Clock>,
  policy: LifecyclePolicy,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(Self {
      conn,
      clock: Arc::new(SystemClock),
      policy: LifecyclePolicy::default(),
    })
  }

  /// Replace the time source used to stamp records and age posts.
  pub fn with_clock(mut self, clock: impl Clock) -> Self {
    self.clock = Arc::new(clock);
    self
  }

  pub fn with_policy(mut self, policy: LifecyclePolicy) -> Self {
    self.policy = policy;
    self
  }

  pub fn policy(&self) -> &LifecyclePolicy { &self.policy }

  /// The current instant at the precision timestamps are stored with, so a
  /// record returned from a write equals the one read back later.
  pub(crate) fn now(&self) -> DateTime<Utc> { self.clock.now().trunc_subsecs(6) }
}

// ─── Connection-thread helpers ───────────────────────────────────────────────

/// Run `f` in a transaction. The transaction commits whenever `f` returns
/// `Ok`, including domain refusals, so lazy lifecycle writes made before the
/// refusal are kept. SQL errors roll everything back.
fn in_tx<T>(
  conn: &mut rusqlite::Connection,
  f: impl FnOnce(&rusqlite::Transaction<'_>) -> rusqlite::Result<Outcome<T>>,
) -> tokio_rusqlite::Result<Outcome<T>> {
  let tx = conn.transaction()?;
  let out = f(&tx)?;
  tx.commit()?;
  Ok(out)
}

fn select_post(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<RawPost>> {
  conn
    .query_row(
      &format!("SELECT {POST_COLUMNS} FROM posts WHERE post_id = ?1"),
      rusqlite::params![id],
      RawPost::from_row,
    )
    .optional()
}

fn select_comment(
  conn: &rusqlite::Connection,
  id: &str,
) -> rusqlite::Result<Option<RawComment>> {
  conn
    .query_row(
      &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE comment_id = ?1"),
      rusqlite::params![id],
      RawComment::from_row,
    )
    .optional()
}

/// Fetch a post, first removing it if it has expired.
fn load_live_post(
  conn: &rusqlite::Connection,
  id: &str,
  purge_cutoff: &str,
) -> rusqlite::Result<Option<RawPost>> {
  let purged = conn.execute(
    "DELETE FROM posts WHERE post_id = ?1 AND last_activity_at < ?2",
    rusqlite::params![id, purge_cutoff],
  )?;
  if purged > 0 {
    tracing::debug!(post_id = id, "purged expired post");
    return Ok(None);
  }
  select_post(conn, id)
}

/// Flip the closed flag on one post if it is still open and still stale.
///
/// The staleness test is part of the UPDATE itself, so a concurrent reply
/// that bumped `last_activity_at` after our read wins.
fn close_if_stale(
  conn: &rusqlite::Connection,
  id: &str,
  close_cutoff: &str,
) -> rusqlite::Result<bool> {
  let flipped = conn.execute(
    "UPDATE posts SET is_closed = 1
     WHERE post_id = ?1 AND is_closed = 0 AND last_activity_at < ?2",
    rusqlite::params![id, close_cutoff],
  )?;
  if flipped > 0 {
    tracing::debug!(post_id = id, "closed inactive post");
  }
  Ok(flipped > 0)
}

/// Load a live post and check that `user_id` wrote it.
fn load_owned_post(
  conn: &rusqlite::Connection,
  id: Uuid,
  user_id: &str,
  purge_cutoff: &str,
) -> rusqlite::Result<Outcome<RawPost>> {
  Ok(match load_live_post(conn, &encode_uuid(id), purge_cutoff)? {
    None => Err(CoreError::PostNotFound(id)),
    Some(raw) if raw.author_id != user_id => Err(CoreError::Forbidden(id)),
    Some(raw) => Ok(raw),
  })
}

fn load_owned_comment(
  conn: &rusqlite::Connection,
  id: Uuid,
  user_id: &str,
) -> rusqlite::Result<Outcome<RawComment>> {
  Ok(match select_comment(conn, &encode_uuid(id))? {
    None => Err(CoreError::CommentNotFound(id)),
    Some(raw) if raw.author_id != user_id => Err(CoreError::Forbidden(id)),
    Some(raw) => Ok(raw),
  })
}

// ─── ForumStore impl ─────────────────────────────────────────────────────────

impl ForumStore for SqliteStore {
  type Error = crate::Error;

  // ── Posts ─────────────────────────────────────────────────────────────────

  async fn list_posts(&self, query: PostQuery) -> Result<Vec<PostView>> {
    let now           = self.now();
    let purge_cutoff  = encode_dt(self.policy.purge_cutoff(now));
    let community_str = query.community.as_str();
    let category_str  = query.category.map(|c| c.as_str());

    let raws: Vec<RawPost> = self
      .conn
      .call(move |conn| {
        let purged = conn.execute(
          "DELETE FROM posts WHERE last_activity_at < ?1",
          rusqlite::params![purge_cutoff],
        )?;
        if purged > 0 {
          tracing::debug!(purged, "purged expired posts during listing");
        }

        let mut stmt = conn.prepare(&format!(
          "SELECT {POST_COLUMNS} FROM posts
           WHERE community = ?1 AND (?2 IS NULL OR category = ?2)
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![community_str, category_str], RawPost::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|raw| -> Result<PostView> { Ok(self.policy.view(raw.into_post()?, now)) })
      .collect()
  }

  async fn get_post(&self, id: Uuid) -> Result<Option<PostView>> {
    let now          = self.now();
    let id_str       = encode_uuid(id);
    let purge_cutoff = encode_dt(self.policy.purge_cutoff(now));
    let close_cutoff = encode_dt(self.policy.close_cutoff(now));

    let raw: Option<RawPost> = self
      .conn
      .call(move |conn| {
        in_tx(conn, |tx| {
          if load_live_post(tx, &id_str, &purge_cutoff)?.is_none() {
            return Ok(Ok(None));
          }
          close_if_stale(tx, &id_str, &close_cutoff)?;
          Ok(Ok(select_post(tx, &id_str)?))
        })
      })
      .await??;

    raw
      .map(|raw| -> Result<PostView> { Ok(self.policy.view(raw.into_post()?, now)) })
      .transpose()
  }

  async fn create_post(&self, input: NewPost, author: Author) -> Result<Post> {
    let now = self.now();
    let post = Post {
      post_id:          Uuid::new_v4(),
      title:            input.title,
      content:          input.content,
      category:         input.category,
      community:        input.community,
      author_id:        author.user_id,
      origin:           author.origin,
      created_at:       now,
      last_activity_at: now,
      is_closed:        false,
    };

    let id_str        = encode_uuid(post.post_id);
    let title         = post.title.clone();
    let content       = post.content.clone();
    let category_str  = post.category.as_str();
    let community_str = post.community.as_str();
    let author_id     = post.author_id.clone();
    let origin        = post.origin.as_str().to_owned();
    let at_str        = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO posts (
             post_id, title, content, category, community,
             author_id, origin, created_at, last_activity_at, is_closed
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8, 0)",
          rusqlite::params![
            id_str,
            title,
            content,
            category_str,
            community_str,
            author_id,
            origin,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(post)
  }

  async fn update_post(&self, id: Uuid, user_id: &str, edit: PostEdit) -> Result<Post> {
    let now          = self.now();
    let id_str       = encode_uuid(id);
    let user_id      = user_id.to_owned();
    let purge_cutoff = encode_dt(self.policy.purge_cutoff(now));
    let category_str = edit.category.map(|c| c.as_str());
    let PostEdit { title, content, .. } = edit;

    let raw: RawPost = self
      .conn
      .call(move |conn| {
        in_tx(conn, |tx| {
          if let Err(e) = load_owned_post(tx, id, &user_id, &purge_cutoff)? {
            return Ok(Err(e));
          }
          tx.execute(
            "UPDATE posts SET
               title    = COALESCE(?2, title),
               content  = COALESCE(?3, content),
               category = COALESCE(?4, category)
             WHERE post_id = ?1",
            rusqlite::params![id_str, title, content, category_str],
          )?;
          Ok(select_post(tx, &id_str)?.ok_or(CoreError::PostNotFound(id)))
        })
      })
      .await??;

    raw.into_post()
  }

  async fn delete_post(&self, id: Uuid, user_id: &str) -> Result<()> {
    let now          = self.now();
    let id_str       = encode_uuid(id);
    let user_id      = user_id.to_owned();
    let purge_cutoff = encode_dt(self.policy.purge_cutoff(now));

    self
      .conn
      .call(move |conn| {
        in_tx(conn, |tx| {
          if let Err(e) = load_owned_post(tx, id, &user_id, &purge_cutoff)? {
            return Ok(Err(e));
          }
          tx.execute("DELETE FROM posts WHERE post_id = ?1", rusqlite::params![id_str])?;
          Ok(Ok(()))
        })
      })
      .await??;

    Ok(())
  }

  async fn reopen_post(&self, id: Uuid, user_id: &str) -> Result<Post> {
    let now          = self.now();
    let id_str       = encode_uuid(id);
    let user_id      = user_id.to_owned();
    let now_str      = encode_dt(now);
    let purge_cutoff = encode_dt(self.policy.purge_cutoff(now));

    let raw: RawPost = self
      .conn
      .call(move |conn| {
        in_tx(conn, |tx| {
          if let Err(e) = load_owned_post(tx, id, &user_id, &purge_cutoff)? {
            return Ok(Err(e));
          }
          tx.execute(
            "UPDATE posts SET is_closed = 0, last_activity_at = MAX(last_activity_at, ?2)
             WHERE post_id = ?1",
            rusqlite::params![id_str, now_str],
          )?;
          Ok(select_post(tx, &id_str)?.ok_or(CoreError::PostNotFound(id)))
        })
      })
      .await??;

    tracing::debug!(post_id = %id, "reopened post");
    raw.into_post()
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  async fn list_comments(&self, post_id: Uuid) -> Result<Vec<Comment>> {
    let now          = self.now();
    let id_str       = encode_uuid(post_id);
    let purge_cutoff = encode_dt(self.policy.purge_cutoff(now));

    let raws: Vec<RawComment> = self
      .conn
      .call(move |conn| {
        in_tx(conn, |tx| {
          if load_live_post(tx, &id_str, &purge_cutoff)?.is_none() {
            return Ok(Err(CoreError::PostNotFound(post_id)));
          }
          let mut stmt = tx.prepare(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments
             WHERE post_id = ?1
             ORDER BY created_at ASC, rowid ASC"
          ))?;
          let rows = stmt
            .query_map(rusqlite::params![id_str], RawComment::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(Ok(rows))
        })
      })
      .await??;

    raws.into_iter().map(RawComment::into_comment).collect()
  }

  async fn create_comment(
    &self,
    post_id: Uuid,
    body: CommentBody,
    author: Author,
  ) -> Result<Comment> {
    let now = self.now();
    let comment = Comment {
      comment_id: Uuid::new_v4(),
      post_id,
      content:    body.content,
      author_id:  author.user_id,
      origin:     author.origin,
      created_at: now,
    };

    let post_id_str     = encode_uuid(post_id);
    let comment_id_str  = encode_uuid(comment.comment_id);
    let notif_id_str    = encode_uuid(Uuid::new_v4());
    let content         = comment.content.clone();
    let author_id       = comment.author_id.clone();
    let origin          = comment.origin.as_str().to_owned();
    let now_str         = encode_dt(now);
    let purge_cutoff    = encode_dt(self.policy.purge_cutoff(now));
    let close_cutoff    = encode_dt(self.policy.close_cutoff(now));

    let notified: bool = self
      .conn
      .call(move |conn| {
        in_tx(conn, |tx| {
          let Some(post) = load_live_post(tx, &post_id_str, &purge_cutoff)? else {
            return Ok(Err(CoreError::PostNotFound(post_id)));
          };
          if post.is_closed || close_if_stale(tx, &post_id_str, &close_cutoff)? {
            return Ok(Err(CoreError::PostClosed(post_id)));
          }

          tx.execute(
            "INSERT INTO comments (comment_id, post_id, content, author_id, origin, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![comment_id_str, post_id_str, content, author_id, origin, now_str],
          )?;

          tx.execute(
            "UPDATE posts SET is_closed = 0, last_activity_at = MAX(last_activity_at, ?2)
             WHERE post_id = ?1",
            rusqlite::params![post_id_str, now_str],
          )?;

          if !notification::notifies(&post.author_id, &author_id) {
            return Ok(Ok(false));
          }
          tx.execute(
            "INSERT INTO notifications (
               notification_id, user_id, kind, message, post_id, comment_id, is_read, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
            rusqlite::params![
              notif_id_str,
              post.author_id,
              NotificationKind::Reply.as_str(),
              notification::reply_message(&post.title),
              post_id_str,
              comment_id_str,
              now_str,
            ],
          )?;
          Ok(Ok(true))
        })
      })
      .await??;

    tracing::debug!(post_id = %post_id, comment_id = %comment.comment_id, notified, "comment created");
    Ok(comment)
  }

  async fn update_comment(&self, id: Uuid, user_id: &str, body: CommentBody) -> Result<Comment> {
    let id_str  = encode_uuid(id);
    let user_id = user_id.to_owned();
    let content = body.content;

    let raw: RawComment = self
      .conn
      .call(move |conn| {
        in_tx(conn, |tx| {
          if let Err(e) = load_owned_comment(tx, id, &user_id)? {
            return Ok(Err(e));
          }
          tx.execute(
            "UPDATE comments SET content = ?2 WHERE comment_id = ?1",
            rusqlite::params![id_str, content],
          )?;
          Ok(select_comment(tx, &id_str)?.ok_or(CoreError::CommentNotFound(id)))
        })
      })
      .await??;

    raw.into_comment()
  }

  async fn delete_comment(&self, id: Uuid, user_id: &str) -> Result<()> {
    let id_str  = encode_uuid(id);
    let user_id = user_id.to_owned();

    self
      .conn
      .call(move |conn| {
        in_tx(conn, |tx| {
          if let Err(e) = load_owned_comment(tx, id, &user_id)? {
            return Ok(Err(e));
          }
          tx.execute(
            "DELETE FROM comments WHERE comment_id = ?1",
            rusqlite::params![id_str],
          )?;
          Ok(Ok(()))
        })
      })
      .await??;

    Ok(())
  }

  // ── Notifications ─────────────────────────────────────────────────────────

  async fn list_notifications(&self, user_id: &str) -> Result<Vec<Notification>> {
    let user_id = user_id.to_owned();

    let raws: Vec<RawNotification> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {NOTIFICATION_COLUMNS} FROM notifications
           WHERE user_id = ?1
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_id], RawNotification::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNotification::into_notification).collect()
  }

  async fn mark_notification_read(&self, id: Uuid, user_id: &str) -> Result<Notification> {
    let id_str  = encode_uuid(id);
    let user_id = user_id.to_owned();

    let raw: RawNotification = self
      .conn
      .call(move |conn| {
        in_tx(conn, |tx| {
          let updated = tx.execute(
            "UPDATE notifications SET is_read = 1 WHERE notification_id = ?1 AND user_id = ?2",
            rusqlite::params![id_str, user_id],
          )?;
          if updated == 0 {
            return Ok(Err(CoreError::NotificationNotFound(id)));
          }
          let raw = tx.query_row(
            &format!("SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE notification_id = ?1"),
            rusqlite::params![id_str],
            RawNotification::from_row,
          )?;
          Ok(Ok(raw))
        })
      })
      .await??;

    raw.into_notification()
  }

  // ── Lifecycle ─────────────────────────────────────────────────────────────

  async fn sweep(&self) -> Result<SweepReport> {
    let now          = self.now();
    let purge_cutoff = encode_dt(self.policy.purge_cutoff(now));
    let close_cutoff = encode_dt(self.policy.close_cutoff(now));

    let report = self
      .conn
      .call(move |conn| {
        in_tx(conn, |tx| {
          let purged = tx.execute(
            "DELETE FROM posts WHERE last_activity_at < ?1",
            rusqlite::params![purge_cutoff],
          )?;
          let closed = tx.execute(
            "UPDATE posts SET is_closed = 1 WHERE is_closed = 0 AND last_activity_at < ?1",
            rusqlite::params![close_cutoff],
          )?;
          Ok(Ok(SweepReport { closed, purged }))
        })
      })
      .await??;

    tracing::debug!(closed = report.closed, purged = report.purged, "lifecycle sweep");
    Ok(report)
  }
}
