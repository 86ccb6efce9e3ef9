//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings with microsecond precision
//! and a `Z` suffix. UUIDs are stored as hyphenated lowercase strings. Enums
//! are stored under their wire names.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use hiroba_core::{
  comment::Comment,
  notification::{Notification, NotificationKind},
  origin::OriginToken,
  post::{Category, Community, Post},
  user::User,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_enum<T: FromStr>(column: &'static str, s: String) -> Result<T> {
  s.parse().map_err(|_| Error::UnknownValue { column, value: s })
}

fn decode_notification_kind(s: String) -> Result<NotificationKind> {
  match s.as_str() {
    "reply" => Ok(NotificationKind::Reply),
    _ => Err(Error::UnknownValue { column: "kind", value: s }),
  }
}

// ─── Raw rows ────────────────────────────────────────────────────────────────
//
// Each `Raw*` struct mirrors a SELECT over `*_COLUMNS` and is decoded outside
// the connection thread.

pub const POST_COLUMNS: &str = "post_id, title, content, category, community, author_id, \
                                origin, created_at, last_activity_at, is_closed";

pub struct RawPost {
  pub post_id:          String,
  pub title:            String,
  pub content:          String,
  pub category:         String,
  pub community:        String,
  pub author_id:        String,
  pub origin:           String,
  pub created_at:       String,
  pub last_activity_at: String,
  pub is_closed:        bool,
}

impl RawPost {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      post_id:          row.get(0)?,
      title:            row.get(1)?,
      content:          row.get(2)?,
      category:         row.get(3)?,
      community:        row.get(4)?,
      author_id:        row.get(5)?,
      origin:           row.get(6)?,
      created_at:       row.get(7)?,
      last_activity_at: row.get(8)?,
      is_closed:        row.get(9)?,
    })
  }

  pub fn into_post(self) -> Result<Post> {
    Ok(Post {
      post_id:          decode_uuid(&self.post_id)?,
      title:            self.title,
      content:          self.content,
      category:         decode_enum::<Category>("category", self.category)?,
      community:        decode_enum::<Community>("community", self.community)?,
      author_id:        self.author_id,
      origin:           OriginToken::from_stored(self.origin),
      created_at:       decode_dt(&self.created_at)?,
      last_activity_at: decode_dt(&self.last_activity_at)?,
      is_closed:        self.is_closed,
    })
  }
}

pub const COMMENT_COLUMNS: &str = "comment_id, post_id, content, author_id, origin, created_at";

pub struct RawComment {
  pub comment_id: String,
  pub post_id:    String,
  pub content:    String,
  pub author_id:  String,
  pub origin:     String,
  pub created_at: String,
}

impl RawComment {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      comment_id: row.get(0)?,
      post_id:    row.get(1)?,
      content:    row.get(2)?,
      author_id:  row.get(3)?,
      origin:     row.get(4)?,
      created_at: row.get(5)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      comment_id: decode_uuid(&self.comment_id)?,
      post_id:    decode_uuid(&self.post_id)?,
      content:    self.content,
      author_id:  self.author_id,
      origin:     OriginToken::from_stored(self.origin),
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const NOTIFICATION_COLUMNS: &str =
  "notification_id, user_id, kind, message, post_id, comment_id, is_read, created_at";

pub struct RawNotification {
  pub notification_id: String,
  pub user_id:         String,
  pub kind:            String,
  pub message:         String,
  pub post_id:         String,
  pub comment_id:      String,
  pub is_read:         bool,
  pub created_at:      String,
}

impl RawNotification {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      notification_id: row.get(0)?,
      user_id:         row.get(1)?,
      kind:            row.get(2)?,
      message:         row.get(3)?,
      post_id:         row.get(4)?,
      comment_id:      row.get(5)?,
      is_read:         row.get(6)?,
      created_at:      row.get(7)?,
    })
  }

  pub fn into_notification(self) -> Result<Notification> {
    Ok(Notification {
      notification_id: decode_uuid(&self.notification_id)?,
      user_id:         self.user_id,
      kind:            decode_notification_kind(self.kind)?,
      message:         self.message,
      post_id:         decode_uuid(&self.post_id)?,
      comment_id:      decode_uuid(&self.comment_id)?,
      is_read:         self.is_read,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

pub const USER_COLUMNS: &str = "user_id, username, password_hash, created_at, updated_at";

pub struct RawUser {
  pub user_id:       String,
  pub username:      String,
  pub password_hash: String,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      username:      row.get(1)?,
      password_hash: row.get(2)?,
      created_at:    row.get(3)?,
      updated_at:    row.get(4)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:       self.user_id,
      username:      self.username,
      password_hash: self.password_hash,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}
