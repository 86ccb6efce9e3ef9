//! Notifications: written as a side effect of replies, read by recipients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of title characters quoted in a reply notification.
pub const PREVIEW_CHARS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
  Reply,
}

impl NotificationKind {
  pub fn as_str(self) -> &'static str {
    match self {
      NotificationKind::Reply => "reply",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
  pub notification_id: Uuid,
  /// The user the notification is addressed to.
  pub user_id:         String,
  pub kind:            NotificationKind,
  pub message:         String,
  pub post_id:         Uuid,
  pub comment_id:      Uuid,
  pub is_read:         bool,
  pub created_at:      DateTime<Utc>,
}

/// First [`PREVIEW_CHARS`] characters of `title`, with `...` appended when
/// anything was cut.
pub fn title_preview(title: &str) -> String {
  let mut chars = title.chars();
  let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
  if chars.next().is_some() { format!("{head}...") } else { head }
}

/// Message body for a reply to the post titled `title`.
pub fn reply_message(title: &str) -> String {
  format!("Someone replied to your post: {}", title_preview(title))
}

/// Whether a comment by `commenter` on a post by `post_author` notifies.
pub fn notifies(post_author: &str, commenter: &str) -> bool { post_author != commenter }

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn short_title_is_untouched() {
    assert_eq!(title_preview("Best ramen in Osaka"), "Best ramen in Osaka");
    let exact = "x".repeat(PREVIEW_CHARS);
    assert_eq!(title_preview(&exact), exact);
  }

  #[test]
  fn long_title_is_cut_with_ellipsis() {
    let title = "Where to find a quiet onsen near Hakone this winter?";
    assert_eq!(title_preview(title), "Where to find a quiet onsen ne...");
  }

  #[test]
  fn preview_counts_chars_not_bytes() {
    let title = "서울".repeat(20);
    let preview = title_preview(&title);
    assert_eq!(preview.chars().count(), PREVIEW_CHARS + 3);
    assert!(preview.ends_with("..."));
  }

  #[test]
  fn reply_message_format() {
    assert_eq!(reply_message("Hi"), "Someone replied to your post: Hi");
  }

  #[test]
  fn self_replies_do_not_notify() {
    assert!(!notifies("alice", "alice"));
    assert!(notifies("alice", "bob"));
  }
}
