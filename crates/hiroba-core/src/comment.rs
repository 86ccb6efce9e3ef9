//! Comments: replies attached to a single post.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ValidationError, origin::OriginToken, post::validate_text};

pub const COMMENT_MAX_CHARS: usize = 5_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
  pub comment_id: Uuid,
  pub post_id:    Uuid,
  pub content:    String,
  pub author_id:  String,
  pub origin:     OriginToken,
  pub created_at: DateTime<Utc>,
}

/// Validated comment body, used for both creation and owner edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBody {
  pub content: String,
}

impl CommentBody {
  pub fn new(content: &str) -> Result<Self, ValidationError> {
    Ok(Self { content: validate_text("content", content, COMMENT_MAX_CHARS)? })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blank_comment_is_rejected() {
    let err = CommentBody::new(" \n\t").unwrap_err();
    assert_eq!(err.field, "content");
  }

  #[test]
  fn comment_length_is_bounded() {
    assert!(CommentBody::new(&"ㅋ".repeat(COMMENT_MAX_CHARS)).is_ok());
    let err = CommentBody::new(&"ㅋ".repeat(COMMENT_MAX_CHARS + 1)).unwrap_err();
    assert_eq!(err.field, "content");
  }

  #[test]
  fn comment_is_trimmed() {
    assert_eq!(CommentBody::new(" hi \n").unwrap().content, "hi");
  }
}
