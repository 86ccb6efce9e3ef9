//! Posts: the top-level unit of discussion within a community.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Result, ValidationError, origin::OriginToken};

pub const TITLE_MAX_CHARS: usize = 200;
pub const CONTENT_MAX_CHARS: usize = 10_000;

// ─── Enumerations ────────────────────────────────────────────────────────────

/// Topic a post is filed under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
  Travel,
  Health,
  Food,
  #[default]
  Others,
}

impl Category {
  pub const ALL: [Category; 4] =
    [Category::Travel, Category::Health, Category::Food, Category::Others];

  pub fn as_str(self) -> &'static str {
    match self {
      Category::Travel => "travel",
      Category::Health => "health",
      Category::Food => "food",
      Category::Others => "others",
    }
  }
}

/// Regional audience a post belongs to. Used purely as a filter dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Community {
  #[default]
  Japan,
  Korea,
}

impl Community {
  pub const ALL: [Community; 2] = [Community::Japan, Community::Korea];

  pub fn as_str(self) -> &'static str {
    match self {
      Community::Japan => "japan",
      Community::Korea => "korea",
    }
  }
}

macro_rules! str_enum_impls {
  ($ty:ty, $field:literal) => {
    impl fmt::Display for $ty {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
      }
    }

    impl FromStr for $ty {
      type Err = ValidationError;

      fn from_str(s: &str) -> Result<Self, Self::Err> {
        <$ty>::ALL
          .into_iter()
          .find(|v| v.as_str() == s)
          .ok_or_else(|| {
            let expected: Vec<&str> = <$ty>::ALL.iter().map(|v| v.as_str()).collect();
            ValidationError::new(
              $field,
              format!("expected one of {}, got {s:?}", expected.join(", ")),
            )
          })
      }
    }
  };
}

str_enum_impls!(Category, "category");
str_enum_impls!(Community, "community");

// ─── Records ─────────────────────────────────────────────────────────────────

/// The identity attached to a write: who made it (as resolved by the auth
/// collaborator) and the anonymised origin label shown to readers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
  pub user_id: String,
  pub origin:  OriginToken,
}

/// A persisted post.
///
/// `last_activity_at` is never earlier than `created_at`. `is_closed` is
/// owned by the lifecycle and cannot be set through an edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
  pub post_id:          Uuid,
  pub title:            String,
  pub content:          String,
  pub category:         Category,
  pub community:        Community,
  pub author_id:        String,
  pub origin:           OriginToken,
  pub created_at:       DateTime<Utc>,
  pub last_activity_at: DateTime<Utc>,
  pub is_closed:        bool,
}

/// A post as presented to readers, with the read-time archive badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostView {
  #[serde(flatten)]
  pub post:     Post,
  pub archived: bool,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Validated input for creating a post. Author and origin are assigned by
/// the server, never by the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
  pub title:     String,
  pub content:   String,
  pub category:  Category,
  pub community: Community,
}

impl NewPost {
  pub fn new(
    title: &str,
    content: &str,
    category: Category,
    community: Community,
  ) -> Result<Self, ValidationError> {
    Ok(Self {
      title: validate_text("title", title, TITLE_MAX_CHARS)?,
      content: validate_text("content", content, CONTENT_MAX_CHARS)?,
      category,
      community,
    })
  }
}

/// Validated owner edit. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostEdit {
  pub title:    Option<String>,
  pub content:  Option<String>,
  pub category: Option<Category>,
}

impl PostEdit {
  pub fn new(
    title: Option<&str>,
    content: Option<&str>,
    category: Option<Category>,
  ) -> Result<Self, ValidationError> {
    let edit = Self {
      title: title
        .map(|t| validate_text("title", t, TITLE_MAX_CHARS))
        .transpose()?,
      content: content
        .map(|c| validate_text("content", c, CONTENT_MAX_CHARS))
        .transpose()?,
      category,
    };
    if edit.is_empty() {
      return Err(ValidationError::new("", "edit must change at least one field"));
    }
    Ok(edit)
  }

  pub fn is_empty(&self) -> bool {
    self.title.is_none() && self.content.is_none() && self.category.is_none()
  }
}

/// Parameters for [`ForumStore::list_posts`](crate::store::ForumStore::list_posts).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostQuery {
  pub community: Community,
  pub category:  Option<Category>,
}

/// Trim `value` and check it is non-empty and at most `max` characters.
pub(crate) fn validate_text(
  field: &str,
  value: &str,
  max: usize,
) -> Result<String, ValidationError> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(ValidationError::new(field, format!("{field} must not be empty")));
  }
  if trimmed.chars().count() > max {
    return Err(ValidationError::new(
      field,
      format!("{field} must be at most {max} characters"),
    ));
  }
  Ok(trimmed.to_owned())
}
