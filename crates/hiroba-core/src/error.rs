//! Error types for `hiroba-core`.

use thiserror::Error;
use uuid::Uuid;

/// A rejected write payload, qualified by the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
  pub field:   String,
  pub message: String,
}

impl ValidationError {
  pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
    Self { field: field.into(), message: message.into() }
  }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("post not found: {0}")]
  PostNotFound(Uuid),

  #[error("comment not found: {0}")]
  CommentNotFound(Uuid),

  #[error("notification not found: {0}")]
  NotificationNotFound(Uuid),

  #[error("post {0} is closed to new comments")]
  PostClosed(Uuid),

  #[error("only the author may modify {0}")]
  Forbidden(Uuid),

  #[error("validation failed: {0}")]
  Validation(#[from] ValidationError),

  #[error("invalid lifecycle policy: {0}")]
  InvalidPolicy(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Implemented by backend error types so callers can recover the domain
/// failure (if any) without knowing the backend.
pub trait DomainError: std::error::Error + Send + Sync + 'static {
  /// The domain error this failure represents, or `None` for infrastructure
  /// failures (I/O, SQL, decoding).
  fn as_domain(&self) -> Option<&Error>;
}

impl DomainError for Error {
  fn as_domain(&self) -> Option<&Error> { Some(self) }
}

impl DomainError for std::convert::Infallible {
  fn as_domain(&self) -> Option<&Error> { match *self {} }
}
