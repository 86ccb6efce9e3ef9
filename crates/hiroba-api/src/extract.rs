//! Request extractors shared by the handlers.
//!
//! Identity and origin are resolved upstream (by the server's auth layer)
//! and handed over as request extensions; this crate only reads them.

use axum::{extract::FromRequest, extract::FromRequestParts, http::request::Parts};
use hiroba_core::{ValidationError, origin::OriginToken, post::Author};
use serde_json::Value;

use crate::error::ApiError;

/// The authenticated caller. Extraction fails with 401 when the auth layer
/// did not attach one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
  pub user_id: String,
}

impl<S> FromRequestParts<S> for Caller
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<Caller>()
      .cloned()
      .ok_or(ApiError::Unauthorized)
  }
}

/// The anonymised origin of the request; [`OriginToken::unknown`] when the
/// transport layer supplied none.
#[derive(Debug, Clone)]
pub struct Origin(pub OriginToken);

impl<S> FromRequestParts<S> for Origin
where
  S: Send + Sync,
{
  type Rejection = std::convert::Infallible;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    Ok(Origin(
      parts
        .extensions
        .get::<OriginToken>()
        .cloned()
        .unwrap_or_else(OriginToken::unknown),
    ))
  }
}

/// Author of a write: the caller plus their origin token.
pub fn author(caller: Caller, origin: Origin) -> Author {
  Author { user_id: caller.user_id, origin: origin.0 }
}

/// JSON body extractor whose rejections render as [`ApiError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Payload<T>(pub T);

// ─── Body fields ──────────────────────────────────────────────────────────────
//
// Body fields are taken as raw JSON values so a wrong type is reported
// against the field that carried it. `null` counts as absent.

/// An optional string field.
pub fn optional_str<'a>(
  field: &str,
  value: &'a Option<Value>,
) -> Result<Option<&'a str>, ValidationError> {
  match value {
    None | Some(Value::Null) => Ok(None),
    Some(Value::String(s)) => Ok(Some(s)),
    Some(other) => Err(ValidationError::new(
      field,
      format!("{field} must be a string, got {}", json_type(other)),
    )),
  }
}

/// A string field that must be present.
pub fn required_str<'a>(
  field: &str,
  value: &'a Option<Value>,
) -> Result<&'a str, ValidationError> {
  optional_str(field, value)?
    .ok_or_else(|| ValidationError::new(field, format!("{field} is required")))
}

fn json_type(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Object(_) => "an object",
  }
}
