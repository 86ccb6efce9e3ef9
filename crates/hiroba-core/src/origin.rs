//! Origin tokens: the cosmetic, non-reversible label shown next to
//! anonymous posts and comments.
//!
//! A token is the last two octets of the requester's IPv4 address. It carries
//! no authorization meaning and must never be used to correlate identities.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Token used when the origin is not four dot-separated numbers.
pub const UNKNOWN_ORIGIN: &str = "XX.XX";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OriginToken(String);

impl OriginToken {
  /// Derive a token from a raw address string.
  ///
  /// `10.0.55.212` becomes `55.212`. Segments are taken as written, so
  /// `10.0.055.999` becomes `055.999`. Anything that is not exactly four
  /// non-empty runs of ASCII digits (IPv6, hostnames, garbage) becomes
  /// [`UNKNOWN_ORIGIN`].
  pub fn anonymize(raw: &str) -> Self {
    let segments: Vec<&str> = raw.trim().split('.').collect();
    let numeric = |s: &&str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    match segments.as_slice() {
      [_, _, c, d] if segments.iter().all(numeric) => Self(format!("{c}.{d}")),
      _ => Self::unknown(),
    }
  }

  pub fn unknown() -> Self { Self(UNKNOWN_ORIGIN.to_owned()) }

  /// Rehydrate a stored token without re-deriving it.
  pub fn from_stored(token: String) -> Self { Self(token) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for OriginToken {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}
