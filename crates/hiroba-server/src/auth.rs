//! HTTP Basic-auth verification against a [`UserStore`].

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::http::{HeaderMap, header};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use hiroba_api::Caller;
use hiroba_core::store::UserStore;
use rand_core::OsRng;

use crate::error::{Error, Result};

/// Hash `password` into an argon2 PHC string suitable for the `users` table.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
}

/// Verify the `Authorization: Basic` header in `headers`.
///
/// Returns `Ok(None)` when no credentials were offered at all; the request
/// then proceeds anonymously and protected routes refuse it. Credentials
/// that are offered but malformed or wrong are an [`Error::Unauthorized`].
pub async fn verify_auth<U: UserStore>(headers: &HeaderMap, users: &U) -> Result<Option<Caller>> {
  let Some(header_val) = headers.get(header::AUTHORIZATION) else {
    return Ok(None);
  };
  let header_val = header_val.to_str().map_err(|_| Error::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| Error::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;

  let user = users
    .find_user_by_name(username)
    .await
    .map_err(|e| Error::Store(Box::new(e)))?
    .ok_or(Error::Unauthorized)?;

  let parsed_hash = PasswordHash::new(&user.password_hash)
    .map_err(|_| Error::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)?;

  Ok(Some(Caller { user_id: user.user_id }))
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::http::{HeaderValue, Request};
  use hiroba_core::user::NewUser;
  use hiroba_store_sqlite::SqliteStore;

  async fn store_with(username: &str, password: &str) -> (SqliteStore, String) {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let user = store
      .upsert_user(NewUser {
        username:      username.to_string(),
        password_hash: hash_password(password).unwrap(),
      })
      .await
      .unwrap();
    (store, user.user_id)
  }

  fn basic(user: &str, pass: &str) -> String {
    let encoded = B64.encode(format!("{user}:{pass}"));
    format!("Basic {encoded}")
  }

  fn headers(auth: Option<&str>) -> HeaderMap {
    let mut builder = Request::builder();
    if let Some(auth) = auth {
      builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(()).unwrap().into_parts().0.headers
  }

  #[tokio::test]
  async fn correct_credentials() {
    let (store, user_id) = store_with("aiko", "secret").await;
    let caller = verify_auth(&headers(Some(&basic("aiko", "secret"))), &store)
      .await
      .unwrap();
    assert_eq!(caller, Some(Caller { user_id }));
  }

  #[tokio::test]
  async fn wrong_password() {
    let (store, _) = store_with("aiko", "secret").await;
    let res = verify_auth(&headers(Some(&basic("aiko", "wrong"))), &store).await;
    assert!(matches!(res, Err(Error::Unauthorized)));
  }

  #[tokio::test]
  async fn unknown_user() {
    let (store, _) = store_with("aiko", "secret").await;
    let res = verify_auth(&headers(Some(&basic("minjun", "secret"))), &store).await;
    assert!(matches!(res, Err(Error::Unauthorized)));
  }

  #[tokio::test]
  async fn missing_header_is_anonymous() {
    let (store, _) = store_with("aiko", "secret").await;
    assert_eq!(verify_auth(&headers(None), &store).await.unwrap(), None);
  }

  #[tokio::test]
  async fn invalid_base64() {
    let (store, _) = store_with("aiko", "secret").await;
    let res = verify_auth(&headers(Some("Basic !!!not-base64!!!")), &store).await;
    assert!(matches!(res, Err(Error::Unauthorized)));
  }

  #[tokio::test]
  async fn non_basic_scheme() {
    let (store, _) = store_with("aiko", "secret").await;
    let mut map = HeaderMap::new();
    map.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
    assert!(matches!(verify_auth(&map, &store).await, Err(Error::Unauthorized)));
  }

  #[tokio::test]
  async fn rotated_password_replaces_old_one() {
    let (store, user_id) = store_with("aiko", "old").await;
    store
      .upsert_user(NewUser {
        username:      "aiko".to_string(),
        password_hash: hash_password("new").unwrap(),
      })
      .await
      .unwrap();

    let old = verify_auth(&headers(Some(&basic("aiko", "old"))), &store).await;
    assert!(matches!(old, Err(Error::Unauthorized)));
    let new = verify_auth(&headers(Some(&basic("aiko", "new"))), &store).await.unwrap();
    assert_eq!(new, Some(Caller { user_id }));
  }
}
