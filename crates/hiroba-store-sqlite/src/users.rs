//! [`UserStore`] for [`SqliteStore`]: the credential table read by the auth
//! layer. Shares the forum's connection but nothing else.

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use hiroba_core::{
  store::UserStore,
  user::{NewUser, User},
};

use crate::{
  Error, Result, SqliteStore,
  encode::{RawUser, USER_COLUMNS, encode_dt, encode_uuid},
};

impl SqliteStore {
  async fn select_user(&self, column: &'static str, value: String) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1"),
              rusqlite::params![value],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }
}

impl UserStore for SqliteStore {
  type Error = Error;

  async fn upsert_user(&self, input: NewUser) -> Result<User> {
    let id_str = encode_uuid(Uuid::new_v4());
    let at_str = encode_dt(self.now());

    let raw: RawUser = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          &format!(
            "INSERT INTO users (user_id, username, password_hash, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT (username) DO UPDATE SET
               password_hash = excluded.password_hash,
               updated_at    = excluded.updated_at
             RETURNING {USER_COLUMNS}"
          ),
          rusqlite::params![id_str, input.username, input.password_hash, at_str],
          RawUser::from_row,
        )?)
      })
      .await?;

    raw.into_user()
  }

  async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
    self.select_user("user_id", user_id.to_owned()).await
  }

  async fn find_user_by_name(&self, username: &str) -> Result<Option<User>> {
    self.select_user("username", username.to_owned()).await
  }
}
