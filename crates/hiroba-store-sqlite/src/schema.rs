//! SQL schema for the Hiroba SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Timestamps are fixed-width RFC 3339 UTC strings, so comparing them as
/// text orders them chronologically.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,    -- argon2 PHC string
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

-- author_id is owned by the auth collaborator and deliberately not a
-- foreign key.
CREATE TABLE IF NOT EXISTS posts (
    post_id          TEXT PRIMARY KEY,
    title            TEXT NOT NULL,
    content          TEXT NOT NULL,
    category         TEXT NOT NULL DEFAULT 'others',
    community        TEXT NOT NULL DEFAULT 'japan',
    author_id        TEXT NOT NULL,
    origin           TEXT NOT NULL,   -- anonymised origin token, immutable
    created_at       TEXT NOT NULL,
    last_activity_at TEXT NOT NULL,
    is_closed        INTEGER NOT NULL DEFAULT 0,
    CHECK (last_activity_at >= created_at),
    CHECK (is_closed IN (0, 1))
);

CREATE TABLE IF NOT EXISTS comments (
    comment_id TEXT PRIMARY KEY,
    post_id    TEXT NOT NULL REFERENCES posts(post_id) ON DELETE CASCADE,
    content    TEXT NOT NULL,
    author_id  TEXT NOT NULL,
    origin     TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS notifications (
    notification_id TEXT PRIMARY KEY,
    user_id         TEXT NOT NULL,   -- recipient
    kind            TEXT NOT NULL,   -- 'reply'
    message         TEXT NOT NULL,
    post_id         TEXT NOT NULL REFERENCES posts(post_id)       ON DELETE CASCADE,
    comment_id      TEXT NOT NULL REFERENCES comments(comment_id) ON DELETE CASCADE,
    is_read         INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS posts_listing_idx       ON posts(community, category, created_at);
CREATE INDEX IF NOT EXISTS posts_activity_idx      ON posts(last_activity_at);
CREATE INDEX IF NOT EXISTS comments_post_idx       ON comments(post_id, created_at);
CREATE INDEX IF NOT EXISTS notifications_user_idx  ON notifications(user_id, created_at);

PRAGMA user_version = 1;
";
