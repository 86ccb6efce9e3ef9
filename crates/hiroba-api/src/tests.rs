//! Router tests against an in-memory `SqliteStore`.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Method, Request, StatusCode, header},
};
use chrono::{DateTime, TimeDelta, Utc};
use hiroba_core::{clock::ManualClock, origin::OriginToken};
use hiroba_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{Caller, api_router};

async fn app() -> (Router, ManualClock) {
  let start = DateTime::parse_from_rfc3339("2025-04-01T00:00:00Z")
    .unwrap()
    .with_timezone(&Utc);
  let clock = ManualClock::new(start);
  let store = SqliteStore::open_in_memory()
    .await
    .unwrap()
    .with_clock(clock.clone());
  (api_router(Arc::new(store)), clock)
}

fn request(method: Method, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
  let mut builder = Request::builder()
    .method(method)
    .uri(uri)
    .extension(OriginToken::anonymize("203.0.113.45"));
  if let Some(user) = user {
    builder = builder.extension(Caller { user_id: user.to_owned() });
  }
  match body {
    Some(json) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(json.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
  let res = app.clone().oneshot(req).await.unwrap();
  let status = res.status();
  let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
  let json = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, json)
}

async fn create_post(app: &Router, user: &str, title: &str) -> Value {
  let (status, post) = send(
    app,
    request(
      Method::POST,
      "/posts",
      Some(user),
      Some(json!({
        "title": title,
        "content": "Looking for recommendations",
        "category": "food",
        "community": "japan",
      })),
    ),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{post}");
  post
}

// ─── Posts ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_post_assigns_author_and_origin() {
  let (app, _) = app().await;
  let post = create_post(&app, "alice", "Ramen near Umeda?").await;

  assert_eq!(post["author_id"], "alice");
  assert_eq!(post["origin"], "113.45");
  assert_eq!(post["is_closed"], false);

  let id = post["post_id"].as_str().unwrap();
  let (status, fetched) = send(&app, request(Method::GET, &format!("/posts/{id}"), None, None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(fetched["title"], "Ramen near Umeda?");
  assert_eq!(fetched["archived"], false);
}

#[tokio::test]
async fn writes_require_a_caller() {
  let (app, _) = app().await;
  let (status, body) = send(
    &app,
    request(
      Method::POST,
      "/posts",
      None,
      Some(json!({ "title": "t", "content": "c", "category": "food", "community": "japan" })),
    ),
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["message"], "authentication required");

  let (status, _) = send(&app, request(Method::GET, "/notifications", None, None)).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn validation_errors_name_the_field() {
  let (app, _) = app().await;

  let (status, body) = send(
    &app,
    request(
      Method::POST,
      "/posts",
      Some("alice"),
      Some(json!({ "title": "t", "content": "c", "category": "sports", "community": "japan" })),
    ),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["field"], "category");

  let (status, body) = send(
    &app,
    request(
      Method::POST,
      "/posts",
      Some("alice"),
      Some(json!({ "content": "c", "category": "food", "community": "japan" })),
    ),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["field"], "title");
  assert_eq!(body["message"], "title is required");

  let (status, body) = send(
    &app,
    request(Method::GET, "/posts?community=china", None, None),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["field"], "community");
}

#[tokio::test]
async fn category_and_community_are_required() {
  let (app, _) = app().await;
  let (status, body) = send(
    &app,
    request(
      Method::POST,
      "/posts",
      Some("alice"),
      Some(json!({ "title": "Misc question", "content": "Anything goes" })),
    ),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["field"], "category");

  let (status, body) = send(
    &app,
    request(
      Method::POST,
      "/posts",
      Some("alice"),
      Some(json!({ "title": "Misc question", "content": "Anything goes", "category": "others" })),
    ),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["field"], "community");

  let (_, listed) = send(&app, request(Method::GET, "/posts", None, None)).await;
  assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn mistyped_field_is_named() {
  let (app, _) = app().await;
  let (status, body) = send(
    &app,
    request(
      Method::POST,
      "/posts",
      Some("alice"),
      Some(json!({ "title": 123, "content": "c", "category": "food", "community": "japan" })),
    ),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["field"], "title");
  assert_eq!(body["message"], "title must be a string, got a number");

  let post = create_post(&app, "alice", "typed").await;
  let uri = format!("/posts/{}", post["post_id"].as_str().unwrap());
  let (status, body) = send(
    &app,
    request(Method::PATCH, &uri, Some("alice"), Some(json!({ "category": ["food"] }))),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["field"], "category");

  let (status, body) = send(
    &app,
    request(
      Method::POST,
      &format!("{uri}/comments"),
      Some("bob"),
      Some(json!({ "content": true })),
    ),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["field"], "content");
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
  let (app, _) = app().await;
  let req = Request::builder()
    .method(Method::POST)
    .uri("/posts")
    .extension(Caller { user_id: "alice".into() })
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from("{not json"))
    .unwrap();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["message"].is_string());
}

#[tokio::test]
async fn listing_defaults_to_japan() {
  let (app, _) = app().await;
  create_post(&app, "alice", "in japan").await;
  send(
    &app,
    request(
      Method::POST,
      "/posts",
      Some("alice"),
      Some(json!({ "title": "in korea", "content": "c", "category": "travel", "community": "korea" })),
    ),
  )
  .await;

  let (_, japan) = send(&app, request(Method::GET, "/posts", None, None)).await;
  assert_eq!(japan.as_array().unwrap().len(), 1);
  assert_eq!(japan[0]["title"], "in japan");

  let (_, korea) = send(
    &app,
    request(Method::GET, "/posts?community=korea&category=travel", None, None),
  )
  .await;
  assert_eq!(korea.as_array().unwrap().len(), 1);

  let (_, none) = send(
    &app,
    request(Method::GET, "/posts?community=korea&category=food", None, None),
  )
  .await;
  assert!(none.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn only_owner_may_edit_or_delete() {
  let (app, _) = app().await;
  let post = create_post(&app, "alice", "original").await;
  let uri = format!("/posts/{}", post["post_id"].as_str().unwrap());

  let (status, _) = send(
    &app,
    request(Method::PATCH, &uri, Some("bob"), Some(json!({ "title": "mine now" }))),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, updated) = send(
    &app,
    request(Method::PATCH, &uri, Some("alice"), Some(json!({ "content": "edited" }))),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(updated["content"], "edited");
  assert_eq!(updated["title"], "original");

  let (status, _) = send(&app, request(Method::DELETE, &uri, Some("bob"), None)).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, _) = send(&app, request(Method::DELETE, &uri, Some("alice"), None)).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (status, _) = send(&app, request(Method::GET, &uri, None, None)).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Lifecycle over HTTP ─────────────────────────────────────────────────────

#[tokio::test]
async fn closed_post_rejects_comments_until_reopened() {
  let (app, clock) = app().await;
  let post = create_post(&app, "alice", "quiet thread").await;
  let id = post["post_id"].as_str().unwrap();
  let comments_uri = format!("/posts/{id}/comments");

  clock.advance(TimeDelta::days(31));
  let (_, fetched) = send(&app, request(Method::GET, &format!("/posts/{id}"), None, None)).await;
  assert_eq!(fetched["is_closed"], true);

  let (status, body) = send(
    &app,
    request(Method::POST, &comments_uri, Some("bob"), Some(json!({ "content": "hello?" }))),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert!(body["message"].as_str().unwrap().contains("closed"));

  let (_, comments) = send(&app, request(Method::GET, &comments_uri, None, None)).await;
  assert!(comments.as_array().unwrap().is_empty());

  let reopen_uri = format!("/posts/{id}/reopen");
  let (status, _) = send(&app, request(Method::POST, &reopen_uri, Some("bob"), None)).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let (status, reopened) = send(&app, request(Method::POST, &reopen_uri, Some("alice"), None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(reopened["is_closed"], false);

  let (status, _) = send(
    &app,
    request(Method::POST, &comments_uri, Some("bob"), Some(json!({ "content": "hello!" }))),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn expired_post_disappears() {
  let (app, clock) = app().await;
  let post = create_post(&app, "alice", "old news").await;
  let id = post["post_id"].as_str().unwrap();

  clock.advance(TimeDelta::days(121));
  let (_, listed) = send(&app, request(Method::GET, "/posts", None, None)).await;
  assert!(listed.as_array().unwrap().is_empty());

  let (status, _) = send(&app, request(Method::GET, &format!("/posts/{id}"), None, None)).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Comments & notifications ────────────────────────────────────────────────

#[tokio::test]
async fn comment_on_missing_post_is_404() {
  let (app, _) = app().await;
  let uri = format!("/posts/{}/comments", uuid::Uuid::new_v4());
  let (status, _) = send(
    &app,
    request(Method::POST, &uri, Some("bob"), Some(json!({ "content": "anyone?" }))),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, _) = send(&app, request(Method::GET, &uri, None, None)).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reply_notifies_author_who_marks_it_read() {
  let (app, _) = app().await;
  let post = create_post(&app, "alice", "Best onsen?").await;
  let id = post["post_id"].as_str().unwrap();

  let (status, comment) = send(
    &app,
    request(
      Method::POST,
      &format!("/posts/{id}/comments"),
      Some("bob"),
      Some(json!({ "content": "Kinosaki!" })),
    ),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(comment["origin"], "113.45");

  let (status, notes) = send(&app, request(Method::GET, "/notifications", Some("alice"), None)).await;
  assert_eq!(status, StatusCode::OK);
  let notes = notes.as_array().unwrap();
  assert_eq!(notes.len(), 1);
  assert_eq!(notes[0]["kind"], "reply");
  assert_eq!(notes[0]["message"], "Someone replied to your post: Best onsen?");
  assert_eq!(notes[0]["comment_id"], comment["comment_id"]);

  let read_uri = format!("/notifications/{}/read", notes[0]["notification_id"].as_str().unwrap());
  let (status, _) = send(&app, request(Method::PATCH, &read_uri, Some("bob"), None)).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, read) = send(&app, request(Method::PATCH, &read_uri, Some("alice"), None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(read["is_read"], true);

  let (_, bob_notes) = send(&app, request(Method::GET, "/notifications", Some("bob"), None)).await;
  assert!(bob_notes.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn blank_comment_is_rejected() {
  let (app, _) = app().await;
  let post = create_post(&app, "alice", "p").await;
  let uri = format!("/posts/{}/comments", post["post_id"].as_str().unwrap());

  let (status, body) = send(
    &app,
    request(Method::POST, &uri, Some("bob"), Some(json!({ "content": "   " }))),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["field"], "content");
}

#[tokio::test]
async fn comment_owner_edits_and_deletes() {
  let (app, _) = app().await;
  let post = create_post(&app, "alice", "p").await;
  let (_, comment) = send(
    &app,
    request(
      Method::POST,
      &format!("/posts/{}/comments", post["post_id"].as_str().unwrap()),
      Some("bob"),
      Some(json!({ "content": "frist" })),
    ),
  )
  .await;
  let uri = format!("/comments/{}", comment["comment_id"].as_str().unwrap());

  let (status, _) = send(
    &app,
    request(Method::PATCH, &uri, Some("alice"), Some(json!({ "content": "x" }))),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, edited) = send(
    &app,
    request(Method::PATCH, &uri, Some("bob"), Some(json!({ "content": "first" }))),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(edited["content"], "first");

  let (status, _) = send(&app, request(Method::DELETE, &uri, Some("bob"), None)).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) = send(&app, request(Method::DELETE, &uri, Some("bob"), None)).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}
