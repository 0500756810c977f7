//! Router tests over an in-memory store and a fixed-reply summarizer.

use std::{
  convert::Infallible,
  sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  },
};

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode},
};
use chrono::{DateTime, Duration, Utc};
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;
use verdict_core::{
  clock::{Clock, ManualClock},
  summarizer::Summarizer,
};
use verdict_engine::{CollectionLifecycle, LifecycleConfig, MemoryStore};

use crate::api_router;

/// Always replies with the same text and counts its calls.
struct FixedReply {
  reply: &'static str,
  calls: AtomicUsize,
}

impl Summarizer for FixedReply {
  type Error = Infallible;

  async fn summarize(&self, _prompt: &str) -> Result<String, Infallible> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    Ok(self.reply.to_owned())
  }
}

struct Harness {
  router:     Router,
  clock:      Arc<ManualClock>,
  summarizer: Arc<FixedReply>,
}

/// The clock starts an hour in the past so collections created with a
/// deadline just before `now` stay open until the test moves time forward.
fn harness(reply: &'static str) -> Harness {
  let clock = Arc::new(ManualClock::new(Utc::now() - Duration::hours(1)));
  let summarizer = Arc::new(FixedReply { reply, calls: AtomicUsize::new(0) });
  let lifecycle = CollectionLifecycle::new(
    Arc::new(MemoryStore::new()),
    summarizer.clone(),
    clock.clone() as Arc<dyn Clock>,
    LifecycleConfig::default(),
  );
  Harness { router: api_router(lifecycle), clock, summarizer }
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let builder = Request::builder().method(method).uri(uri);
  let req = match body {
    Some(v) => builder
      .header("content-type", "application/json")
      .body(Body::from(v.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };
  let resp = router.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  let json = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
  };
  (status, json)
}

fn create_body(title: &str, deadline: DateTime<Utc>) -> Value {
  json!({
    "title": title,
    "description": "Pick one",
    "deadline": deadline,
    "owner_id": Uuid::new_v4(),
  })
}

async fn create(h: &Harness, path: &str, title: &str, deadline: DateTime<Utc>) -> String {
  let (status, body) = send(&h.router, "POST", path, Some(create_body(title, deadline))).await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  body["collection_id"].as_str().unwrap().to_owned()
}

// ── Create ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_contest_returns_201_and_is_readable() {
  let h = harness("x");
  let id = create(&h, "/contests", "Best color?", Utc::now() + Duration::hours(1)).await;

  let (status, body) = send(&h.router, "GET", &format!("/contests/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["title"], "Best color?");
  assert_eq!(body["kind"], "contest");
  assert_eq!(body["state"], "open");
  assert_eq!(body["is_active"], true);
  assert!(body["similar_answer"].is_null());
}

#[tokio::test]
async fn create_without_title_is_400() {
  let h = harness("x");
  let body = json!({
    "description": "Pick one",
    "deadline": Utc::now() + Duration::hours(1),
    "owner_id": Uuid::new_v4(),
  });
  let (status, body) = send(&h.router, "POST", "/topics", Some(body)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("title"));
}

#[tokio::test]
async fn create_without_deadline_is_400() {
  let h = harness("x");
  let body = json!({ "title": "T", "description": "D", "owner_id": Uuid::new_v4() });
  let (status, _) = send(&h.router, "POST", "/contests", Some(body)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── Get & list ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn get_unknown_or_wrong_kind_is_404() {
  let h = harness("x");
  let id = create(&h, "/topics", "Tabs or spaces?", Utc::now() + Duration::hours(1)).await;

  let (status, body) = send(&h.router, "GET", &format!("/contests/{id}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].is_string());

  let missing = Uuid::new_v4();
  let (status, _) = send(&h.router, "GET", &format!("/topics/{missing}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn wrong_kind_does_not_close_an_overdue_collection() {
  let h = harness("tabs");
  let now = Utc::now();
  let id = create(&h, "/topics", "Tabs or spaces?", now - Duration::seconds(1)).await;
  h.clock.set(now);

  let (status, _) = send(&h.router, "GET", &format!("/contests/{id}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  let (status, _) = send(
    &h.router,
    "POST",
    &format!("/contests/{id}/answers"),
    Some(json!({ "text": "tabs", "author_id": Uuid::new_v4() })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(h.summarizer.calls.load(Ordering::SeqCst), 0);

  let (status, body) = send(&h.router, "GET", &format!("/topics/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["state"], "closed");
  assert_eq!(h.summarizer.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn list_returns_only_the_requested_kind() {
  let h = harness("x");
  let later = Utc::now() + Duration::hours(1);
  create(&h, "/contests", "one", later).await;
  create(&h, "/topics", "two", later).await;
  create(&h, "/contests", "three", later).await;

  let (status, body) = send(&h.router, "GET", "/contests", None).await;
  assert_eq!(status, StatusCode::OK);
  let titles: Vec<&str> = body
    .as_array()
    .unwrap()
    .iter()
    .map(|c| c["title"].as_str().unwrap())
    .collect();
  assert_eq!(titles, ["one", "three"]);
}

// ── Answers ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn answer_to_open_collection_is_201() {
  let h = harness("x");
  let id = create(&h, "/contests", "Q", Utc::now() + Duration::hours(1)).await;
  let author = Uuid::new_v4();

  let (status, body) = send(
    &h.router,
    "POST",
    &format!("/contests/{id}/answers"),
    Some(json!({ "text": "blue", "author_id": author })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["text"], "blue");
  assert_eq!(body["author_id"], author.to_string());
}

#[tokio::test]
async fn blank_answer_is_400_and_wrong_kind_is_404() {
  let h = harness("x");
  let id = create(&h, "/contests", "Q", Utc::now() + Duration::hours(1)).await;

  let (status, _) = send(
    &h.router,
    "POST",
    &format!("/contests/{id}/answers"),
    Some(json!({ "text": "   ", "author_id": Uuid::new_v4() })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = send(
    &h.router,
    "POST",
    &format!("/topics/{id}/answers"),
    Some(json!({ "text": "hi", "author_id": Uuid::new_v4() })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn closed_collection_reports_best_answer_and_refuses_answers() {
  let h = harness("blue");
  let now = Utc::now();
  let id = create(&h, "/contests", "Best color?", now - Duration::seconds(1)).await;

  for text in ["Blue", "red", "bleu"] {
    let (status, _) = send(
      &h.router,
      "POST",
      &format!("/contests/{id}/answers"),
      Some(json!({ "text": text, "author_id": Uuid::new_v4() })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
  }

  h.clock.set(now);

  let (status, body) = send(&h.router, "GET", &format!("/contests/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["state"], "closed");
  assert_eq!(body["is_active"], false);
  assert_eq!(body["best_answer"], "blue");
  assert_eq!(body["similar_answer"]["answer"]["text"], "Blue");
  assert_eq!(body["similar_answer"]["score"], 1.0);

  let (status, body) = send(
    &h.router,
    "POST",
    &format!("/contests/{id}/answers"),
    Some(json!({ "text": "green", "author_id": Uuid::new_v4() })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert!(body["error"].as_str().unwrap().contains("closed"));
}
