#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use campus_guide::config::AgentConfig;
use campus_guide::domain::{
  LessonContent, LessonDraft, ProgressEntry, ProgressRecord, QuestionDraft, QuizAttempt, QuizQuestion, Scope,
  UpsertPolicy,
};
use campus_guide::requester::{CompletionService, Unconfigured};
pub use campus_guide::requester::testing::Scripted;
use campus_guide::routes::build_router;
use campus_guide::store::{MemoryStore, Store};
use campus_guide::{AppState, Result};

/// Store whose every call panics, standing in for a bug deep in a workflow.
pub struct PanickingStore;

#[async_trait]
impl Store for PanickingStore {
  async fn user_context_hint(&self, _user: Uuid) -> Result<Option<String>> {
    panic!("user_context_hint")
  }
  async fn latest_content(&self, _topic: &str, _scope: Scope) -> Result<Option<LessonContent>> {
    panic!("latest_content")
  }
  async fn insert_content(&self, _topic: &str, _scope: Scope, _draft: &LessonDraft) -> Result<LessonContent> {
    panic!("insert_content")
  }
  async fn repair_content(&self, _id: Uuid, _draft: &LessonDraft) -> Result<()> {
    panic!("repair_content")
  }
  async fn linked_content(&self, _user: Uuid, _topic: &str) -> Result<Option<LessonContent>> {
    panic!("linked_content")
  }
  async fn replace_questions(
    &self,
    _topic: &str,
    _content_id: Option<Uuid>,
    _drafts: &[QuestionDraft],
  ) -> Result<Vec<QuizQuestion>> {
    panic!("replace_questions")
  }
  async fn questions_for_topic(&self, _topic: &str, _limit: usize) -> Result<Vec<QuizQuestion>> {
    panic!("questions_for_topic")
  }
  async fn insert_attempt(&self, _attempt: &QuizAttempt) -> Result<()> {
    panic!("insert_attempt")
  }
  async fn upsert_progress(&self, _record: &ProgressRecord, _policy: UpsertPolicy) -> Result<()> {
    panic!("upsert_progress")
  }
  async fn progress_for_user(&self, _user: Uuid) -> Result<Vec<ProgressEntry>> {
    panic!("progress_for_user")
  }
  async fn attempts_for_user(&self, _user: Uuid, _limit: Option<usize>) -> Result<Vec<QuizAttempt>> {
    panic!("attempts_for_user")
  }
}

pub fn state_with(store: Arc<dyn Store>, completion: Arc<dyn CompletionService>) -> Arc<AppState> {
  Arc::new(AppState::new(store, completion, AgentConfig::default()))
}

pub fn offline_state(store: Arc<MemoryStore>) -> Arc<AppState> {
  state_with(store, Arc::new(Unconfigured))
}

pub fn app(state: Arc<AppState>) -> Router {
  build_router(state)
}

pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
  let resp = app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  (status, value)
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
  let req = Request::builder()
    .method("POST")
    .uri(uri)
    .header("content-type", "application/json")
    .body(Body::from(body.to_string()))
    .unwrap();
  send(app, req).await
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
  let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
  send(app, req).await
}

pub fn quiz_reply(n: usize) -> String {
  let questions: Vec<Value> = (0..n)
    .map(|i| {
      serde_json::json!({
        "question": format!("Generated question number {i}?"),
        "options": [format!("B) right {i}"), "wrong one", "wrong two", "wrong three"],
        "correctAnswer": format!("right {i}"),
        "explanation": "Because.",
      })
    })
    .collect();
  serde_json::json!({ "questions": questions }).to_string()
}
