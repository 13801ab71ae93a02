//! HTTP endpoint handlers. These are thin wrappers that forward to core logic
//! and pick the status code from the outcome.

use std::sync::Arc;
use axum::{
  extract::{rejection::{JsonRejection, PathRejection}, Path, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::logic;
use crate::protocol::*;
use crate::state::AppState;

fn respond<T: Serialize>(outcome: Outcome<T>) -> Response {
  let status = match outcome.failure {
    None => StatusCode::OK,
    Some(Failure::Rejected) => StatusCode::BAD_REQUEST,
    Some(Failure::Internal) => StatusCode::INTERNAL_SERVER_ERROR,
  };
  (status, Json(outcome)).into_response()
}

fn invalid(reason: String) -> Response {
  info!(target: "campus_guide", %reason, "Rejected malformed request");
  respond(Outcome::<()>::rejected(reason))
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip_all)]
pub async fn http_post_content(
  State(state): State<Arc<AppState>>,
  body: Result<Json<TopicIn>, JsonRejection>,
) -> Response {
  let Json(body) = match body {
    Ok(b) => b,
    Err(rej) => return invalid(rej.body_text()),
  };
  let outcome = logic::get_learning_content(state, &body.topic, body.user_id).await;
  info!(target: "content", topic = %body.topic, user = %body.user_id, success = outcome.success, warned = outcome.warning.is_some(), "HTTP learning content served");
  respond(outcome)
}

#[instrument(level = "info", skip_all)]
pub async fn http_post_quiz(
  State(state): State<Arc<AppState>>,
  body: Result<Json<TopicIn>, JsonRejection>,
) -> Response {
  let Json(body) = match body {
    Ok(b) => b,
    Err(rej) => return invalid(rej.body_text()),
  };
  let outcome = logic::generate_quiz(state, &body.topic, body.user_id).await;
  info!(target: "quiz", topic = %body.topic, user = %body.user_id, success = outcome.success, warned = outcome.warning.is_some(), "HTTP quiz served");
  respond(outcome)
}

#[instrument(level = "info", skip_all)]
pub async fn http_post_submit(
  State(state): State<Arc<AppState>>,
  body: Result<Json<SubmitIn>, JsonRejection>,
) -> Response {
  let Json(body) = match body {
    Ok(b) => b,
    Err(rej) => return invalid(rej.body_text()),
  };
  let outcome = logic::submit_quiz(&state, &body.topic, body.user_id, &body.answers).await;
  info!(target: "scoring", topic = %body.topic, user = %body.user_id, success = outcome.success, "HTTP quiz submission handled");
  respond(outcome)
}

#[instrument(level = "info", skip_all)]
pub async fn http_get_progress(
  State(state): State<Arc<AppState>>,
  user: Result<Path<Uuid>, PathRejection>,
) -> Response {
  match user {
    Ok(Path(user)) => respond(logic::get_user_progress(&state, user).await),
    Err(rej) => invalid(rej.body_text()),
  }
}

#[instrument(level = "info", skip_all)]
pub async fn http_get_activity(
  State(state): State<Arc<AppState>>,
  user: Result<Path<Uuid>, PathRejection>,
) -> Response {
  match user {
    Ok(Path(user)) => respond(logic::get_recent_activity(&state, user).await),
    Err(rej) => invalid(rej.body_text()),
  }
}
