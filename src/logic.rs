//! The five learning operations behind the HTTP handlers.
//!
//! Each returns an `Outcome` and never an internal error. Content and quiz
//! acquisition run on their own task so that even a panic deep in the
//! workflow still answers with catalog material and a warning.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::catalog;
use crate::domain::{LessonContent, QuizQuestion, Scope};
use crate::error::{Error, Result};
use crate::pipeline::{ContentPipeline, LessonRequest};
use crate::progress;
use crate::protocol::{
    ActivityPayload, ContentPayload, Outcome, ProgressPayload, QuestionOut, QuizPayload, QuizResult,
};
use crate::quiz;
use crate::scoring;
use crate::state::AppState;

pub const CONTENT_FALLBACK_WARNING: &str = "Using fallback content due to technical issues";
pub const QUIZ_FALLBACK_WARNING: &str = "Using emergency fallback questions due to technical issues";
pub const INTERNAL_ERROR: &str = "Internal server error";

/// Trimmed topic key, or `InvalidRequest` when nothing is left.
pub fn validate_topic(topic: &str) -> Result<&str> {
    let t = topic.trim();
    if t.is_empty() {
        Err(Error::InvalidRequest("topic must not be empty".into()))
    } else {
        Ok(t)
    }
}

#[instrument(level = "info", skip(state), fields(%topic, %user))]
pub async fn get_learning_content(state: Arc<AppState>, topic: &str, user: Uuid) -> Outcome<ContentPayload> {
    let topic = match validate_topic(topic) {
        Ok(t) => t.to_string(),
        Err(e) => return Outcome::rejected(e.to_string()),
    };

    let task = {
        let topic = topic.clone();
        tokio::spawn(async move {
            let scope = state.scope_for(&topic, user);
            ContentPipeline::new(state.store.as_ref(), state.requester())
                .acquire(LessonRequest {
                    topic: &topic,
                    user,
                    scope,
                    hint: state.context_hint(&topic, user).await.as_deref(),
                })
                .await
        })
    };

    match task.await {
        Ok(acquired) => Outcome::ok(ContentPayload { content: acquired.content.into() }),
        Err(e) => {
            error!(target: "content", op = "GENERAL_ERROR", %topic, %user, error = %e, "Lesson workflow aborted; serving catalog entry");
            let draft = catalog::fallback_lesson(&topic);
            let content = LessonContent::unpersisted(&topic, Scope::Global, draft);
            Outcome::ok(ContentPayload { content: content.into() }).with_warning(CONTENT_FALLBACK_WARNING)
        }
    }
}

#[instrument(level = "info", skip(state), fields(%topic, %user))]
pub async fn generate_quiz(state: Arc<AppState>, topic: &str, user: Uuid) -> Outcome<QuizPayload> {
    let topic = match validate_topic(topic) {
        Ok(t) => t.to_string(),
        Err(e) => return Outcome::rejected(e.to_string()),
    };

    let task = {
        let topic = topic.clone();
        tokio::spawn(async move {
            quiz::generate_quiz(
                state.store.as_ref(),
                &state.requester(),
                &topic,
                user,
                state.context_hint(&topic, user).await.as_deref(),
            )
            .await
        })
    };

    match task.await {
        Ok(set) if set.persisted => {
            Outcome::ok(QuizPayload { questions: set.questions.into_iter().map(QuestionOut::stored).collect() })
        }
        Ok(set) => emergency_quiz(set.questions),
        Err(e) => {
            error!(target: "quiz", op = "QUIZ_GENERATION_CRITICAL", %topic, %user, error = %e, "Quiz workflow aborted; serving catalog set");
            let questions = catalog::fallback_questions(&topic)
                .into_iter()
                .map(|d| QuizQuestion::from_draft(&topic, None, d))
                .collect();
            emergency_quiz(questions)
        }
    }
}

fn emergency_quiz(questions: Vec<QuizQuestion>) -> Outcome<QuizPayload> {
    let stamp = Utc::now().timestamp_millis();
    let questions = questions
        .into_iter()
        .enumerate()
        .map(|(i, q)| QuestionOut::emergency(stamp, i, q))
        .collect();
    Outcome::ok(QuizPayload { questions }).with_warning(QUIZ_FALLBACK_WARNING)
}

#[instrument(level = "info", skip(state, answers), fields(%topic, %user, received = answers.len()))]
pub async fn submit_quiz(state: &AppState, topic: &str, user: Uuid, answers: &[String]) -> Outcome<QuizResult> {
    let topic = match validate_topic(topic) {
        Ok(t) => t,
        Err(e) => return Outcome::rejected(e.to_string()),
    };
    match scoring::submit(state.store.as_ref(), topic, user, answers).await {
        Ok(graded) => Outcome::ok(graded.into()),
        Err(e) if e.is_user_correctable() => {
            info!(target: "scoring", %topic, %user, kind = e.kind(), "Submission rejected");
            Outcome::rejected(e.to_string())
        }
        Err(e) => {
            error!(target: "scoring", op = "SUBMIT_QUIZ", %topic, %user, kind = e.kind(), error = %e, "Grading failed");
            Outcome::internal(INTERNAL_ERROR)
        }
    }
}

#[instrument(level = "info", skip(state), fields(%user))]
pub async fn get_user_progress(state: &AppState, user: Uuid) -> Outcome<ProgressPayload> {
    match progress::user_progress(state.store.as_ref(), user).await {
        Ok(p) => Outcome::ok(p.into()),
        Err(e) => {
            warn!(target: "progress", op = "GET_USER_PROGRESS", %user, kind = e.kind(), error = %e, "Progress view failed");
            Outcome::internal(INTERNAL_ERROR)
        }
    }
}

#[instrument(level = "info", skip(state), fields(%user))]
pub async fn get_recent_activity(state: &AppState, user: Uuid) -> Outcome<ActivityPayload> {
    match progress::recent_activity(state.store.as_ref(), user).await {
        Ok(items) => Outcome::ok(ActivityPayload { recent_activity: items.into_iter().map(Into::into).collect() }),
        Err(e) => {
            warn!(target: "progress", op = "GET_RECENT_ACTIVITY", %user, kind = e.kind(), error = %e, "Recent activity view failed");
            Outcome::internal(INTERNAL_ERROR)
        }
    }
}
