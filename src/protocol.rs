//! Public protocol structs for the HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{LessonContent, ProgressEntry, QuizAttempt, QuizQuestion};
use crate::progress::{Activity, UserProgress};
use crate::scoring::{Graded, Verdict};

/// Why an operation answered with `success: false`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Failure {
    /// The caller can fix it: bad input, no quiz yet, wrong answer count.
    Rejected,
    /// A storage fault on a view that has no fallback.
    Internal,
}

/// Envelope shared by every learning operation. The payload's fields are
/// flattened next to `success`, so a lesson response reads
/// `{"success": true, "content": {...}}`.
#[derive(Debug, Serialize)]
pub struct Outcome<T> {
    pub success: bool,
    #[serde(flatten)]
    pub payload: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip)]
    pub failure: Option<Failure>,
}

impl<T> Outcome<T> {
    pub fn ok(payload: T) -> Self {
        Self { success: true, payload: Some(payload), message: None, warning: None, failure: None }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::fail(Failure::Rejected, message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::fail(Failure::Internal, message.into())
    }

    fn fail(failure: Failure, message: String) -> Self {
        Self { success: false, payload: None, message: Some(message), warning: None, failure: Some(failure) }
    }
}

//
// Requests
//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicIn {
    pub topic: String,
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitIn {
    pub topic: String,
    pub user_id: Uuid,
    pub answers: Vec<String>,
}

//
// Responses
//

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonOut {
    /// Null when the lesson was not persisted.
    pub content_id: Option<Uuid>,
    pub topic: String,
    pub title: String,
    pub content: String,
    pub difficulty: String,
    pub created_at: DateTime<Utc>,
}

impl From<LessonContent> for LessonOut {
    fn from(c: LessonContent) -> Self {
        Self {
            content_id: c.id,
            topic: c.topic,
            title: c.title,
            content: c.body,
            difficulty: c.difficulty,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ContentPayload {
    pub content: LessonOut,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOut {
    /// A UUID for stored questions, `emergency-<ms>-<i>` for unpersisted ones.
    pub question_id: String,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: Option<String>,
    pub difficulty: String,
}

impl QuestionOut {
    pub fn stored(q: QuizQuestion) -> Self {
        Self::with_id(q.id.to_string(), q)
    }

    pub fn emergency(stamp_ms: i64, index: usize, q: QuizQuestion) -> Self {
        Self::with_id(format!("emergency-{stamp_ms}-{index}"), q)
    }

    fn with_id(question_id: String, q: QuizQuestion) -> Self {
        Self {
            question_id,
            question: q.question,
            options: q.options,
            correct_answer: q.correct_answer,
            explanation: q.explanation,
            difficulty: q.difficulty,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QuizPayload {
    pub questions: Vec<QuestionOut>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictOut {
    pub question_id: Uuid,
    pub user_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    pub explanation: Option<String>,
}

impl From<Verdict> for VerdictOut {
    fn from(v: Verdict) -> Self {
        Self {
            question_id: v.question_id,
            user_answer: v.submitted,
            correct_answer: v.correct,
            is_correct: v.is_correct,
            explanation: v.explanation,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub score: u32,
    pub total_questions: u32,
    pub percentage: u32,
    pub results: Vec<VerdictOut>,
}

impl From<Graded> for QuizResult {
    fn from(g: Graded) -> Self {
        Self {
            score: g.score,
            total_questions: g.total,
            percentage: g.percentage,
            results: g.verdicts.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptOut {
    pub topic: String,
    pub score: u32,
    pub total_questions: u32,
    pub completed_at: DateTime<Utc>,
}

impl From<QuizAttempt> for AttemptOut {
    fn from(a: QuizAttempt) -> Self {
        Self { topic: a.topic, score: a.score, total_questions: a.total_questions, completed_at: a.completed_at }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPayload {
    pub learning_progress: Vec<ProgressEntry>,
    pub quiz_attempts: Vec<AttemptOut>,
}

impl From<UserProgress> for ProgressPayload {
    fn from(p: UserProgress) -> Self {
        Self {
            learning_progress: p.lessons,
            quiz_attempts: p.attempts.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityOut {
    pub topic: String,
    pub topic_name: String,
    pub category_type: &'static str,
    pub score: u32,
    pub total_questions: u32,
    pub completed_at: DateTime<Utc>,
}

impl From<Activity> for ActivityOut {
    fn from(a: Activity) -> Self {
        Self {
            topic: a.topic,
            topic_name: a.display_name,
            category_type: a.category,
            score: a.score,
            total_questions: a.total_questions,
            completed_at: a.completed_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPayload {
    pub recent_activity: Vec<ActivityOut>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
