//! Domain models: lessons, quiz questions, attempts, progress records and the
//! scope that decides who owns stored content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Phrases left behind by an older generator when it stored a placeholder
/// instead of a real lesson. A body containing any of them is stale.
pub const STALE_MARKERS: &[&str] = &[
  "Content for this topic is being generated",
  "Please try again in a moment",
];

pub const DEFAULT_DIFFICULTY: &str = "Beginner";

/// Exactly this many questions make up one quiz.
pub const QUIZ_SIZE: usize = 5;

/// Who stored content belongs to.
///
/// Personalizable topics depend on the learner's context hint and are stored
/// per user; every other topic shares one global lesson.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
  Global,
  Owner(Uuid),
}

impl Scope {
  pub fn owner(&self) -> Option<Uuid> {
    match self {
      Scope::Global => None,
      Scope::Owner(id) => Some(*id),
    }
  }

  pub fn is_personal(&self) -> bool {
    matches!(self, Scope::Owner(_))
  }

  /// Conflict policy used when recording progress for content in this scope.
  pub fn upsert_policy(&self) -> UpsertPolicy {
    match self {
      Scope::Global => UpsertPolicy::KeepByContent,
      Scope::Owner(_) => UpsertPolicy::OverwriteByTopic,
    }
  }
}

/// How a progress upsert resolves an existing record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpsertPolicy {
  /// Keyed by (user, topic); the latest content reference wins.
  OverwriteByTopic,
  /// Keyed by (user, content); the first completion is retained.
  KeepByContent,
}

/// Title/body/difficulty triple as produced by the model or the catalog,
/// before it is attached to a topic and persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LessonDraft {
  pub title: String,
  pub body: String,
  pub difficulty: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LessonContent {
  /// `None` until the record has been persisted.
  pub id: Option<Uuid>,
  pub topic: String,
  pub owner: Option<Uuid>,
  pub title: String,
  pub body: String,
  pub difficulty: String,
  pub created_at: DateTime<Utc>,
}

impl LessonContent {
  /// Wrap a draft into the lesson shape without persisting it.
  pub fn unpersisted(topic: &str, scope: Scope, draft: LessonDraft) -> Self {
    Self {
      id: None,
      topic: topic.to_string(),
      owner: scope.owner(),
      title: draft.title,
      body: draft.body,
      difficulty: draft.difficulty,
      created_at: Utc::now(),
    }
  }

  pub fn is_stale(&self) -> bool {
    STALE_MARKERS.iter().any(|m| self.body.contains(m))
  }

  /// Replace title/body/difficulty in place, keeping id and timestamps.
  pub fn apply(&mut self, draft: LessonDraft) {
    self.title = draft.title;
    self.body = draft.body;
    self.difficulty = draft.difficulty;
  }
}

/// One multiple-choice question as proposed by the model or the catalog.
///
/// Every field defaults so that a partially-formed candidate still
/// deserializes and is rejected by the validator instead of by serde.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuestionDraft {
  pub question: String,
  pub options: Vec<String>,
  pub correct_answer: String,
  pub explanation: Option<String>,
  pub difficulty: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
  pub id: Uuid,
  pub topic: String,
  pub content_id: Option<Uuid>,
  pub question: String,
  pub options: Vec<String>,
  pub correct_answer: String,
  pub explanation: Option<String>,
  pub difficulty: String,
  pub created_at: DateTime<Utc>,
}

impl QuizQuestion {
  pub fn from_draft(topic: &str, content_id: Option<Uuid>, draft: QuestionDraft) -> Self {
    Self {
      id: Uuid::new_v4(),
      topic: topic.to_string(),
      content_id,
      question: draft.question,
      options: draft.options,
      correct_answer: draft.correct_answer,
      explanation: draft.explanation,
      difficulty: draft.difficulty.unwrap_or_else(|| DEFAULT_DIFFICULTY.to_string()),
      created_at: Utc::now(),
    }
  }
}

/// Append-only record of one graded submission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuizAttempt {
  pub user: Uuid,
  pub topic: String,
  pub score: u32,
  pub total_questions: u32,
  pub answers: Vec<String>,
  pub completed_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
  pub user: Uuid,
  pub topic: String,
  pub content_id: Uuid,
  pub completed_at: DateTime<Utc>,
}

/// Progress joined with the title of the content it points at.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
  pub topic: String,
  pub title: String,
  pub completed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn lesson(body: &str) -> LessonContent {
    LessonContent::unpersisted(
      "banking",
      Scope::Global,
      LessonDraft { title: "t".into(), body: body.into(), difficulty: "Beginner".into() },
    )
  }

  #[test]
  fn placeholder_bodies_are_stale() {
    assert!(lesson("Content for this topic is being generated. Hang on.").is_stale());
    assert!(lesson("Oops. Please try again in a moment").is_stale());
    assert!(!lesson("Open a checking account first.").is_stale());
  }

  #[test]
  fn scope_picks_upsert_policy() {
    let user = Uuid::new_v4();
    assert_eq!(Scope::Owner(user).upsert_policy(), UpsertPolicy::OverwriteByTopic);
    assert_eq!(Scope::Global.upsert_policy(), UpsertPolicy::KeepByContent);
    assert_eq!(Scope::Owner(user).owner(), Some(user));
    assert_eq!(Scope::Global.owner(), None);
  }

  #[test]
  fn question_draft_tolerates_missing_fields() {
    let d: QuestionDraft = serde_json::from_str(r#"{"question":"What is a lease?"}"#).unwrap();
    assert!(d.options.is_empty());
    assert!(d.correct_answer.is_empty());
    let q = QuizQuestion::from_draft("housing", None, d);
    assert_eq!(q.difficulty, DEFAULT_DIFFICULTY);
  }
}
