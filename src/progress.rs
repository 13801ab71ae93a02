//! Progress recorder and the read-only progress views.
//!
//! Writes here are best-effort: a failed upsert or attempt insert is logged
//! and swallowed so the lesson or score the caller already has still goes out.

use chrono::{DateTime, Utc};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::domain::{ProgressEntry, ProgressRecord, QuizAttempt, Scope};
use crate::error::Result;
use crate::store::Store;
use crate::topics;

/// How many attempts the recent-activity view returns.
pub const RECENT_ACTIVITY_LIMIT: usize = 5;

/// Record that `user` has seen `content_id` for `topic`. The scope decides
/// the conflict policy.
pub async fn record_completion(store: &dyn Store, user: Uuid, topic: &str, content_id: Uuid, scope: Scope) {
  let record = ProgressRecord { user, topic: topic.to_string(), content_id, completed_at: Utc::now() };
  let policy = scope.upsert_policy();
  match store.upsert_progress(&record, policy).await {
    Ok(()) => debug!(target: "progress", %user, %topic, %content_id, ?policy, "Progress recorded"),
    Err(e) => {
      warn!(target: "progress", op = "PROGRESS_TRACKING", %user, %topic, %content_id, kind = e.kind(), error = %e, "Progress not recorded")
    }
  }
}

pub async fn record_attempt(store: &dyn Store, attempt: &QuizAttempt) {
  if let Err(e) = store.insert_attempt(attempt).await {
    warn!(
      target: "progress",
      op = "QUIZ_ATTEMPT_STORAGE",
      user = %attempt.user,
      topic = %attempt.topic,
      score = attempt.score,
      kind = e.kind(),
      error = %e,
      "Quiz attempt not stored"
    );
  }
}

#[derive(Clone, Debug, PartialEq)]
pub struct UserProgress {
  pub lessons: Vec<ProgressEntry>,
  pub attempts: Vec<QuizAttempt>,
}

#[instrument(level = "info", skip(store), fields(%user))]
pub async fn user_progress(store: &dyn Store, user: Uuid) -> Result<UserProgress> {
  let lessons = store.progress_for_user(user).await?;
  let attempts = store.attempts_for_user(user, None).await?;
  Ok(UserProgress { lessons, attempts })
}

/// One quiz attempt annotated for display.
#[derive(Clone, Debug, PartialEq)]
pub struct Activity {
  pub topic: String,
  pub display_name: String,
  pub category: &'static str,
  pub score: u32,
  pub total_questions: u32,
  pub completed_at: DateTime<Utc>,
}

impl From<QuizAttempt> for Activity {
  fn from(a: QuizAttempt) -> Self {
    Self {
      display_name: topics::display_name(&a.topic),
      category: topics::category(&a.topic),
      topic: a.topic,
      score: a.score,
      total_questions: a.total_questions,
      completed_at: a.completed_at,
    }
  }
}

#[instrument(level = "info", skip(store), fields(%user))]
pub async fn recent_activity(store: &dyn Store, user: Uuid) -> Result<Vec<Activity>> {
  let attempts = store.attempts_for_user(user, Some(RECENT_ACTIVITY_LIMIT)).await?;
  Ok(attempts.into_iter().map(Activity::from).collect())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::LessonDraft;
  use crate::store::MemoryStore;
  use chrono::Duration;

  fn attempt(user: Uuid, topic: &str, minutes_ago: i64) -> QuizAttempt {
    QuizAttempt {
      user,
      topic: topic.into(),
      score: 3,
      total_questions: 5,
      answers: vec![],
      completed_at: Utc::now() - Duration::minutes(minutes_ago),
    }
  }

  #[tokio::test]
  async fn failed_writes_are_swallowed() {
    let store = MemoryStore::new();
    store.set_failing(true);
    let user = Uuid::new_v4();
    record_completion(&store, user, "banking", Uuid::new_v4(), Scope::Global).await;
    record_attempt(&store, &attempt(user, "banking", 0)).await;
  }

  #[tokio::test]
  async fn personal_scope_overwrites_the_topic_row() {
    let store = MemoryStore::new();
    let user = Uuid::new_v4();
    let (first, second) = (Uuid::new_v4(), Uuid::new_v4());
    record_completion(&store, user, "campus-life", first, Scope::Owner(user)).await;
    record_completion(&store, user, "campus-life", second, Scope::Owner(user)).await;
    let rows = store.progress_rows().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].content_id, second);
  }

  #[tokio::test]
  async fn recent_activity_is_capped_and_annotated() {
    let store = MemoryStore::new();
    let user = Uuid::new_v4();
    for (i, topic) in ["banking", "laws", "terminology", "campus-life", "housing", "mystery"].iter().enumerate() {
      store.insert_attempt(&attempt(user, topic, 60 - i as i64)).await.unwrap();
    }
    store.insert_attempt(&attempt(Uuid::new_v4(), "banking", 0)).await.unwrap();

    let recent = recent_activity(&store, user).await.unwrap();
    assert_eq!(recent.len(), RECENT_ACTIVITY_LIMIT);
    assert_eq!(recent[0].topic, "mystery");
    assert_eq!(recent[0].display_name, "mystery");
    assert_eq!(recent[0].category, "general");
    assert_eq!(recent[1].display_name, "Housing");
    assert_eq!(recent[1].category, "practical-skills");
    assert!(recent.iter().all(|a| a.topic != "banking"));
  }

  #[tokio::test]
  async fn user_progress_joins_titles_and_lists_all_attempts() {
    let store = MemoryStore::new();
    let user = Uuid::new_v4();
    let lesson = store
      .insert_content(
        "laws",
        Scope::Global,
        &LessonDraft { title: "Local Laws".into(), body: "b".into(), difficulty: "Beginner".into() },
      )
      .await
      .unwrap();
    record_completion(&store, user, "laws", lesson.id.unwrap(), Scope::Global).await;
    for i in 0..7 {
      store.insert_attempt(&attempt(user, "laws", i)).await.unwrap();
    }

    let p = user_progress(&store, user).await.unwrap();
    assert_eq!(p.lessons.len(), 1);
    assert_eq!(p.lessons[0].title, "Local Laws");
    assert_eq!(p.attempts.len(), 7);
    assert!(p.attempts[0].completed_at >= p.attempts[6].completed_at);
  }

  #[tokio::test]
  async fn views_surface_store_failures() {
    let store = MemoryStore::new();
    store.set_failing(true);
    assert!(user_progress(&store, Uuid::new_v4()).await.is_err());
    assert!(recent_activity(&store, Uuid::new_v4()).await.is_err());
  }
}
