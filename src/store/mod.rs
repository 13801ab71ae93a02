//! Persistence seam. The pipeline, quiz engine, scorer and progress recorder
//! only see `Store`; `MemoryStore` backs local runs and tests, `PgStore`
//! backs deployments with a DATABASE_URL.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
  LessonContent, LessonDraft, ProgressEntry, ProgressRecord, QuestionDraft, QuizAttempt, QuizQuestion, Scope,
  UpsertPolicy,
};
use crate::error::Result;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
  /// The learner's context hint (their institution), if one is on file.
  async fn user_context_hint(&self, user: Uuid) -> Result<Option<String>>;

  /// Most recently created lesson for (topic, scope), stale or not.
  async fn latest_content(&self, topic: &str, scope: Scope) -> Result<Option<LessonContent>>;

  /// Insert a new lesson row; history is never overwritten.
  async fn insert_content(&self, topic: &str, scope: Scope, draft: &LessonDraft) -> Result<LessonContent>;

  /// Overwrite title/body/difficulty of an existing row (stale repair only).
  async fn repair_content(&self, id: Uuid, draft: &LessonDraft) -> Result<()>;

  /// Lesson the learner's progress links to for this topic, restricted to
  /// content they own or global content.
  async fn linked_content(&self, user: Uuid, topic: &str) -> Result<Option<LessonContent>>;

  /// Delete every stored question for `topic`, then insert `drafts` in order.
  async fn replace_questions(
    &self,
    topic: &str,
    content_id: Option<Uuid>,
    drafts: &[QuestionDraft],
  ) -> Result<Vec<QuizQuestion>>;

  /// Stored questions for `topic`, oldest first, at most `limit`.
  async fn questions_for_topic(&self, topic: &str, limit: usize) -> Result<Vec<QuizQuestion>>;

  async fn insert_attempt(&self, attempt: &QuizAttempt) -> Result<()>;

  async fn upsert_progress(&self, record: &ProgressRecord, policy: UpsertPolicy) -> Result<()>;

  /// Progress joined with content titles, newest first.
  async fn progress_for_user(&self, user: Uuid) -> Result<Vec<ProgressEntry>>;

  /// Quiz attempts, newest first.
  async fn attempts_for_user(&self, user: Uuid, limit: Option<usize>) -> Result<Vec<QuizAttempt>>;
}
