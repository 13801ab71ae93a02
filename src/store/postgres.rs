//! Postgres store (sqlx, runtime-checked queries).

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::FromRow;
use tracing::{info, instrument};
use uuid::Uuid;

use super::Store;
use crate::domain::{
  LessonContent, LessonDraft, ProgressEntry, ProgressRecord, QuestionDraft, QuizAttempt, QuizQuestion, Scope,
  UpsertPolicy, DEFAULT_DIFFICULTY,
};
use crate::error::Result;

const SCHEMA: &str = include_str!("../../migrations/0001_learning.sql");

const CONTENT_COLUMNS: &str = "content_id, topic, user_id, title, content, difficulty, created_at";
const QUESTION_COLUMNS: &str =
  "question_id, topic, content_id, question, options, correct_answer, explanation, difficulty, created_at";

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub async fn connect(url: &str) -> Result<Self> {
    let pool = PgPoolOptions::new()
      .max_connections(10)
      .acquire_timeout(Duration::from_secs(5))
      .connect(url)
      .await?;
    Ok(Self { pool })
  }

  pub fn from_pool(pool: PgPool) -> Self {
    Self { pool }
  }

  /// Create tables and indexes if they are missing.
  pub async fn ensure_schema(&self) -> Result<()> {
    sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
    info!(target: "campus_guide", "Postgres schema ensured");
    Ok(())
  }
}

#[derive(FromRow)]
struct ContentRow {
  content_id: Uuid,
  topic: String,
  user_id: Option<Uuid>,
  title: String,
  content: String,
  difficulty: String,
  created_at: DateTime<Utc>,
}

impl From<ContentRow> for LessonContent {
  fn from(r: ContentRow) -> Self {
    Self {
      id: Some(r.content_id),
      topic: r.topic,
      owner: r.user_id,
      title: r.title,
      body: r.content,
      difficulty: r.difficulty,
      created_at: r.created_at,
    }
  }
}

#[derive(FromRow)]
struct QuestionRow {
  question_id: Uuid,
  topic: String,
  content_id: Option<Uuid>,
  question: String,
  options: Json<Vec<String>>,
  correct_answer: String,
  explanation: Option<String>,
  difficulty: String,
  created_at: DateTime<Utc>,
}

impl From<QuestionRow> for QuizQuestion {
  fn from(r: QuestionRow) -> Self {
    Self {
      id: r.question_id,
      topic: r.topic,
      content_id: r.content_id,
      question: r.question,
      options: r.options.0,
      correct_answer: r.correct_answer,
      explanation: r.explanation,
      difficulty: r.difficulty,
      created_at: r.created_at,
    }
  }
}

#[derive(FromRow)]
struct AttemptRow {
  user_id: Uuid,
  topic: String,
  score: i32,
  total_questions: i32,
  answers: Json<Vec<String>>,
  completed_at: DateTime<Utc>,
}

impl From<AttemptRow> for QuizAttempt {
  fn from(r: AttemptRow) -> Self {
    Self {
      user: r.user_id,
      topic: r.topic,
      score: r.score.max(0) as u32,
      total_questions: r.total_questions.max(0) as u32,
      answers: r.answers.0,
      completed_at: r.completed_at,
    }
  }
}

#[derive(FromRow)]
struct ProgressRow {
  topic: String,
  title: String,
  completed_at: DateTime<Utc>,
}

#[async_trait]
impl Store for PgStore {
  async fn user_context_hint(&self, user: Uuid) -> Result<Option<String>> {
    let hint: Option<Option<String>> = sqlx::query_scalar("SELECT university FROM users WHERE id = $1")
      .bind(user)
      .fetch_optional(&self.pool)
      .await?;
    Ok(hint.flatten().filter(|h| !h.trim().is_empty()))
  }

  async fn latest_content(&self, topic: &str, scope: Scope) -> Result<Option<LessonContent>> {
    let sql = format!(
      "SELECT {CONTENT_COLUMNS} FROM learning_content \
       WHERE topic = $1 AND user_id IS NOT DISTINCT FROM $2 \
       ORDER BY created_at DESC LIMIT 1"
    );
    let row = sqlx::query_as::<_, ContentRow>(&sql)
      .bind(topic)
      .bind(scope.owner())
      .fetch_optional(&self.pool)
      .await?;
    Ok(row.map(Into::into))
  }

  async fn insert_content(&self, topic: &str, scope: Scope, draft: &LessonDraft) -> Result<LessonContent> {
    let sql = format!(
      "INSERT INTO learning_content (content_id, topic, user_id, title, content, difficulty) \
       VALUES ($1, $2, $3, $4, $5, $6) RETURNING {CONTENT_COLUMNS}"
    );
    let row = sqlx::query_as::<_, ContentRow>(&sql)
      .bind(Uuid::new_v4())
      .bind(topic)
      .bind(scope.owner())
      .bind(&draft.title)
      .bind(&draft.body)
      .bind(&draft.difficulty)
      .fetch_one(&self.pool)
      .await?;
    Ok(row.into())
  }

  async fn repair_content(&self, id: Uuid, draft: &LessonDraft) -> Result<()> {
    sqlx::query("UPDATE learning_content SET title = $2, content = $3, difficulty = $4 WHERE content_id = $1")
      .bind(id)
      .bind(&draft.title)
      .bind(&draft.body)
      .bind(&draft.difficulty)
      .execute(&self.pool)
      .await?;
    Ok(())
  }

  async fn linked_content(&self, user: Uuid, topic: &str) -> Result<Option<LessonContent>> {
    let sql = "SELECT lc.content_id, lc.topic, lc.user_id, lc.title, lc.content, lc.difficulty, lc.created_at \
               FROM learning_progress lp \
               JOIN learning_content lc ON lp.content_id = lc.content_id \
               WHERE lp.user_id = $1 AND lp.topic = $2 \
                 AND (lc.user_id = $1 OR lc.user_id IS NULL) \
               ORDER BY lp.completed_at DESC LIMIT 1";
    let row = sqlx::query_as::<_, ContentRow>(sql)
      .bind(user)
      .bind(topic)
      .fetch_optional(&self.pool)
      .await?;
    Ok(row.map(Into::into))
  }

  #[instrument(level = "debug", skip(self, drafts), fields(%topic, count = drafts.len()))]
  async fn replace_questions(
    &self,
    topic: &str,
    content_id: Option<Uuid>,
    drafts: &[QuestionDraft],
  ) -> Result<Vec<QuizQuestion>> {
    let insert = format!(
      "INSERT INTO quiz_questions \
       (question_id, topic, content_id, position, question, options, correct_answer, explanation, difficulty) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {QUESTION_COLUMNS}"
    );

    // Delete and insert commit together so concurrent regenerations of one
    // topic never leave a mixed set behind.
    let mut tx = self.pool.begin().await?;
    sqlx::query("DELETE FROM quiz_questions WHERE topic = $1")
      .bind(topic)
      .execute(&mut *tx)
      .await?;

    let mut stored = Vec::with_capacity(drafts.len());
    for (position, d) in drafts.iter().enumerate() {
      let row = sqlx::query_as::<_, QuestionRow>(&insert)
        .bind(Uuid::new_v4())
        .bind(topic)
        .bind(content_id)
        .bind(position as i32)
        .bind(&d.question)
        .bind(Json(&d.options))
        .bind(&d.correct_answer)
        .bind(d.explanation.as_deref())
        .bind(d.difficulty.as_deref().unwrap_or(DEFAULT_DIFFICULTY))
        .fetch_one(&mut *tx)
        .await?;
      stored.push(QuizQuestion::from(row));
    }
    tx.commit().await?;
    Ok(stored)
  }

  async fn questions_for_topic(&self, topic: &str, limit: usize) -> Result<Vec<QuizQuestion>> {
    let sql = format!(
      "SELECT {QUESTION_COLUMNS} FROM quiz_questions WHERE topic = $1 \
       ORDER BY created_at ASC, position ASC LIMIT $2"
    );
    let rows = sqlx::query_as::<_, QuestionRow>(&sql)
      .bind(topic)
      .bind(limit as i64)
      .fetch_all(&self.pool)
      .await?;
    Ok(rows.into_iter().map(Into::into).collect())
  }

  async fn insert_attempt(&self, attempt: &QuizAttempt) -> Result<()> {
    sqlx::query(
      "INSERT INTO quiz_attempts (attempt_id, user_id, topic, score, total_questions, answers, completed_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(Uuid::new_v4())
    .bind(attempt.user)
    .bind(&attempt.topic)
    .bind(attempt.score as i32)
    .bind(attempt.total_questions as i32)
    .bind(Json(&attempt.answers))
    .bind(attempt.completed_at)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn upsert_progress(&self, record: &ProgressRecord, policy: UpsertPolicy) -> Result<()> {
    let sql = match policy {
      UpsertPolicy::OverwriteByTopic => {
        "INSERT INTO learning_progress (user_id, topic, content_id, completed_at, scoped) \
         VALUES ($1, $2, $3, $4, true) \
         ON CONFLICT (user_id, topic) WHERE scoped DO UPDATE SET content_id = EXCLUDED.content_id"
      }
      UpsertPolicy::KeepByContent => {
        "INSERT INTO learning_progress (user_id, topic, content_id, completed_at) \
         VALUES ($1, $2, $3, $4) ON CONFLICT (user_id, content_id) DO NOTHING"
      }
    };
    sqlx::query(sql)
      .bind(record.user)
      .bind(&record.topic)
      .bind(record.content_id)
      .bind(record.completed_at)
      .execute(&self.pool)
      .await?;
    Ok(())
  }

  async fn progress_for_user(&self, user: Uuid) -> Result<Vec<ProgressEntry>> {
    let rows = sqlx::query_as::<_, ProgressRow>(
      "SELECT lp.topic, lc.title, lp.completed_at \
       FROM learning_progress lp \
       JOIN learning_content lc ON lp.content_id = lc.content_id \
       WHERE lp.user_id = $1 ORDER BY lp.completed_at DESC",
    )
    .bind(user)
    .fetch_all(&self.pool)
    .await?;
    Ok(rows
      .into_iter()
      .map(|r| ProgressEntry { topic: r.topic, title: r.title, completed_at: r.completed_at })
      .collect())
  }

  async fn attempts_for_user(&self, user: Uuid, limit: Option<usize>) -> Result<Vec<QuizAttempt>> {
    // LIMIT NULL means no limit in Postgres.
    let rows = sqlx::query_as::<_, AttemptRow>(
      "SELECT user_id, topic, score, total_questions, answers, completed_at \
       FROM quiz_attempts WHERE user_id = $1 ORDER BY completed_at DESC LIMIT $2",
    )
    .bind(user)
    .bind(limit.map(|l| l as i64))
    .fetch_all(&self.pool)
    .await?;
    Ok(rows.into_iter().map(Into::into).collect())
  }
}

#[cfg(test)]
mod tests {
  //! Run against a live database only when DATABASE_URL is set; otherwise each
  //! test returns early.

  use super::*;
  use tokio::sync::OnceCell;

  static SCHEMA: OnceCell<()> = OnceCell::const_new();

  async fn live_store() -> Option<PgStore> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
      eprintln!("DATABASE_URL not set; skipping Postgres test");
      return None;
    };
    let store = PgStore::connect(&url).await.expect("connect to DATABASE_URL");
    SCHEMA.get_or_try_init(|| store.ensure_schema()).await.expect("ensure schema");
    Some(store)
  }

  fn unique_topic() -> String {
    format!("pg-test-{}", Uuid::new_v4())
  }

  fn lesson(title: &str) -> LessonDraft {
    LessonDraft { title: title.into(), body: format!("{title} body"), difficulty: "Beginner".into() }
  }

  fn question(i: usize) -> QuestionDraft {
    QuestionDraft {
      question: format!("Stored question number {i}?"),
      options: vec![format!("right {i}"), "wrong one".into(), "wrong two".into(), "wrong three".into()],
      correct_answer: format!("right {i}"),
      explanation: None,
      difficulty: None,
    }
  }

  fn record(user: Uuid, topic: &str, content_id: Uuid) -> ProgressRecord {
    ProgressRecord { user, topic: topic.into(), content_id, completed_at: Utc::now() }
  }

  #[tokio::test]
  async fn replace_questions_swaps_the_whole_set_in_order() {
    let Some(store) = live_store().await else { return };
    let topic = unique_topic();
    let content = store.insert_content(&topic, Scope::Global, &lesson("Grounding")).await.unwrap();

    let first: Vec<QuestionDraft> = (0..5).map(question).collect();
    store.replace_questions(&topic, content.id, &first).await.unwrap();
    let second: Vec<QuestionDraft> = (10..12).map(question).collect();
    let stored = store.replace_questions(&topic, content.id, &second).await.unwrap();
    assert_eq!(stored.len(), 2);

    let read = store.questions_for_topic(&topic, 5).await.unwrap();
    let texts: Vec<&str> = read.iter().map(|q| q.question.as_str()).collect();
    assert_eq!(texts, ["Stored question number 10?", "Stored question number 11?"]);
    assert!(read.iter().all(|q| q.content_id == content.id && q.difficulty == DEFAULT_DIFFICULTY));
    assert_eq!(read[0].options.len(), 4);
  }

  #[tokio::test]
  async fn latest_content_respects_scope() {
    let Some(store) = live_store().await else { return };
    let topic = unique_topic();
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
    store.insert_content(&topic, Scope::Global, &lesson("Shared")).await.unwrap();
    store.insert_content(&topic, Scope::Owner(alice), &lesson("Alice")).await.unwrap();

    let global = store.latest_content(&topic, Scope::Global).await.unwrap().unwrap();
    assert_eq!(global.title, "Shared");
    assert_eq!(global.owner, None);
    let mine = store.latest_content(&topic, Scope::Owner(alice)).await.unwrap().unwrap();
    assert_eq!(mine.title, "Alice");
    assert_eq!(mine.owner, Some(alice));
    assert!(store.latest_content(&topic, Scope::Owner(bob)).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn concurrent_overwrites_leave_one_row_per_topic() {
    let Some(store) = live_store().await else { return };
    let topic = unique_topic();
    let user = Uuid::new_v4();
    let mut ids = Vec::new();
    for i in 0..6 {
      let c = store.insert_content(&topic, Scope::Owner(user), &lesson(&format!("Lesson {i}"))).await.unwrap();
      ids.extend(c.id);
    }

    let writes = ids.iter().map(|id| {
      let store = store.clone();
      let rec = record(user, &topic, *id);
      tokio::spawn(async move { store.upsert_progress(&rec, UpsertPolicy::OverwriteByTopic).await })
    });
    for w in writes.collect::<Vec<_>>() {
      w.await.unwrap().unwrap();
    }
    // Every later overwrite still succeeds against the single row.
    store.upsert_progress(&record(user, &topic, ids[0]), UpsertPolicy::OverwriteByTopic).await.unwrap();

    let rows = store.progress_for_user(user).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "Lesson 0");
    let linked = store.linked_content(user, &topic).await.unwrap().unwrap();
    assert_eq!(linked.id, Some(ids[0]));
  }

  #[tokio::test]
  async fn keep_policy_records_each_content_once() {
    let Some(store) = live_store().await else { return };
    let topic = unique_topic();
    let user = Uuid::new_v4();
    let a = store.insert_content(&topic, Scope::Global, &lesson("First")).await.unwrap().id.unwrap();
    let b = store.insert_content(&topic, Scope::Global, &lesson("Second")).await.unwrap().id.unwrap();

    store.upsert_progress(&record(user, &topic, a), UpsertPolicy::KeepByContent).await.unwrap();
    store.upsert_progress(&record(user, &topic, a), UpsertPolicy::KeepByContent).await.unwrap();
    store.upsert_progress(&record(user, &topic, b), UpsertPolicy::KeepByContent).await.unwrap();

    let rows = store.progress_for_user(user).await.unwrap();
    assert_eq!(rows.len(), 2);
  }
}
