//! In-process store: tables behind one `RwLock`, rows kept in insertion order.
//!
//! `set_failing(true)` makes every operation return `Error::Storage`, which is
//! how tests exercise the fallback tiers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::instrument;
use uuid::Uuid;

use super::Store;
use crate::domain::{
  LessonContent, LessonDraft, ProgressEntry, ProgressRecord, QuestionDraft, QuizAttempt, QuizQuestion, Scope,
  UpsertPolicy,
};
use crate::error::{Error, Result};

#[derive(Default)]
struct Tables {
  hints: HashMap<Uuid, String>,
  contents: Vec<LessonContent>,
  questions: Vec<QuizQuestion>,
  attempts: Vec<QuizAttempt>,
  progress: Vec<ProgressRecord>,
}

#[derive(Default)]
pub struct MemoryStore {
  tables: RwLock<Tables>,
  failing: AtomicBool,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set_failing(&self, failing: bool) {
    self.failing.store(failing, Ordering::SeqCst);
  }

  pub async fn set_context_hint(&self, user: Uuid, hint: impl Into<String>) {
    self.tables.write().await.hints.insert(user, hint.into());
  }

  /// Store a lesson row verbatim (used to seed legacy or placeholder rows).
  pub async fn put_content(&self, content: LessonContent) {
    self.tables.write().await.contents.push(content);
  }

  pub async fn content_by_id(&self, id: Uuid) -> Option<LessonContent> {
    self.tables.read().await.contents.iter().find(|c| c.id == Some(id)).cloned()
  }

  pub async fn progress_rows(&self) -> Vec<ProgressRecord> {
    self.tables.read().await.progress.clone()
  }

  fn check(&self) -> Result<()> {
    if self.failing.load(Ordering::SeqCst) {
      Err(Error::Storage("memory store is set to fail".into()))
    } else {
      Ok(())
    }
  }
}

#[async_trait]
impl Store for MemoryStore {
  async fn user_context_hint(&self, user: Uuid) -> Result<Option<String>> {
    self.check()?;
    Ok(self.tables.read().await.hints.get(&user).cloned())
  }

  async fn latest_content(&self, topic: &str, scope: Scope) -> Result<Option<LessonContent>> {
    self.check()?;
    let t = self.tables.read().await;
    Ok(t.contents.iter().rev().find(|c| c.topic == topic && c.owner == scope.owner()).cloned())
  }

  async fn insert_content(&self, topic: &str, scope: Scope, draft: &LessonDraft) -> Result<LessonContent> {
    self.check()?;
    let mut content = LessonContent::unpersisted(topic, scope, draft.clone());
    content.id = Some(Uuid::new_v4());
    self.tables.write().await.contents.push(content.clone());
    Ok(content)
  }

  async fn repair_content(&self, id: Uuid, draft: &LessonDraft) -> Result<()> {
    self.check()?;
    let mut t = self.tables.write().await;
    let row = t.contents.iter_mut().find(|c| c.id == Some(id))
      .ok_or_else(|| Error::Storage(format!("content {id} not found")))?;
    row.apply(draft.clone());
    Ok(())
  }

  async fn linked_content(&self, user: Uuid, topic: &str) -> Result<Option<LessonContent>> {
    self.check()?;
    let t = self.tables.read().await;
    let mut links: Vec<&ProgressRecord> =
      t.progress.iter().filter(|p| p.user == user && p.topic == topic).collect();
    links.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    Ok(links.into_iter().find_map(|p| {
      t.contents
        .iter()
        .find(|c| c.id == Some(p.content_id) && (c.owner.is_none() || c.owner == Some(user)))
        .cloned()
    }))
  }

  #[instrument(level = "debug", skip(self, drafts), fields(%topic, count = drafts.len()))]
  async fn replace_questions(
    &self,
    topic: &str,
    content_id: Option<Uuid>,
    drafts: &[QuestionDraft],
  ) -> Result<Vec<QuizQuestion>> {
    self.check()?;
    // Delete and insert under one write lock so concurrent regenerations of
    // the same topic cannot interleave.
    let mut t = self.tables.write().await;
    t.questions.retain(|q| q.topic != topic);
    let stored: Vec<QuizQuestion> = drafts
      .iter()
      .cloned()
      .map(|d| QuizQuestion::from_draft(topic, content_id, d))
      .collect();
    t.questions.extend(stored.iter().cloned());
    Ok(stored)
  }

  async fn questions_for_topic(&self, topic: &str, limit: usize) -> Result<Vec<QuizQuestion>> {
    self.check()?;
    let t = self.tables.read().await;
    Ok(t.questions.iter().filter(|q| q.topic == topic).take(limit).cloned().collect())
  }

  async fn insert_attempt(&self, attempt: &QuizAttempt) -> Result<()> {
    self.check()?;
    self.tables.write().await.attempts.push(attempt.clone());
    Ok(())
  }

  async fn upsert_progress(&self, record: &ProgressRecord, policy: UpsertPolicy) -> Result<()> {
    self.check()?;
    let mut t = self.tables.write().await;
    match policy {
      UpsertPolicy::OverwriteByTopic => {
        match t.progress.iter().position(|p| p.user == record.user && p.topic == record.topic) {
          Some(i) => t.progress[i].content_id = record.content_id,
          None => t.progress.push(record.clone()),
        }
      }
      UpsertPolicy::KeepByContent => {
        let exists = t.progress.iter().any(|p| p.user == record.user && p.content_id == record.content_id);
        if !exists {
          t.progress.push(record.clone());
        }
      }
    }
    Ok(())
  }

  async fn progress_for_user(&self, user: Uuid) -> Result<Vec<ProgressEntry>> {
    self.check()?;
    let t = self.tables.read().await;
    let mut out: Vec<ProgressEntry> = t
      .progress
      .iter()
      .filter(|p| p.user == user)
      .filter_map(|p| {
        t.contents.iter().find(|c| c.id == Some(p.content_id)).map(|c| ProgressEntry {
          topic: p.topic.clone(),
          title: c.title.clone(),
          completed_at: p.completed_at,
        })
      })
      .collect();
    out.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    Ok(out)
  }

  async fn attempts_for_user(&self, user: Uuid, limit: Option<usize>) -> Result<Vec<QuizAttempt>> {
    self.check()?;
    let t = self.tables.read().await;
    let mut out: Vec<QuizAttempt> = t.attempts.iter().filter(|a| a.user == user).cloned().collect();
    out.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    out.truncate(limit.unwrap_or(usize::MAX));
    Ok(out)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Duration;

  fn draft(title: &str) -> LessonDraft {
    LessonDraft { title: title.into(), body: "body".into(), difficulty: "Beginner".into() }
  }

  #[tokio::test]
  async fn latest_content_is_scoped_and_most_recent() {
    let store = MemoryStore::new();
    let user = Uuid::new_v4();
    store.insert_content("campus-life", Scope::Owner(user), &draft("mine-1")).await.unwrap();
    store.insert_content("campus-life", Scope::Owner(user), &draft("mine-2")).await.unwrap();
    store.insert_content("campus-life", Scope::Global, &draft("global")).await.unwrap();

    let mine = store.latest_content("campus-life", Scope::Owner(user)).await.unwrap().unwrap();
    assert_eq!(mine.title, "mine-2");
    let other = store.latest_content("campus-life", Scope::Owner(Uuid::new_v4())).await.unwrap();
    assert!(other.is_none());
    let global = store.latest_content("campus-life", Scope::Global).await.unwrap().unwrap();
    assert_eq!(global.title, "global");
  }

  #[tokio::test]
  async fn overwrite_policy_keeps_one_row_per_topic() {
    let store = MemoryStore::new();
    let user = Uuid::new_v4();
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let rec = |content_id| ProgressRecord { user, topic: "campus-life".into(), content_id, completed_at: Utc::now() };
    store.upsert_progress(&rec(a), UpsertPolicy::OverwriteByTopic).await.unwrap();
    store.upsert_progress(&rec(b), UpsertPolicy::OverwriteByTopic).await.unwrap();
    let rows = store.progress_rows().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].content_id, b);
  }

  #[tokio::test]
  async fn keep_policy_retains_first_completion() {
    let store = MemoryStore::new();
    let user = Uuid::new_v4();
    let content = Uuid::new_v4();
    let first = Utc::now() - Duration::hours(1);
    let rec = |at| ProgressRecord { user, topic: "banking".into(), content_id: content, completed_at: at };
    store.upsert_progress(&rec(first), UpsertPolicy::KeepByContent).await.unwrap();
    store.upsert_progress(&rec(Utc::now()), UpsertPolicy::KeepByContent).await.unwrap();
    let rows = store.progress_rows().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].completed_at, first);
  }

  #[tokio::test]
  async fn replace_questions_drops_previous_set() {
    let store = MemoryStore::new();
    let q = |text: &str| QuestionDraft {
      question: text.into(),
      options: vec!["aa".into(), "bb".into(), "cc".into(), "dd".into()],
      correct_answer: "aa".into(),
      ..Default::default()
    };
    store.replace_questions("laws", None, &[q("old one?"), q("old two?")]).await.unwrap();
    store.replace_questions("laws", None, &[q("new one?")]).await.unwrap();
    let qs = store.questions_for_topic("laws", 5).await.unwrap();
    assert_eq!(qs.len(), 1);
    assert_eq!(qs[0].question, "new one?");
  }

  #[tokio::test]
  async fn failing_store_reports_storage_errors() {
    let store = MemoryStore::new();
    store.set_failing(true);
    let err = store.latest_content("laws", Scope::Global).await.unwrap_err();
    assert!(matches!(err, Error::Storage(_)));
  }
}
