//! Grading a submitted answer sheet against the stored quiz for a topic.
//!
//! Answers are compared after trimming surrounding whitespace only; case
//! counts.

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::{QuizAttempt, QuizQuestion, QUIZ_SIZE};
use crate::error::{Error, Result};
use crate::progress;
use crate::store::Store;

#[derive(Clone, Debug, PartialEq)]
pub struct Verdict {
  pub question_id: Uuid,
  pub submitted: String,
  pub correct: String,
  pub is_correct: bool,
  pub explanation: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Graded {
  pub score: u32,
  pub total: u32,
  pub percentage: u32,
  pub verdicts: Vec<Verdict>,
}

/// `round(score / total * 100)`, halves rounded up, in integer arithmetic.
pub fn percentage(score: u32, total: u32) -> u32 {
  if total == 0 {
    return 0;
  }
  (200 * score + total) / (2 * total)
}

/// Pure grading step. `questions` must be non-empty.
pub fn grade(questions: &[QuizQuestion], answers: &[String]) -> Result<Graded> {
  if answers.len() != questions.len() {
    return Err(Error::CountMismatch { expected: questions.len(), received: answers.len() });
  }
  let verdicts: Vec<Verdict> = questions
    .iter()
    .zip(answers)
    .map(|(q, a)| {
      let submitted = a.trim().to_string();
      let correct = q.correct_answer.trim().to_string();
      Verdict {
        question_id: q.id,
        is_correct: submitted == correct,
        submitted,
        correct,
        explanation: q.explanation.clone(),
      }
    })
    .collect();
  let score = verdicts.iter().filter(|v| v.is_correct).count() as u32;
  let total = questions.len() as u32;
  Ok(Graded { score, total, percentage: percentage(score, total), verdicts })
}

/// Grade `answers` against the stored quiz for `topic` and record the
/// attempt. Store read failures propagate; the attempt write does not.
#[instrument(level = "info", skip(store, answers), fields(%topic, %user, received = answers.len()))]
pub async fn submit(store: &dyn Store, topic: &str, user: Uuid, answers: &[String]) -> Result<Graded> {
  let questions = store.questions_for_topic(topic, QUIZ_SIZE).await?;
  if questions.is_empty() {
    return Err(Error::NoQuiz { topic: topic.to_string() });
  }
  let graded = grade(&questions, answers)?;

  let attempt = QuizAttempt {
    user,
    topic: topic.to_string(),
    score: graded.score,
    total_questions: graded.total,
    answers: answers.to_vec(),
    completed_at: Utc::now(),
  };
  progress::record_attempt(store, &attempt).await;

  info!(target: "scoring", %topic, %user, score = graded.score, total = graded.total, percentage = graded.percentage, "Quiz graded");
  Ok(graded)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::QuestionDraft;
  use crate::store::MemoryStore;

  fn question(answer: &str) -> QuizQuestion {
    QuizQuestion::from_draft(
      "campus-life",
      None,
      QuestionDraft {
        question: format!("Which is right: {answer}?"),
        options: vec![answer.into(), "x1".into(), "x2".into(), "x3".into()],
        correct_answer: answer.into(),
        explanation: Some(format!("{answer} is right.")),
        difficulty: None,
      },
    )
  }

  fn sheet(answers: &[&str]) -> Vec<String> {
    answers.iter().map(|a| a.to_string()).collect()
  }

  #[test]
  fn case_is_not_forgiven_but_whitespace_is() {
    let qs: Vec<QuizQuestion> = ["Paris", "Join clubs", "12+ hours"].iter().map(|a| question(a)).collect();
    let g = grade(&qs, &sheet(&[" Paris", "join clubs", "12+ hours "])).unwrap();
    assert_eq!((g.score, g.total), (2, 3));
    assert!(g.verdicts[0].is_correct);
    assert!(!g.verdicts[1].is_correct);
    assert!(g.verdicts[2].is_correct);
    assert_eq!(g.verdicts[0].submitted, "Paris");
    assert_eq!(g.verdicts[1].correct, "Join clubs");
    assert_eq!(g.verdicts[1].explanation.as_deref(), Some("Join clubs is right."));
  }

  #[test]
  fn only_exact_trimmed_matches_score() {
    let qs: Vec<QuizQuestion> = ["Paris", "Join clubs", "12+ hours"].iter().map(|a| question(a)).collect();
    let g = grade(&qs, &sheet(&[" Paris", "join clubs", "12 hours"])).unwrap();
    assert_eq!((g.score, g.total, g.percentage), (1, 3, 33));
  }

  #[test]
  fn percentage_rounds_half_up() {
    assert_eq!(percentage(1, 3), 33);
    assert_eq!(percentage(2, 3), 67);
    assert_eq!(percentage(1, 8), 13);
    assert_eq!(percentage(5, 5), 100);
    assert_eq!(percentage(0, 5), 0);
    assert_eq!(percentage(0, 0), 0);
  }

  #[test]
  fn wrong_answer_count_is_a_mismatch() {
    let qs: Vec<QuizQuestion> = ["a1", "b1", "c1", "d1", "e1"].iter().map(|a| question(a)).collect();
    let err = grade(&qs, &sheet(&["a1", "b1", "c1", "d1"])).unwrap_err();
    assert_eq!(err.to_string(), "Expected 5 answers but received 4");
  }

  #[tokio::test]
  async fn submit_records_attempt_with_raw_answers() {
    let store = MemoryStore::new();
    let drafts: Vec<QuestionDraft> = ["one", "two", "three", "four", "five"]
      .iter()
      .map(|a| QuestionDraft {
        question: format!("Pick {a} please?"),
        options: vec![a.to_string(), "other a".into(), "other b".into(), "other c".into()],
        correct_answer: a.to_string(),
        ..Default::default()
      })
      .collect();
    store.replace_questions("laws", None, &drafts).await.unwrap();

    let user = Uuid::new_v4();
    let answers = sheet(&["one ", "two", "THREE", "four", "nope"]);
    let g = submit(&store, "laws", user, &answers).await.unwrap();
    assert_eq!((g.score, g.total, g.percentage), (3, 5, 60));

    let attempts = store.attempts_for_user(user, None).await.unwrap();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].answers, answers);
    assert_eq!(attempts[0].score, 3);
  }

  #[tokio::test]
  async fn submit_without_quiz_is_no_quiz() {
    let store = MemoryStore::new();
    let err = submit(&store, "laws", Uuid::new_v4(), &sheet(&["a"])).await.unwrap_err();
    assert!(matches!(err, Error::NoQuiz { .. }));
    assert!(err.is_user_correctable());
  }

  #[tokio::test]
  async fn mismatch_records_no_attempt() {
    let store = MemoryStore::new();
    let drafts = vec![QuestionDraft { question: "Only question?".into(), correct_answer: "aa".into(), ..Default::default() }; 5];
    store.replace_questions("laws", None, &drafts).await.unwrap();
    let user = Uuid::new_v4();
    let err = submit(&store, "laws", user, &sheet(&["aa"; 4])).await.unwrap_err();
    assert!(matches!(err, Error::CountMismatch { expected: 5, received: 4 }));
    assert!(store.attempts_for_user(user, None).await.unwrap().is_empty());
  }
}
