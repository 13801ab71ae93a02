//! Quiz generation and the structural validator.
//!
//! A quiz is either entirely model-generated or entirely taken from the
//! catalog: if fewer than `QUIZ_SIZE` generated candidates survive
//! validation, the generated set is discarded as a whole.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::catalog;
use crate::domain::{QuestionDraft, QuizQuestion, QUIZ_SIZE};
use crate::error::{Error, Rejection, Result};
use crate::requester::{QuizGrounding, Requester};
use crate::store::Store;

const QUESTION_CHARS: std::ops::RangeInclusive<usize> = 10..=300;
const OPTION_CHARS: std::ops::RangeInclusive<usize> = 2..=200;
const OPTION_COUNT: usize = 4;

/// Answers that are not an independently verifiable fact.
const META_ANSWERS: &[&str] = &[
  "all of the above",
  "none of the above",
  "both a and b",
  "all of these",
  "none of these",
];

static LETTER_PREFIX: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[a-dA-D][.)]\s*").expect("letter prefix pattern is valid"));

fn normalize(s: &str) -> String {
  s.trim().to_lowercase()
}

fn without_letter(s: &str) -> String {
  normalize(&LETTER_PREFIX.replace(s.trim(), ""))
}

/// Check one candidate. On success the returned draft's `correct_answer` is
/// exactly the text of one of its options; validating it again is a no-op.
pub fn validate_question(mut q: QuestionDraft) -> std::result::Result<QuestionDraft, Rejection> {
  let question_len = q.question.chars().count();
  if !QUESTION_CHARS.contains(&question_len) {
    return Err(Rejection::QuestionLength(question_len));
  }

  if q.options.len() != OPTION_COUNT {
    return Err(Rejection::OptionCount(q.options.len()));
  }
  let distinct: HashSet<String> = q.options.iter().map(|o| normalize(o)).collect();
  if distinct.len() != OPTION_COUNT {
    return Err(Rejection::DuplicateOptions);
  }
  if let Some(len) = q.options.iter().map(|o| o.chars().count()).find(|len| !OPTION_CHARS.contains(len)) {
    return Err(Rejection::OptionLength(len));
  }

  let answer = normalize(&q.correct_answer);
  let matched = match q.options.iter().find(|o| normalize(o) == answer) {
    Some(option) => option.clone(),
    None => {
      // Models often answer "B) Paris" against options "Paris" (or the reverse).
      let bare = without_letter(&q.correct_answer);
      if bare.is_empty() {
        return Err(Rejection::AnswerNotInOptions);
      }
      q.options
        .iter()
        .find(|o| without_letter(o) == bare)
        .cloned()
        .ok_or(Rejection::AnswerNotInOptions)?
    }
  };
  q.correct_answer = matched;

  let answer = normalize(&q.correct_answer);
  if let Some(&phrase) = META_ANSWERS.iter().find(|p| answer.contains(**p)) {
    return Err(Rejection::MetaAnswer(phrase));
  }
  Ok(q)
}

/// Where a quiz's questions came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuizSource {
  Generated,
  Catalog,
}

impl QuizSource {
  pub fn as_str(&self) -> &'static str {
    match self {
      QuizSource::Generated => "generated",
      QuizSource::Catalog => "catalog",
    }
  }
}

#[derive(Clone, Debug)]
pub struct QuizSet {
  pub questions: Vec<QuizQuestion>,
  pub source: QuizSource,
  /// False when the store rejected the replacement set.
  pub persisted: bool,
}

/// Generate, validate and store a fresh quiz for `topic`, replacing the
/// topic's previous set. Never fails: generation problems fall back to the
/// catalog and a store failure returns the set unpersisted.
/// Validator verdict lifted into the crate error so discards log with their kind.
fn screen(candidate: QuestionDraft) -> Result<QuestionDraft> {
  validate_question(candidate).map_err(Error::from)
}

#[instrument(level = "info", skip(store, requester), fields(%topic, %user, has_hint = hint.is_some()))]
pub async fn generate_quiz(
  store: &dyn Store,
  requester: &Requester<'_>,
  topic: &str,
  user: Uuid,
  hint: Option<&str>,
) -> QuizSet {
  let linked = match store.linked_content(user, topic).await {
    Ok(c) => c,
    Err(e) => {
      warn!(target: "quiz", op = "LEARNING_PROGRESS_LOOKUP", %topic, %user, kind = e.kind(), error = %e, "Progress lookup failed; using general prompt");
      None
    }
  };
  let grounding = match &linked {
    Some(c) => QuizGrounding::Content(&c.body),
    None => QuizGrounding::General,
  };

  let candidates = match requester.questions(topic, grounding, hint).await {
    Ok(c) => c,
    Err(e) => {
      warn!(target: "quiz", op = "QUESTION_GENERATION", %topic, %user, kind = e.kind(), error = %e, "Question generation failed");
      Vec::new()
    }
  };
  let offered = candidates.len();
  let valid: Vec<QuestionDraft> = candidates
    .into_iter()
    .filter_map(|c| {
      screen(c)
        .inspect_err(|e| debug!(target: "quiz", %topic, kind = e.kind(), error = %e, "Discarding question candidate"))
        .ok()
    })
    .collect();

  let (mut chosen, source) = if valid.len() >= QUIZ_SIZE {
    (valid, QuizSource::Generated)
  } else {
    info!(target: "quiz", %topic, offered, valid = valid.len(), need = QUIZ_SIZE, "Too few valid questions; using catalog set");
    (catalog::fallback_questions(topic), QuizSource::Catalog)
  };
  chosen.truncate(QUIZ_SIZE);

  let content_id = linked.as_ref().and_then(|c| c.id);
  match store.replace_questions(topic, content_id, &chosen).await {
    Ok(questions) => {
      info!(target: "quiz", %topic, source = source.as_str(), count = questions.len(), ?content_id, "Quiz stored");
      QuizSet { questions, source, persisted: true }
    }
    Err(e) => {
      warn!(target: "quiz", op = "QUIZ_STORAGE", %topic, %user, kind = e.kind(), error = %e, "Storing quiz failed; returning it unpersisted");
      let questions = chosen.into_iter().map(|d| QuizQuestion::from_draft(topic, content_id, d)).collect();
      QuizSet { questions, source, persisted: false }
    }
  }
}
