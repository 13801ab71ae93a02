//! Generative content requester: compiles prompts for lessons and quizzes,
//! sends them to the completion service and parses the replies into typed
//! drafts.
//!
//! Parsing is a tagged result: a reply either becomes a draft or an
//! `Error::Parse`. Transport and quota failures pass through untouched from
//! the completion service, which is the only component that assigns them.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::config::Prompts;
use crate::domain::{LessonDraft, QuestionDraft, DEFAULT_DIFFICULTY};
use crate::error::{Error, Result};
use crate::topics;
use crate::util::{fill_template, trunc_for_log};

const GROUNDED_EXPLANATION: &str = "This is the correct answer based on the learning content.";
const GENERAL_EXPLANATION: &str = "This is the correct answer for this topic.";

static TITLE_FIELD: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r#""title":\s*"([^"]+)""#).expect("title pattern is valid"));
static CONTENT_FIELD: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r#""content":\s*"([^"]+)""#).expect("content pattern is valid"));

/// Black-box text completion: a prompt goes in, text or a classified error
/// comes out.
#[async_trait]
pub trait CompletionService: Send + Sync {
  async fn complete(&self, system: &str, prompt: &str) -> Result<String>;
}

/// Stand-in used when no completion backend is configured; every call fails
/// as a transport error so requests go straight to the fallback tiers.
pub struct Unconfigured;

#[async_trait]
impl CompletionService for Unconfigured {
  async fn complete(&self, _system: &str, _prompt: &str) -> Result<String> {
    Err(Error::Transport("completion service not configured (OPENAI_API_KEY unset)".into()))
  }
}

/// What a quiz prompt is anchored on.
#[derive(Clone, Copy, Debug)]
pub enum QuizGrounding<'a> {
  /// Body text of a lesson the learner has already seen.
  Content(&'a str),
  /// General knowledge about the topic.
  General,
}

pub fn lesson_prompt(prompts: &Prompts, topic: &str, hint: Option<&str>) -> String {
  let subject = match hint {
    Some(h) => format!("{} at {}", topics::lesson_subject(topic), h),
    None => topics::lesson_subject(topic).to_string(),
  };
  let mut prompt = fill_template(&prompts.lesson, &[("subject", &subject)]);
  if let Some(h) = hint {
    prompt.push_str(&fill_template(&prompts.lesson_personal, &[("hint", h)]));
  }
  prompt.push_str(&prompts.lesson_format);
  prompt
}

pub fn quiz_prompt(prompts: &Prompts, topic: &str, grounding: QuizGrounding<'_>, hint: Option<&str>) -> String {
  let mut prompt = match grounding {
    QuizGrounding::Content(body) => fill_template(&prompts.quiz_from_content, &[("content", body)]),
    QuizGrounding::General => {
      let subject = match hint {
        Some(h) => format!("{} at {}", topics::quiz_subject(topic), h),
        None => topics::quiz_subject(topic).to_string(),
      };
      fill_template(&prompts.quiz_general, &[("subject", &subject)])
    }
  };
  if let Some(h) = hint {
    prompt.push_str(&fill_template(&prompts.quiz_personal, &[("hint", h)]));
  }
  prompt.push_str(&prompts.quiz_format);
  prompt
}

/// Remove a surrounding ```json / ``` fence, if any.
pub fn strip_fences(text: &str) -> &str {
  let t = text.trim();
  let Some(rest) = t.strip_prefix("```") else {
    return t;
  };
  let rest = rest.strip_prefix("json").unwrap_or(rest);
  rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[derive(Deserialize)]
struct RawLesson {
  #[serde(default)] title: Option<String>,
  #[serde(default)] content: Option<String>,
  #[serde(default)] difficulty: Option<String>,
}

/// Parse a lesson reply: strict JSON first, then a field-by-field regex
/// extraction from the raw text.
pub fn parse_lesson(text: &str) -> Result<LessonDraft> {
  let strict = serde_json::from_str::<RawLesson>(strip_fences(text))
    .map_err(|e| e.to_string())
    .and_then(|raw| match (raw.title, raw.content) {
      (Some(title), Some(body)) if !title.trim().is_empty() && !body.trim().is_empty() => Ok(LessonDraft {
        title,
        body,
        difficulty: raw.difficulty.filter(|d| !d.trim().is_empty()).unwrap_or_else(|| DEFAULT_DIFFICULTY.into()),
      }),
      _ => Err("missing title or content".to_string()),
    });

  let reason = match strict {
    Ok(draft) => return Ok(draft),
    Err(reason) => reason,
  };
  debug!(target: "content", %reason, "Strict lesson parse failed; trying field extraction");

  let title = TITLE_FIELD.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str());
  let body = CONTENT_FIELD.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str());
  match (title, body) {
    (Some(title), Some(body)) => Ok(LessonDraft {
      title: title.to_string(),
      body: body.replace("\\n", "\n").replace("\\\"", "\""),
      difficulty: DEFAULT_DIFFICULTY.into(),
    }),
    _ => Err(Error::Parse(format!("no lesson in model output ({reason})"))),
  }
}

/// Parse a quiz reply into candidate questions. Elements that do not even
/// deserialize are dropped here; shape rules are left to the validator.
pub fn parse_questions(text: &str, default_explanation: &str) -> Result<Vec<QuestionDraft>> {
  let value: serde_json::Value = serde_json::from_str(strip_fences(text))
    .map_err(|e| Error::Parse(format!("quiz reply is not JSON: {e}")))?;
  let items = value
    .get("questions")
    .and_then(|q| q.as_array())
    .ok_or_else(|| Error::Parse("questions array not found".into()))?;

  let mut out = Vec::with_capacity(items.len());
  for item in items {
    match serde_json::from_value::<QuestionDraft>(item.clone()) {
      Ok(mut q) => {
        if q.explanation.as_deref().map_or(true, |e| e.trim().is_empty()) {
          q.explanation = Some(default_explanation.to_string());
        }
        if q.difficulty.is_none() {
          q.difficulty = Some(DEFAULT_DIFFICULTY.to_string());
        }
        out.push(q);
      }
      Err(e) => debug!(target: "quiz", error = %e, "Dropping undecodable question candidate"),
    }
  }
  Ok(out)
}

/// Stateless front for the completion service with the prompts it uses.
pub struct Requester<'a> {
  completion: &'a dyn CompletionService,
  prompts: &'a Prompts,
}

impl<'a> Requester<'a> {
  pub fn new(completion: &'a dyn CompletionService, prompts: &'a Prompts) -> Self {
    Self { completion, prompts }
  }

  #[instrument(level = "info", skip(self), fields(%topic, has_hint = hint.is_some()))]
  pub async fn lesson(&self, topic: &str, hint: Option<&str>) -> Result<LessonDraft> {
    let prompt = lesson_prompt(self.prompts, topic, hint);
    let text = self.completion.complete(&self.prompts.system, &prompt).await?;
    parse_lesson(&text).inspect_err(|e| {
      warn!(target: "content", op = "CONTENT_PARSING", %topic, kind = e.kind(), response = %trunc_for_log(&text, 200), "Lesson reply unusable");
    })
  }

  #[instrument(level = "info", skip(self, grounding), fields(%topic, grounded = matches!(grounding, QuizGrounding::Content(_))))]
  pub async fn questions(
    &self,
    topic: &str,
    grounding: QuizGrounding<'_>,
    hint: Option<&str>,
  ) -> Result<Vec<QuestionDraft>> {
    let prompt = quiz_prompt(self.prompts, topic, grounding, hint);
    let text = self.completion.complete(&self.prompts.system, &prompt).await?;
    let default_explanation = match grounding {
      QuizGrounding::Content(_) => GROUNDED_EXPLANATION,
      QuizGrounding::General => GENERAL_EXPLANATION,
    };
    parse_questions(&text, default_explanation).inspect_err(|e| {
      warn!(target: "quiz", op = "QUESTIONS_PARSING", %topic, kind = e.kind(), response = %trunc_for_log(&text, 200), "Quiz reply unusable");
    })
  }
}

#[cfg(any(test, feature = "test-util"))]
pub mod testing {
  //! Scripted completion double shared by unit and integration tests.

  use std::collections::VecDeque;
  use std::sync::Mutex;

  use super::*;

  /// Replays queued replies in order; once drained, every call fails.
  #[derive(Default)]
  pub struct Scripted {
    replies: Mutex<VecDeque<Result<String>>>,
    pub prompts: Mutex<Vec<String>>,
  }

  impl Scripted {
    pub fn new(replies: Vec<Result<String>>) -> Self {
      Self { replies: Mutex::new(replies.into()), prompts: Mutex::new(Vec::new()) }
    }

    pub fn failing() -> Self {
      Self::default()
    }

    pub fn last_prompt(&self) -> Option<String> {
      self.prompts.lock().unwrap().last().cloned()
    }
  }

  #[async_trait]
  impl CompletionService for Scripted {
    async fn complete(&self, _system: &str, prompt: &str) -> Result<String> {
      self.prompts.lock().unwrap().push(prompt.to_string());
      self.replies
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(Error::Transport("script exhausted".into())))
    }
  }
}
