//! Error taxonomy for the acquisition, validation and grading paths.
//!
//! Kinds are assigned once, where the failure is first observed: the completion
//! client decides transport vs quota, the parsers decide parse, the store decides
//! storage. Callers branch on the variant, never on message text.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
  /// Network, timeout or non-quota HTTP failure talking to the completion service.
  #[error("completion transport failure: {0}")]
  Transport(String),

  /// The completion service rate-limited us or the quota is exhausted.
  #[error("completion quota exceeded: {0}")]
  QuotaExceeded(String),

  /// Model output was not in the expected shape, even after recovery.
  #[error("could not parse model output: {0}")]
  Parse(String),

  /// A generated question failed the structural checks.
  #[error("question rejected: {0}")]
  Validation(#[from] Rejection),

  #[error("storage failure: {0}")]
  Storage(String),

  #[error("Expected {expected} answers but received {received}")]
  CountMismatch { expected: usize, received: usize },

  #[error("No quiz questions found for this topic. Please try generating the quiz again.")]
  NoQuiz { topic: String },

  #[error("{0}")]
  InvalidRequest(String),
}

impl Error {
  /// Stable tag used in structured logs.
  pub fn kind(&self) -> &'static str {
    match self {
      Error::Transport(_) => "transport",
      Error::QuotaExceeded(_) => "quota_exceeded",
      Error::Parse(_) => "parse",
      Error::Validation(_) => "validation",
      Error::Storage(_) => "storage",
      Error::CountMismatch { .. } => "count_mismatch",
      Error::NoQuiz { .. } => "no_quiz",
      Error::InvalidRequest(_) => "invalid_request",
    }
  }

  /// Errors the learner can fix by changing the request.
  pub fn is_user_correctable(&self) -> bool {
    matches!(
      self,
      Error::CountMismatch { .. } | Error::NoQuiz { .. } | Error::InvalidRequest(_)
    )
  }
}

impl From<sqlx::Error> for Error {
  fn from(e: sqlx::Error) -> Self {
    Error::Storage(e.to_string())
  }
}

/// Why the structural validator discarded a candidate question.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Rejection {
  #[error("question text has {0} characters, expected 10..=300")]
  QuestionLength(usize),

  #[error("expected 4 options, got {0}")]
  OptionCount(usize),

  #[error("options are not distinct after normalization")]
  DuplicateOptions,

  #[error("option has {0} characters, expected 2..=200")]
  OptionLength(usize),

  #[error("correct answer matches no option")]
  AnswerNotInOptions,

  #[error("correct answer is a meta-answer ({0:?})")]
  MetaAnswer(&'static str),
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn count_mismatch_message_is_user_facing() {
    let e = Error::CountMismatch { expected: 5, received: 4 };
    assert_eq!(e.to_string(), "Expected 5 answers but received 4");
    assert!(e.is_user_correctable());
    assert_eq!(e.kind(), "count_mismatch");
  }

  #[test]
  fn acquisition_errors_are_not_user_correctable() {
    for e in [
      Error::Transport("timeout".into()),
      Error::QuotaExceeded("429".into()),
      Error::Parse("no json".into()),
      Error::Storage("down".into()),
      Error::Validation(Rejection::DuplicateOptions),
    ] {
      assert!(!e.is_user_correctable(), "{}", e.kind());
    }
  }
}
