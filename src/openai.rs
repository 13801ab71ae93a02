//! Minimal OpenAI-compatible chat-completions client.
//!
//! This is the only place that talks to the completion service, so it is also
//! the only place that classifies failures: HTTP 429 or a quota/rate-limit
//! error body becomes `Error::QuotaExceeded`, everything else on the wire is
//! `Error::Transport`. Calls log model, latency and response size, never the
//! API key or the response text.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::error::{Error, Result};
use crate::requester::CompletionService;
use crate::util::trunc_for_log;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Lowercased fragments that mark a provider error as a quota condition.
const QUOTA_MARKERS: &[&str] = &["quota", "rate limit", "rate_limit", "resource_exhausted", "429"];

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
  pub timeout_secs: u64,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok()?;
    let base_url = std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
    let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
    let timeout_secs = std::env::var("OPENAI_TIMEOUT_SECS")
      .ok()
      .and_then(|v| v.parse::<u64>().ok())
      .unwrap_or(DEFAULT_TIMEOUT_SECS);
    Self::new(api_key, base_url, model, timeout_secs).ok()
  }

  pub fn new(
    api_key: impl Into<String>,
    base_url: impl Into<String>,
    model: impl Into<String>,
    timeout_secs: u64,
  ) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(timeout_secs))
      .build()
      .map_err(|e| Error::Transport(format!("failed to build HTTP client: {e}")))?;
    Ok(Self {
      client,
      api_key: api_key.into(),
      base_url: base_url.into().trim_end_matches('/').to_string(),
      model: model.into(),
      timeout_secs,
    })
  }

  fn classify_send_error(&self, e: reqwest::Error) -> Error {
    if e.is_timeout() {
      Error::Transport(format!("request timed out after {}s", self.timeout_secs))
    } else {
      Error::Transport(e.to_string())
    }
  }
}

#[async_trait]
impl CompletionService for OpenAI {
  #[instrument(level = "info", target = "completion", skip(self, system, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
  async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: prompt.into() },
      ],
      temperature: 0.7,
    };

    let start = Instant::now();
    let res = self.client.post(&url)
      .header(USER_AGENT, "campus-guide-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await
      .map_err(|e| self.classify_send_error(e))?;

    let status = res.status();
    if !status.is_success() {
      let body = res.text().await.unwrap_or_default();
      let msg = extract_openai_error(&body).unwrap_or(body);
      let err = classify_status(status, &msg);
      warn!(target: "completion", %status, kind = err.kind(), body = %trunc_for_log(&msg, 200), "Completion request rejected");
      return Err(err);
    }

    let body: ChatCompletionResponse = res.json().await
      .map_err(|e| Error::Transport(format!("malformed completion envelope: {e}")))?;
    if let Some(usage) = &body.usage {
      info!(target: "completion", prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    let text = body.choices.into_iter().next()
      .and_then(|c| c.message.content)
      .unwrap_or_default();

    info!(target: "completion", elapsed = ?start.elapsed(), response_len = text.len(), "Completion received");
    if text.trim().is_empty() {
      return Err(Error::Parse("empty completion".into()));
    }
    Ok(text)
  }
}

/// Map a non-success status and its error message to an error kind.
fn classify_status(status: StatusCode, msg: &str) -> Error {
  let lower = msg.to_lowercase();
  if status == StatusCode::TOO_MANY_REQUESTS || QUOTA_MARKERS.iter().any(|m| lower.contains(m)) {
    Error::QuotaExceeded(format!("HTTP {}: {}", status.as_u16(), msg))
  } else {
    Error::Transport(format!("HTTP {}: {}", status.as_u16(), msg))
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from an OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}
