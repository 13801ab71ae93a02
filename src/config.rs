//! Loading agent configuration (prompt templates + personalizable topics) from TOML.
//!
//! See `AgentConfig` and `Prompts` for the expected schema. Every field is
//! optional; missing ones keep their defaults.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
  pub prompts: Prompts,
  /// Topics whose lessons are personalized with the learner's context hint
  /// and therefore stored per user.
  pub personalizable_topics: Vec<String>,
}

impl Default for AgentConfig {
  fn default() -> Self {
    Self {
      prompts: Prompts::default(),
      personalizable_topics: vec!["campus-life".into(), "general-mannerisms".into()],
    }
  }
}

/// Prompt templates used by the requester. Placeholders are `{name}`.
///
/// The `*_personal` sections are appended only when a context hint is
/// available for a personalizable topic; `{hint}` is the hint itself.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub system: String,
  pub lesson: String,
  pub lesson_personal: String,
  pub lesson_format: String,
  pub quiz_from_content: String,
  pub quiz_general: String,
  pub quiz_personal: String,
  pub quiz_format: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      system: "You write accurate, practical learning material for international students. Respond ONLY with JSON.".into(),
      lesson: "Create comprehensive learning content for international students about: {subject}\n\n\
REQUIREMENTS:\n\
- Write 800-1200 words of educational content\n\
- Make it practical and actionable for international students\n\
- Include specific facts, procedures, and requirements\n\
- Use clear, simple language\n\
- Include real-world examples and scenarios\n\
- Cover common challenges and solutions".into(),
      lesson_personal: "\n\nINSTITUTION-SPECIFIC REQUIREMENTS:\n\
- Focus on norms and practices specific to {hint}\n\
- Mention campus-specific traditions, resources, organizations, and support services at {hint}".into(),
      lesson_format: "\n\nFORMAT: Return JSON with these exact keys:\n\
{\"title\": \"Clear, engaging title\", \"content\": \"Educational content (800-1200 words)\", \"difficulty\": \"Beginner\"}".into(),
      quiz_from_content: "Based on the following learning content, generate exactly 5 multiple-choice quiz questions.\n\n\
CONTENT TO BASE QUESTIONS ON:\n{content}\n\n\
REQUIREMENTS:\n\
1. Generate EXACTLY 5 questions\n\
2. Each question MUST have EXACTLY 4 answer options\n\
3. The correct answer MUST be one of the 4 options\n\
4. Questions must be directly based on information from the content".into(),
      quiz_general: "Generate exactly 5 multiple-choice quiz questions about \"{subject}\".\n\n\
REQUIREMENTS:\n\
1. Generate EXACTLY 5 questions\n\
2. Each question MUST have EXACTLY 4 answer options\n\
3. Questions should test practical knowledge that international students need\n\
4. Each correct answer must directly answer its question".into(),
      quiz_personal: "\n\nINSTITUTION-SPECIFIC REQUIREMENTS:\n\
- Focus on cultural aspects and practices specific to {hint}".into(),
      quiz_format: "\n\nFORMAT YOUR RESPONSE EXACTLY AS JSON:\n\
{\"questions\": [{\"question\": \"...?\", \"options\": [\"...\", \"...\", \"...\", \"...\"], \
\"correctAnswer\": \"exact text of the correct option\", \"explanation\": \"...\", \"difficulty\": \"Beginner\"}]}\n\n\
IMPORTANT:\n\
- correctAnswer must be the EXACT text of one of the options\n\
- Do NOT use \"All of the above\" or \"None of the above\" as options".into(),
    }
  }
}

/// Load `AgentConfig` from AGENT_CONFIG_PATH. Missing variable, IO or parse
/// errors all yield the defaults (errors are logged).
pub fn load_agent_config_from_env() -> AgentConfig {
  let Ok(path) = std::env::var("AGENT_CONFIG_PATH") else {
    return AgentConfig::default();
  };
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_agent_config(&s) {
      Ok(cfg) => {
        info!(target: "campus_guide", %path, topics = ?cfg.personalizable_topics, "Loaded agent config (TOML)");
        cfg
      }
      Err(e) => {
        error!(target: "campus_guide", %path, error = %e, "Failed to parse TOML config; using defaults");
        AgentConfig::default()
      }
    },
    Err(e) => {
      error!(target: "campus_guide", %path, error = %e, "Failed to read TOML config file; using defaults");
      AgentConfig::default()
    }
  }
}

pub fn parse_agent_config(s: &str) -> Result<AgentConfig, toml::de::Error> {
  toml::from_str::<AgentConfig>(s)
}
