//! Application state: the store, the completion service, prompts and the set
//! of personalizable topics.
//!
//! Startup degrades rather than fails: no DATABASE_URL (or an unreachable
//! database) gives an in-memory store, no OPENAI_API_KEY gives a completion
//! service that always fails, which sends every request down the fallback tiers.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::{load_agent_config_from_env, AgentConfig, Prompts};
use crate::domain::Scope;
use crate::openai::OpenAI;
use crate::requester::{CompletionService, Requester, Unconfigured};
use crate::store::{MemoryStore, PgStore, Store};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub completion: Arc<dyn CompletionService>,
    pub prompts: Prompts,
    pub personalizable: HashSet<String>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, completion: Arc<dyn CompletionService>, config: AgentConfig) -> Self {
        Self {
            store,
            completion,
            prompts: config.prompts,
            personalizable: config.personalizable_topics.into_iter().collect(),
        }
    }

    /// Build state from env: load config, connect the store, init OpenAI.
    #[instrument(level = "info", skip_all)]
    pub async fn from_env() -> Self {
        let config = load_agent_config_from_env();

        let store: Arc<dyn Store> = match std::env::var("DATABASE_URL") {
            Ok(url) => match connect_pg(&url).await {
                Ok(pg) => {
                    info!(target: "campus_guide", "Using Postgres store.");
                    Arc::new(pg)
                }
                Err(e) => {
                    warn!(target: "campus_guide", kind = e.kind(), error = %e, "Postgres unavailable; using in-memory store.");
                    Arc::new(MemoryStore::new())
                }
            },
            Err(_) => {
                warn!(target: "campus_guide", "DATABASE_URL not set; using in-memory store.");
                Arc::new(MemoryStore::new())
            }
        };

        let completion: Arc<dyn CompletionService> = match OpenAI::from_env() {
            Some(oa) => {
                info!(target: "campus_guide", base_url = %oa.base_url, model = %oa.model, timeout_secs = oa.timeout_secs, "OpenAI enabled.");
                Arc::new(oa)
            }
            None => {
                warn!(target: "campus_guide", "OpenAI disabled (no OPENAI_API_KEY). Serving stored and catalog content only.");
                Arc::new(Unconfigured)
            }
        };

        info!(target: "campus_guide", personalizable = ?config.personalizable_topics, "Agent config loaded.");
        Self::new(store, completion, config)
    }

    pub fn requester(&self) -> Requester<'_> {
        Requester::new(self.completion.as_ref(), &self.prompts)
    }

    pub fn is_personalizable(&self, topic: &str) -> bool {
        self.personalizable.contains(topic)
    }

    /// Personalizable topics are stored per learner; all others share one lesson.
    pub fn scope_for(&self, topic: &str, user: Uuid) -> Scope {
        if self.is_personalizable(topic) {
            Scope::Owner(user)
        } else {
            Scope::Global
        }
    }

    /// The learner's context hint, consulted only for personalizable topics.
    /// A failed lookup means no hint.
    pub async fn context_hint(&self, topic: &str, user: Uuid) -> Option<String> {
        if !self.is_personalizable(topic) {
            return None;
        }
        match self.store.user_context_hint(user).await {
            Ok(hint) => hint,
            Err(e) => {
                warn!(target: "content", op = "CONTEXT_HINT_LOOKUP", %topic, %user, kind = e.kind(), error = %e, "Context hint lookup failed; continuing without it");
                None
            }
        }
    }
}

async fn connect_pg(url: &str) -> crate::Result<PgStore> {
    let pg = PgStore::connect(url).await?;
    pg.ensure_schema().await?;
    Ok(pg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(store: Arc<MemoryStore>) -> AppState {
        AppState::new(store, Arc::new(Unconfigured), AgentConfig::default())
    }

    #[tokio::test]
    async fn hint_only_for_personalizable_topics() {
        let store = Arc::new(MemoryStore::new());
        let user = Uuid::new_v4();
        store.set_context_hint(user, "Example University").await;
        let s = state(store.clone());

        assert_eq!(s.context_hint("campus-life", user).await.as_deref(), Some("Example University"));
        assert_eq!(s.context_hint("banking", user).await, None);

        store.set_failing(true);
        assert_eq!(s.context_hint("campus-life", user).await, None);
    }

    #[test]
    fn scope_follows_personalizability() {
        let s = state(Arc::new(MemoryStore::new()));
        let user = Uuid::new_v4();
        assert_eq!(s.scope_for("general-mannerisms", user), Scope::Owner(user));
        assert_eq!(s.scope_for("visa-status", user), Scope::Global);
    }
}
