//! Content acquisition: fresh generation, then stored content, then the
//! catalog. The first tier that yields a lesson wins; the catalog tier cannot
//! fail, so a lesson always comes out.

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::catalog;
use crate::domain::{LessonContent, Scope};
use crate::error::Result;
use crate::progress;
use crate::requester::Requester;
use crate::store::Store;

/// Where the returned lesson came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentSource {
  Generated,
  /// Generated, but the insert failed; the lesson has no id.
  GeneratedUnpersisted,
  Stored,
  /// Stored placeholder replaced by the catalog entry under the same id.
  StoredRepaired,
  Catalog,
}

impl ContentSource {
  pub fn as_str(&self) -> &'static str {
    match self {
      ContentSource::Generated => "generated",
      ContentSource::GeneratedUnpersisted => "generated_unpersisted",
      ContentSource::Stored => "stored",
      ContentSource::StoredRepaired => "stored_repaired",
      ContentSource::Catalog => "catalog",
    }
  }
}

#[derive(Clone, Debug)]
pub struct Acquired {
  pub content: LessonContent,
  pub source: ContentSource,
}

/// One lesson request, resolved by the caller: scope and hint are already
/// decided from the topic's personalizability.
#[derive(Clone, Copy, Debug)]
pub struct LessonRequest<'a> {
  pub topic: &'a str,
  pub user: Uuid,
  pub scope: Scope,
  pub hint: Option<&'a str>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tier {
  Generate,
  Stored,
}

impl Tier {
  fn as_str(&self) -> &'static str {
    match self {
      Tier::Generate => "generate",
      Tier::Stored => "stored",
    }
  }
}

/// Tried in order; the catalog follows as the last resort.
const TIERS: [Tier; 2] = [Tier::Generate, Tier::Stored];

pub struct ContentPipeline<'a> {
  store: &'a dyn Store,
  requester: Requester<'a>,
}

impl<'a> ContentPipeline<'a> {
  pub fn new(store: &'a dyn Store, requester: Requester<'a>) -> Self {
    Self { store, requester }
  }

  /// Return exactly one lesson for the request and record progress against
  /// it when it has an id. Never fails.
  #[instrument(level = "info", skip(self), fields(topic = %req.topic, user = %req.user, personal = req.scope.is_personal()))]
  pub async fn acquire(&self, req: LessonRequest<'_>) -> Acquired {
    // Read before generating: the stored row is only consulted if generation fails.
    let existing = match self.store.latest_content(req.topic, req.scope).await {
      Ok(c) => c,
      Err(e) => {
        warn!(target: "content", op = "DATABASE_QUERY", topic = %req.topic, user = %req.user, kind = e.kind(), error = %e, "Stored content lookup failed");
        None
      }
    };

    let mut acquired = None;
    for tier in TIERS {
      match self.attempt(tier, &req, existing.as_ref()).await {
        Ok(Some(a)) => {
          acquired = Some(a);
          break;
        }
        Ok(None) => debug!(target: "content", tier = tier.as_str(), topic = %req.topic, "Tier had nothing to offer"),
        Err(e) => {
          warn!(target: "content", tier = tier.as_str(), topic = %req.topic, user = %req.user, kind = e.kind(), error = %e, "Tier failed; falling through")
        }
      }
    }
    let acquired = acquired.unwrap_or_else(|| Acquired {
      content: LessonContent::unpersisted(req.topic, req.scope, catalog::fallback_lesson(req.topic)),
      source: ContentSource::Catalog,
    });

    info!(target: "content", topic = %req.topic, user = %req.user, source = acquired.source.as_str(), id = ?acquired.content.id, "Lesson acquired");

    if let Some(id) = acquired.content.id {
      progress::record_completion(self.store, req.user, req.topic, id, req.scope).await;
    }
    acquired
  }

  async fn attempt(&self, tier: Tier, req: &LessonRequest<'_>, existing: Option<&LessonContent>) -> Result<Option<Acquired>> {
    match tier {
      Tier::Generate => self.generate(req).await.map(Some),
      Tier::Stored => Ok(match existing {
        Some(stored) => Some(self.reuse(req, stored.clone()).await),
        None => None,
      }),
    }
  }

  async fn generate(&self, req: &LessonRequest<'_>) -> Result<Acquired> {
    let draft = self.requester.lesson(req.topic, req.hint).await?;
    match self.store.insert_content(req.topic, req.scope, &draft).await {
      Ok(content) => Ok(Acquired { content, source: ContentSource::Generated }),
      Err(e) => {
        warn!(target: "content", op = "DATABASE_INSERT", topic = %req.topic, user = %req.user, kind = e.kind(), error = %e, "Generated lesson not stored; returning it unpersisted");
        Ok(Acquired {
          content: LessonContent::unpersisted(req.topic, req.scope, draft),
          source: ContentSource::GeneratedUnpersisted,
        })
      }
    }
  }

  /// Return a stored lesson, swapping a stale placeholder body for the
  /// catalog entry first.
  async fn reuse(&self, req: &LessonRequest<'_>, mut stored: LessonContent) -> Acquired {
    if !stored.is_stale() {
      return Acquired { content: stored, source: ContentSource::Stored };
    }

    let replacement = catalog::fallback_lesson(req.topic);
    if let Some(id) = stored.id {
      match self.store.repair_content(id, &replacement).await {
        Ok(()) => info!(target: "content", topic = %req.topic, %id, "Repaired stale lesson"),
        Err(e) => {
          warn!(target: "content", op = "STALE_REPAIR", topic = %req.topic, %id, kind = e.kind(), error = %e, "Stale lesson repaired in memory only")
        }
      }
    }
    stored.apply(replacement);
    Acquired { content: stored, source: ContentSource::StoredRepaired }
  }
}
