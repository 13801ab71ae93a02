//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! Behavior:
//! - LOG_LEVEL controls the filter (e.g. "debug" or detailed directives like
//!   "info,content=debug,quiz=debug,completion=info,tower_http=info").
//! - LOG_FORMAT selects "pretty" (default) or "json" structured logs.
//!
//! Targets used across the crate: `content`, `quiz`, `scoring`, `progress`,
//! `completion` and `campus_guide`. Each fallback tier logs under its target
//! so a single filter shows which tier served a request.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str =
    "info,campus_guide=debug,content=debug,quiz=debug,scoring=debug,progress=debug,completion=info,tower_http=info,axum=info";

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // try_init: integration tests may install a subscriber more than once.
    let _ = match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().try_init(),
        _ => builder.try_init(),
    };
}
