//! Campus Guide · learning content and quiz backend.
//!
//! Lessons and quizzes are requested from a text-completion model and fall back,
//! tier by tier, to stored content and finally to a built-in catalog, so that a
//! learner is never shown a hard failure.

pub mod catalog;
pub mod config;
pub mod domain;
pub mod error;
pub mod logic;
pub mod openai;
pub mod pipeline;
pub mod progress;
pub mod protocol;
pub mod quiz;
pub mod requester;
pub mod routes;
pub mod scoring;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod topics;
pub mod util;

pub use error::{Error, Rejection, Result};
pub use state::AppState;
