//! skillsync: the skill proficiency rating and synchronization engine.
//!
//! A rater walks a jobrole's Skill/Knowledge/Ability/Behaviour/Attitude
//! ("KAAB") taxonomy, assigns proficiency levels into a local draft,
//! validates the result against business rules, and reconciles it with the
//! remote store through one batched write. The draft survives reloads via
//! a durable cache scoped per (rater, jobrole); the baseline only moves on
//! a confirmed successful commit.

pub mod cache;
pub mod config;
pub mod draft;
pub mod error;
pub mod events;
pub mod session;
pub mod sync;
pub mod taxonomy;
pub mod traversal;
pub mod validation;

pub use error::{EngineError, Message, Result, Severity};

/// Package version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
