//! Error handling for skillsync.
//!
//! This module provides:
//! - [`EngineError`]: the main error enum for all engine operations
//! - [`Severity`] and [`Message`]: the classified user-visible message shape
//!   shared by validation findings, coercion notes, and failure reporting
//!
//! Local structural findings (incomplete ratings, distribution advisories)
//! are reported through `ValidationResult`, not as `Err` values; everything
//! here blocks the operation that raised it.

use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::taxonomy::Category;

/// Classification of a user-visible message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Recovered-with-notice, e.g. a rank coerced to the server ceiling.
    Info,
    /// Non-blocking advisory; requires explicit rater acknowledgment.
    Warning,
    /// Blocks submission.
    Error,
}

/// One user-visible message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub severity: Severity,
    pub text: String,
}

impl Message {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.severity, self.text)
    }
}

/// Main error type for engine operations.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("remote store rejected the rating batch ({} field errors)", .messages.len())]
    RemoteRejected { messages: Vec<String> },

    #[error("unknown proficiency level '{level_id}' for {category}")]
    UnknownLevel { level_id: String, category: Category },

    #[error("rank {rank} outside accepted range 1..={max}")]
    RankOutOfRange { rank: u8, max: u8 },

    #[error("change set entry '{0}' has no selected level")]
    IncompleteChange(String),

    #[error("a submission is already in flight for this draft")]
    SubmitInFlight,

    #[error("item not found: {0}")]
    ItemNotFound(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("missing required config: {0}")]
    MissingConfig(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// Render this failure as user-visible messages, always at `Error`
    /// severity. Remote field errors surface verbatim, one message each.
    #[must_use]
    pub fn user_messages(&self) -> Vec<Message> {
        match self {
            Self::RemoteRejected { messages } => {
                messages.iter().map(|m| Message::error(m.clone())).collect()
            }
            other => vec![Message::error(other.to_string())],
        }
    }

    /// True when re-sending the identical change set may succeed. The draft
    /// is untouched by these failures, so retry is a plain re-submit.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::RemoteRejected { .. } | Self::SubmitInFlight
        )
    }
}

/// Result type alias using EngineError.
pub type Result<T> = std::result::Result<T, EngineError>;
