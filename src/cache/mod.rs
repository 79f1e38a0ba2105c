//! Durable draft cache: the persistence port scoped per (rater, jobrole).
//!
//! Write-through on mutate, clear on commit. The concrete medium is the
//! backend's business: in-memory for tests, a JSON file per scope as the
//! durable default, or SQLite. Implementations treat a corrupt payload as
//! absent rather than failing the session.

mod json;
mod sqlite;

pub use json::JsonFileDraftCache;
pub use sqlite::SqliteDraftCache;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::CacheConfig;
use crate::error::{EngineError, Result};
use crate::taxonomy::Category;

/// Scope of one draft: switching rater or jobrole starts a fresh draft.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DraftKey {
    pub rater_id: String,
    pub jobrole_id: String,
}

impl DraftKey {
    pub fn new(rater_id: impl Into<String>, jobrole_id: impl Into<String>) -> Self {
        Self {
            rater_id: rater_id.into(),
            jobrole_id: jobrole_id.into(),
        }
    }

    /// Filesystem- and primary-key-safe token for this scope.
    #[must_use]
    pub fn storage_token(&self) -> String {
        format!("{}_{}", sanitize(&self.rater_id), sanitize(&self.jobrole_id))
    }
}

impl fmt::Display for DraftKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.rater_id, self.jobrole_id)
    }
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Serialized draft payload: current selections plus the committed baseline
/// and, in detailed mode, the per-skill KAAB answer maps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedDraft {
    #[serde(default)]
    pub selections: Vec<PersistedSelection>,
    #[serde(default)]
    pub baseline: Vec<PersistedSelection>,
    #[serde(default)]
    pub answers: Vec<PersistedAnswerSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSelection {
    pub category: Category,
    pub item_id: String,
    #[serde(default)]
    pub level_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedAnswerSet {
    pub skill_id: String,
    #[serde(default)]
    pub answers: BTreeMap<String, bool>,
}

/// Port for the durable draft cache.
pub trait DraftCache {
    fn load(&self, key: &DraftKey) -> Result<Option<PersistedDraft>>;
    fn store(&self, key: &DraftKey, draft: &PersistedDraft) -> Result<()>;
    fn clear(&self, key: &DraftKey) -> Result<()>;
}

/// In-memory cache for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryDraftCache {
    entries: Mutex<HashMap<String, PersistedDraft>>,
}

impl MemoryDraftCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DraftCache for MemoryDraftCache {
    fn load(&self, key: &DraftKey) -> Result<Option<PersistedDraft>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| EngineError::Cache("memory cache poisoned".to_string()))?;
        Ok(entries.get(&key.storage_token()).cloned())
    }

    fn store(&self, key: &DraftKey, draft: &PersistedDraft) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| EngineError::Cache("memory cache poisoned".to_string()))?;
        entries.insert(key.storage_token(), draft.clone());
        Ok(())
    }

    fn clear(&self, key: &DraftKey) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| EngineError::Cache("memory cache poisoned".to_string()))?;
        entries.remove(&key.storage_token());
        Ok(())
    }
}

/// Build the backend selected by config.
pub fn from_config(config: &CacheConfig) -> Result<Box<dyn DraftCache>> {
    match config.backend.as_str() {
        "memory" => Ok(Box::new(MemoryDraftCache::new())),
        "json" => Ok(Box::new(JsonFileDraftCache::new(config.resolve_dir()?))),
        "sqlite" => Ok(Box::new(SqliteDraftCache::open(
            config.resolve_dir()?.join("drafts.db"),
        )?)),
        other => Err(EngineError::Config(format!(
            "unknown cache backend '{other}'"
        ))),
    }
}
