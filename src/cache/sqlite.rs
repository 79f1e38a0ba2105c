//! SQLite draft cache.

use std::fmt;
use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{EngineError, Result};

use super::{DraftCache, DraftKey, PersistedDraft};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS rating_drafts (
    rater_id   TEXT NOT NULL,
    jobrole_id TEXT NOT NULL,
    payload    TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (rater_id, jobrole_id)
)";

pub struct SqliteDraftCache {
    conn: Connection,
}

impl fmt::Debug for SqliteDraftCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteDraftCache").finish_non_exhaustive()
    }
}

impl SqliteDraftCache {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|err| EngineError::Cache(format!("create draft cache dir: {err}")))?;
        }
        let conn = Connection::open(path)?;
        conn.execute(SCHEMA, [])?;
        Ok(Self { conn })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute(SCHEMA, [])?;
        Ok(Self { conn })
    }
}

impl DraftCache for SqliteDraftCache {
    fn load(&self, key: &DraftKey) -> Result<Option<PersistedDraft>> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM rating_drafts WHERE rater_id = ?1 AND jobrole_id = ?2",
                params![key.rater_id, key.jobrole_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(payload.and_then(|raw| serde_json::from_str(&raw).ok()))
    }

    fn store(&self, key: &DraftKey, draft: &PersistedDraft) -> Result<()> {
        let payload = serde_json::to_string(draft)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO rating_drafts (rater_id, jobrole_id, payload, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                key.rater_id,
                key.jobrole_id,
                payload,
                chrono::Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    fn clear(&self, key: &DraftKey) -> Result<()> {
        self.conn.execute(
            "DELETE FROM rating_drafts WHERE rater_id = ?1 AND jobrole_id = ?2",
            params![key.rater_id, key.jobrole_id],
        )?;
        Ok(())
    }
}
