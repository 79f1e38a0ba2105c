//! JSON-file draft cache, one file per (rater, jobrole) scope.

use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::error::{EngineError, Result};

use super::{DraftCache, DraftKey, PersistedDraft};

pub struct JsonFileDraftCache {
    dir: PathBuf,
}

impl JsonFileDraftCache {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &DraftKey) -> PathBuf {
        self.dir.join(format!("draft-{}.json", key.storage_token()))
    }
}

impl DraftCache for JsonFileDraftCache {
    fn load(&self, key: &DraftKey) -> Result<Option<PersistedDraft>> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)
            .map_err(|err| EngineError::Cache(format!("read draft {}: {err}", path.display())))?;
        match serde_json::from_str(&contents) {
            Ok(draft) => Ok(Some(draft)),
            Err(err) => {
                debug!(path = %path.display(), error = %err, "corrupt draft cache entry ignored");
                Ok(None)
            }
        }
    }

    fn store(&self, key: &DraftKey, draft: &PersistedDraft) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|err| EngineError::Cache(format!("create draft cache dir: {err}")))?;
        let path = self.path(key);
        let rendered = serde_json::to_string_pretty(draft)?;
        fs::write(&path, rendered)
            .map_err(|err| EngineError::Cache(format!("write draft {}: {err}", path.display())))?;
        Ok(())
    }

    fn clear(&self, key: &DraftKey) -> Result<()> {
        let path = self.path(key);
        if path.exists() {
            fs::remove_file(&path).map_err(|err| {
                EngineError::Cache(format!("clear draft {}: {err}", path.display()))
            })?;
        }
        Ok(())
    }
}
