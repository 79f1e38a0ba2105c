//! Engine configuration.
//!
//! Precedence: explicit file (argument or `SKILLSYNC_CONFIG`) > global
//! config > project file > built-in defaults, with `SKILLSYNC_*` env
//! overrides applied last.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::validation::RuleThresholds;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub validation: RuleThresholds,
}

/// Remote endpoints for the taxonomy source and the bulk submit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub base_url: String,
    pub taxonomy_path: String,
    pub levels_path: String,
    pub submit_path: String,
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            taxonomy_path: "/jobrole/taxonomy".to_string(),
            levels_path: "/proficiency/levels".to_string(),
            submit_path: "/ratings/bulk".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Server-side constraints. `max_rank` is only the fallback ceiling; a
/// server-declared value is authoritative when one is available.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub max_rank: u8,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { max_rank: 5 }
    }
}

/// Draft cache backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// One of `memory`, `json`, `sqlite`.
    pub backend: String,
    /// Cache directory; defaults to the platform-local data dir.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: "json".to_string(),
            dir: None,
        }
    }
}

impl CacheConfig {
    pub fn resolve_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.dir {
            return Ok(dir.clone());
        }
        dirs::data_local_dir()
            .map(|d| d.join("skillsync"))
            .ok_or_else(|| {
                EngineError::MissingConfig("cache.dir (no local data directory found)".to_string())
            })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    remote: Option<RemotePatch>,
    server: Option<ServerPatch>,
    cache: Option<CachePatch>,
    validation: Option<ValidationPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RemotePatch {
    base_url: Option<String>,
    taxonomy_path: Option<String>,
    levels_path: Option<String>,
    submit_path: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ServerPatch {
    max_rank: Option<u8>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CachePatch {
    backend: Option<String>,
    dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ValidationPatch {
    cluster_ratio: Option<f32>,
    cluster_min_rated: Option<usize>,
}

impl EngineConfig {
    pub fn load(explicit_path: Option<&Path>, project_root: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("SKILLSYNC_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            if let Some(patch) = Self::load_patch(&path)? {
                config.merge_patch(patch);
            }
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_patch(&project_root.join("skillsync.toml"))? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides();
        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(base) = dirs::config_dir() else {
            return Ok(None);
        };
        Self::load_patch(&base.join("skillsync/config.toml"))
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|err| EngineError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| EngineError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(remote) = patch.remote {
            if let Some(v) = remote.base_url {
                self.remote.base_url = v;
            }
            if let Some(v) = remote.taxonomy_path {
                self.remote.taxonomy_path = v;
            }
            if let Some(v) = remote.levels_path {
                self.remote.levels_path = v;
            }
            if let Some(v) = remote.submit_path {
                self.remote.submit_path = v;
            }
            if let Some(v) = remote.timeout_secs {
                self.remote.timeout_secs = v;
            }
        }
        if let Some(server) = patch.server {
            if let Some(v) = server.max_rank {
                self.server.max_rank = v;
            }
        }
        if let Some(cache) = patch.cache {
            if let Some(v) = cache.backend {
                self.cache.backend = v;
            }
            if let Some(v) = cache.dir {
                self.cache.dir = Some(v);
            }
        }
        if let Some(validation) = patch.validation {
            if let Some(v) = validation.cluster_ratio {
                self.validation.cluster_ratio = v;
            }
            if let Some(v) = validation.cluster_min_rated {
                self.validation.cluster_min_rated = v;
            }
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("SKILLSYNC_BASE_URL") {
            self.remote.base_url = url;
        }
        if let Some(rank) = env_parse::<u8>("SKILLSYNC_MAX_RANK") {
            self.server.max_rank = rank;
        }
        if let Ok(backend) = std::env::var("SKILLSYNC_CACHE_BACKEND") {
            self.cache.backend = backend;
        }
        if let Ok(dir) = std::env::var("SKILLSYNC_CACHE_DIR") {
            self.cache.dir = Some(PathBuf::from(dir));
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
