//! Blocking HTTP adapter for the taxonomy and level-catalog endpoints.
//!
//! The taxonomy endpoint returns one payload with all five category lists;
//! level catalogs come from one request per category. Bare-label entries
//! are normalized into full records at this boundary so the rest of the
//! engine only ever sees structured items.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use crate::config::RemoteConfig;
use crate::error::{EngineError, Result};

use super::{Category, LevelCatalog, ProficiencyLevel, RatableItem, Taxonomy, extract_rank};

/// Key identifying a jobrole taxonomy request.
#[derive(Debug, Clone)]
pub struct TaxonomyRequest {
    pub jobrole_id: String,
    pub jobrole_title: String,
    pub sub_institute_id: String,
}

/// One taxonomy entry on the wire: either a full record or a bare label.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum WireEntry {
    Full {
        id: String,
        title: String,
        #[serde(default)]
        description: String,
        /// Per-skill KAAB references; absent for sub-attribute entries.
        #[serde(default)]
        kaab_refs: BTreeMap<Category, Vec<String>>,
    },
    Label(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WireTaxonomy {
    #[serde(default)]
    skill: Vec<WireEntry>,
    #[serde(default)]
    knowledge: Vec<WireEntry>,
    #[serde(default)]
    ability: Vec<WireEntry>,
    #[serde(default)]
    behaviour: Vec<WireEntry>,
    #[serde(default)]
    attitude: Vec<WireEntry>,
}

/// One proficiency-level row on the wire. The structured `rank` field is
/// preferred; the display strings feed the regex fallback only.
#[derive(Debug, Clone, Deserialize)]
struct WireLevel {
    #[serde(default)]
    proficiency_level: Option<String>,
    #[serde(default)]
    level: Option<String>,
    #[serde(default)]
    rank: Option<u8>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    descriptor: Option<String>,
    #[serde(default)]
    indicators: Vec<String>,
}

/// Blocking client for the taxonomy source.
pub struct TaxonomyClient {
    base_url: String,
    taxonomy_path: String,
    levels_path: String,
    http: reqwest::blocking::Client,
}

impl TaxonomyClient {
    pub fn new(remote: &RemoteConfig) -> Result<Self> {
        if remote.base_url.is_empty() {
            return Err(EngineError::MissingConfig("remote.base_url".to_string()));
        }
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(remote.timeout_secs))
            .build()
            .map_err(|e| EngineError::Config(format!("HTTP client error: {e}")))?;
        Ok(Self {
            base_url: remote.base_url.clone(),
            taxonomy_path: remote.taxonomy_path.clone(),
            levels_path: remote.levels_path.clone(),
            http,
        })
    }

    /// Fetch and normalize the full KAAB taxonomy of one job role.
    pub fn fetch_taxonomy(&self, request: &TaxonomyRequest) -> Result<Taxonomy> {
        let url = format!("{}{}", self.base_url, self.taxonomy_path);
        info!(jobrole_id = %request.jobrole_id, "fetching jobrole taxonomy");

        let response = self
            .http
            .get(&url)
            .query(&[
                ("jobrole_id", request.jobrole_id.as_str()),
                ("jobrole_title", request.jobrole_title.as_str()),
                ("sub_institute_id", request.sub_institute_id.as_str()),
            ])
            .send()
            .map_err(|e| EngineError::Transport(format!("taxonomy fetch failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::Transport(format!(
                "taxonomy fetch failed ({status})"
            )));
        }
        let wire: WireTaxonomy = response
            .json()
            .map_err(|e| EngineError::Transport(format!("invalid taxonomy response: {e}")))?;

        let taxonomy = normalize_taxonomy(&request.jobrole_id, wire);
        debug!(items = taxonomy.len(), "taxonomy normalized");
        Ok(taxonomy)
    }

    /// Fetch one category's proficiency level catalog.
    pub fn fetch_levels(&self, category: Category) -> Result<LevelCatalog> {
        let url = format!("{}{}/{}", self.base_url, self.levels_path, category.as_str());
        debug!(%category, "fetching proficiency levels");

        let response = self
            .http
            .get(&url)
            .send()
            .map_err(|e| EngineError::Transport(format!("level fetch failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::Transport(format!(
                "level fetch for {category} failed ({status})"
            )));
        }
        let rows: Vec<WireLevel> = response
            .json()
            .map_err(|e| EngineError::Transport(format!("invalid level response: {e}")))?;

        normalize_catalog(category, rows)
    }
}

fn normalize_taxonomy(jobrole_id: &str, wire: WireTaxonomy) -> Taxonomy {
    let mut taxonomy = Taxonomy::new(jobrole_id);
    let lists = [
        (Category::Skill, wire.skill),
        (Category::Knowledge, wire.knowledge),
        (Category::Ability, wire.ability),
        (Category::Behaviour, wire.behaviour),
        (Category::Attitude, wire.attitude),
    ];
    for (category, entries) in lists {
        for (index, entry) in entries.into_iter().enumerate() {
            taxonomy.push(normalize_entry(jobrole_id, category, index, entry));
        }
    }
    taxonomy
}

fn normalize_entry(
    jobrole_id: &str,
    category: Category,
    index: usize,
    entry: WireEntry,
) -> RatableItem {
    match entry {
        WireEntry::Full {
            id,
            title,
            description,
            kaab_refs,
        } => RatableItem {
            id,
            title,
            description,
            category,
            jobrole_id: jobrole_id.to_string(),
            kaab_refs: if category.is_skill() {
                kaab_refs
            } else {
                BTreeMap::new()
            },
        },
        WireEntry::Label(title) => RatableItem {
            id: format!("{}_{index}", category.as_str()),
            title,
            description: String::new(),
            category,
            jobrole_id: jobrole_id.to_string(),
            kaab_refs: BTreeMap::new(),
        },
    }
}

fn normalize_catalog(category: Category, rows: Vec<WireLevel>) -> Result<LevelCatalog> {
    let mut levels = Vec::with_capacity(rows.len());
    for row in rows {
        let rank = row
            .rank
            .or_else(|| row.proficiency_level.as_deref().and_then(extract_rank))
            .or_else(|| row.level.as_deref().and_then(extract_rank))
            .ok_or_else(|| {
                EngineError::Transport(format!("level row without a numeric rank for {category}"))
            })?;
        let label = row
            .proficiency_level
            .or(row.level)
            .unwrap_or_else(|| format!("Level {rank}"));
        let descriptor = row.descriptor.or_else(|| {
            (!row.description.is_empty()).then_some(row.description)
        });
        levels.push(ProficiencyLevel {
            id: LevelCatalog::level_id(category, rank),
            rank,
            label,
            descriptor,
            indicators: row.indicators,
            category,
        });
    }
    Ok(LevelCatalog::new(category, levels))
}
