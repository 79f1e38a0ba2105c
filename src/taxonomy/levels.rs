//! Proficiency level catalogs, ordered by numeric rank.
//!
//! Catalogs are category-scoped: a Skill's levels differ from Knowledge's.
//! Ranks are positive integers with no gap requirement; the catalog maximum
//! is whatever the highest supplied tier declares.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::Category;

/// One proficiency tier of a category-scoped catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProficiencyLevel {
    /// Stable level ID (`"<category>_level_<rank>"`).
    pub id: String,
    /// Numeric rank, ascending from 1.
    pub rank: u8,
    /// Display label, e.g. `"Level 3 - Proficient"`.
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indicators: Vec<String>,
    pub category: Category,
}

/// Category-scoped, rank-ordered level catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelCatalog {
    pub category: Category,
    levels: Vec<ProficiencyLevel>,
}

impl LevelCatalog {
    #[must_use]
    pub fn new(category: Category, mut levels: Vec<ProficiencyLevel>) -> Self {
        levels.sort_by_key(|l| l.rank);
        Self { category, levels }
    }

    /// Stable ID for a level of this category at a given rank.
    #[must_use]
    pub fn level_id(category: Category, rank: u8) -> String {
        format!("{}_level_{rank}", category.as_str())
    }

    #[must_use]
    pub fn levels(&self) -> &[ProficiencyLevel] {
        &self.levels
    }

    /// Highest rank the catalog declares, 0 for an empty catalog.
    #[must_use]
    pub fn max_rank(&self) -> u8 {
        self.levels.last().map_or(0, |l| l.rank)
    }

    #[must_use]
    pub fn find(&self, level_id: &str) -> Option<&ProficiencyLevel> {
        self.levels.iter().find(|l| l.id == level_id)
    }

    #[must_use]
    pub fn by_rank(&self, rank: u8) -> Option<&ProficiencyLevel> {
        self.levels.iter().find(|l| l.rank == rank)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

static RANK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("rank pattern is valid"));

/// Fallback adapter for catalogs that only expose display strings: pull the
/// first integer substring out of a label like `"Level 3 - Proficient"`.
///
/// The structured `rank` field is always preferred when the collaborator
/// supplies one; this never runs outside the wire boundary.
#[must_use]
pub fn extract_rank(text: &str) -> Option<u8> {
    RANK_PATTERN
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
}
