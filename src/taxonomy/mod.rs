//! Jobrole KAAB taxonomy: ratable items and proficiency level catalogs.
//!
//! The taxonomy source supplies, per job role, the ordered collections of
//! Skill, Knowledge, Ability, Behaviour and Attitude items plus a
//! category-scoped proficiency level catalog. Everything here is immutable
//! once loaded; the rating engine only reads it.

pub mod client;
mod levels;

pub use levels::{LevelCatalog, ProficiencyLevel, extract_rank};

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The five rating categories. `Skill` is the parent category; the other
/// four are the KAAB sub-attributes evaluated alongside it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Skill,
    Knowledge,
    Ability,
    Behaviour,
    Attitude,
}

impl Category {
    /// All categories in traversal order.
    pub const ALL: [Self; 5] = [
        Self::Skill,
        Self::Knowledge,
        Self::Ability,
        Self::Behaviour,
        Self::Attitude,
    ];

    /// The four sub-attribute categories.
    pub const KAAB: [Self; 4] = [
        Self::Knowledge,
        Self::Ability,
        Self::Behaviour,
        Self::Attitude,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Skill => "skill",
            Self::Knowledge => "knowledge",
            Self::Ability => "ability",
            Self::Behaviour => "behaviour",
            Self::Attitude => "attitude",
        }
    }

    #[must_use]
    pub const fn is_skill(self) -> bool {
        matches!(self, Self::Skill)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of one ratable item: the single tagged pair that replaces
/// per-category state slots everywhere in the engine.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ItemKey {
    pub category: Category,
    pub item_id: String,
}

impl ItemKey {
    pub fn new(category: Category, item_id: impl Into<String>) -> Self {
        Self {
            category,
            item_id: item_id.into(),
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category, self.item_id)
    }
}

/// One entry of a jobrole taxonomy. Immutable, supplied by the taxonomy
/// source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatableItem {
    /// Unique item ID within its category.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: Category,
    /// Job role that owns this item.
    pub jobrole_id: String,
    /// KAAB sub-item references, populated for Skill items only.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub kaab_refs: BTreeMap<Category, Vec<String>>,
}

impl RatableItem {
    #[must_use]
    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.category, self.id.clone())
    }
}

/// The full per-jobrole taxonomy with ordered per-category collections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Taxonomy {
    pub jobrole_id: String,
    #[serde(default)]
    items: BTreeMap<Category, Vec<RatableItem>>,
}

impl Taxonomy {
    pub fn new(jobrole_id: impl Into<String>) -> Self {
        Self {
            jobrole_id: jobrole_id.into(),
            items: BTreeMap::new(),
        }
    }

    /// Append an item to the end of its category list.
    pub fn push(&mut self, item: RatableItem) {
        self.items.entry(item.category).or_default().push(item);
    }

    /// The ordered item list of one category, empty when absent.
    #[must_use]
    pub fn items(&self, category: Category) -> &[RatableItem] {
        self.items.get(&category).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn find(&self, key: &ItemKey) -> Option<&RatableItem> {
        self.items(key.category).iter().find(|i| i.id == key.item_id)
    }

    /// Display title for a key, falling back to the raw ID for items that
    /// are no longer on the taxonomy.
    #[must_use]
    pub fn title_of(&self, key: &ItemKey) -> String {
        self.find(key)
            .map_or_else(|| key.item_id.clone(), |i| i.title.clone())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
