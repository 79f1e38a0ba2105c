//! Structural and business-rule validation of a change set.
//!
//! Two passes, run in order, findings aggregated rather than surfaced
//! one-at-a-time: completeness first, then proficiency-distribution sanity.
//! Errors block submission; warnings require explicit rater confirmation
//! before the synchronization engine is invoked with the same change set.

use std::collections::HashMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::draft::ChangeSet;
use crate::error::Message;
use crate::taxonomy::{Category, LevelCatalog, Taxonomy};

/// Thresholds for the distribution advisories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleThresholds {
    /// Share of rated entries at their catalog maximum that triggers the
    /// clustering warning.
    pub cluster_ratio: f32,
    /// Minimum number of rated entries before distribution rules apply.
    pub cluster_min_rated: usize,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            cluster_ratio: 0.8,
            cluster_min_rated: 4,
        }
    }
}

/// Classified validation outcome.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub errors: Vec<Message>,
    pub warnings: Vec<Message>,
}

impl ValidationResult {
    /// Errors block submission; warnings alone do not.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Valid but carrying advisories the rater must acknowledge.
    #[must_use]
    pub fn needs_confirmation(&self) -> bool {
        self.is_valid() && !self.warnings.is_empty()
    }
}

/// Validation engine over one taxonomy + catalog pair.
pub struct Validator<'a> {
    taxonomy: &'a Taxonomy,
    catalogs: &'a HashMap<Category, LevelCatalog>,
    thresholds: RuleThresholds,
}

impl<'a> Validator<'a> {
    #[must_use]
    pub const fn new(
        taxonomy: &'a Taxonomy,
        catalogs: &'a HashMap<Category, LevelCatalog>,
        thresholds: RuleThresholds,
    ) -> Self {
        Self {
            taxonomy,
            catalogs,
            thresholds,
        }
    }

    /// Run both passes over the change set and aggregate every finding.
    #[must_use]
    pub fn validate(&self, changeset: &ChangeSet) -> ValidationResult {
        let mut result = ValidationResult::default();
        self.check_completeness(changeset, &mut result);
        self.check_distribution(changeset, &mut result);
        result
    }

    /// Structural pass: every entry the rater intends to submit must carry
    /// a level.
    fn check_completeness(&self, changeset: &ChangeSet, result: &mut ValidationResult) {
        for entry in changeset {
            if entry.level_id.is_none() {
                result.errors.push(Message::error(format!(
                    "incomplete rating for '{}'",
                    self.taxonomy.title_of(&entry.key)
                )));
            }
        }
    }

    /// Business-rule pass: catalog membership, rank range, and
    /// distribution advisories.
    fn check_distribution(&self, changeset: &ChangeSet, result: &mut ValidationResult) {
        // (rank, catalog max) per resolvable entry
        let mut ranks: Vec<(u8, u8)> = Vec::new();

        for entry in changeset {
            let Some(level_id) = &entry.level_id else {
                continue;
            };
            let title = self.taxonomy.title_of(&entry.key);
            let Some(catalog) = self.catalogs.get(&entry.key.category) else {
                result.errors.push(Message::error(format!(
                    "no proficiency catalog loaded for {}",
                    entry.key.category
                )));
                continue;
            };
            match catalog.find(level_id) {
                Some(level) if level.rank >= 1 && level.rank <= catalog.max_rank() => {
                    ranks.push((level.rank, catalog.max_rank()));
                }
                Some(level) => {
                    result.errors.push(Message::error(format!(
                        "rank {} for '{title}' is outside the {} catalog range 1..={}",
                        level.rank,
                        entry.key.category,
                        catalog.max_rank()
                    )));
                }
                None => {
                    result.errors.push(Message::error(format!(
                        "unknown proficiency level '{level_id}' for '{title}'"
                    )));
                }
            }
        }

        if ranks.len() < self.thresholds.cluster_min_rated {
            return;
        }

        let at_max = ranks.iter().filter(|(rank, max)| rank == max).count();
        #[allow(clippy::cast_precision_loss)]
        let share = at_max as f32 / ranks.len() as f32;
        if share >= self.thresholds.cluster_ratio {
            result.warnings.push(Message::warning(format!(
                "{at_max} of {} selections sit at the maximum rank; confirm this reflects \
                 observed proficiency",
                ranks.len()
            )));
        } else if ranks.iter().map(|(rank, _)| rank).all_equal() {
            result.warnings.push(Message::warning(format!(
                "all {} selections use the same rank; confirm the ratings were \
                 considered individually",
                ranks.len()
            )));
        }
    }
}
