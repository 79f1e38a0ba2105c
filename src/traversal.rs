//! Traversal state machine over the ordered category lists.
//!
//! A route is the ordered concatenation of category runs: the jobrole's
//! five global lists in flat mode, or one parent skill followed by its own
//! KAAB sub-lists in detailed mode. Transitions are pure pointer moves —
//! selections are written to the draft store before any move — and both
//! boundaries are no-ops, surfaced to the host as disabled affordances
//! rather than errors.

use crate::taxonomy::{Category, ItemKey, RatableItem, Taxonomy};

/// Which workflow built the route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraversalMode {
    /// The jobrole's five global lists, skill-by-skill then KAAB.
    Flat,
    /// One parent skill followed by its own KAAB sub-lists.
    Detailed { parent: ItemKey },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CategoryRun {
    category: Category,
    items: Vec<ItemKey>,
}

/// Position tracker: `(run, index)` over the non-empty category runs.
#[derive(Debug, Clone)]
pub struct Traversal {
    mode: TraversalMode,
    route: Vec<CategoryRun>,
    run: usize,
    index: usize,
}

impl Traversal {
    /// Route over the jobrole's global category lists.
    #[must_use]
    pub fn flat(taxonomy: &Taxonomy) -> Self {
        let route = Category::ALL
            .iter()
            .filter_map(|&category| {
                let items: Vec<ItemKey> =
                    taxonomy.items(category).iter().map(RatableItem::key).collect();
                (!items.is_empty()).then_some(CategoryRun { category, items })
            })
            .collect();
        Self {
            mode: TraversalMode::Flat,
            route,
            run: 0,
            index: 0,
        }
    }

    /// Route over one skill followed by its KAAB sub-lists. A skill without
    /// per-skill references falls back to the jobrole's global KAAB lists.
    #[must_use]
    pub fn detailed(taxonomy: &Taxonomy, skill: &RatableItem) -> Self {
        let mut route = vec![CategoryRun {
            category: Category::Skill,
            items: vec![skill.key()],
        }];
        for category in Category::KAAB {
            let ids: Vec<String> = skill.kaab_refs.get(&category).map_or_else(
                || taxonomy.items(category).iter().map(|i| i.id.clone()).collect(),
                Clone::clone,
            );
            let items: Vec<ItemKey> = ids
                .into_iter()
                .map(|id| ItemKey::new(category, id))
                .collect();
            if !items.is_empty() {
                route.push(CategoryRun { category, items });
            }
        }
        Self {
            mode: TraversalMode::Detailed {
                parent: skill.key(),
            },
            route,
            run: 0,
            index: 0,
        }
    }

    #[must_use]
    pub const fn mode(&self) -> &TraversalMode {
        &self.mode
    }

    /// The active item, or `None` for an empty route.
    #[must_use]
    pub fn current(&self) -> Option<ItemKey> {
        self.route
            .get(self.run)
            .and_then(|r| r.items.get(self.index))
            .cloned()
    }

    /// Active `(category, index-within-category)` pair.
    #[must_use]
    pub fn position(&self) -> Option<(Category, usize)> {
        self.route.get(self.run).map(|r| (r.category, self.index))
    }

    #[must_use]
    pub fn can_advance(&self) -> bool {
        self.route.get(self.run).is_some_and(|run| {
            self.index + 1 < run.items.len() || self.run + 1 < self.route.len()
        })
    }

    #[must_use]
    pub const fn can_retreat(&self) -> bool {
        self.run > 0 || self.index > 0
    }

    /// Terminal pseudo-state at the end of the last category.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        !self.can_advance()
    }

    /// Advance one item, crossing category boundaries. Returns `false` at
    /// the end of the last category (no-op).
    pub fn next(&mut self) -> bool {
        let Some(run) = self.route.get(self.run) else {
            return false;
        };
        if self.index + 1 < run.items.len() {
            self.index += 1;
            return true;
        }
        if self.run + 1 < self.route.len() {
            self.run += 1;
            self.index = 0;
            return true;
        }
        false
    }

    /// Inverse of [`Self::next`]; no-op at the first item of the first
    /// category.
    pub fn previous(&mut self) -> bool {
        if self.index > 0 {
            self.index -= 1;
            return true;
        }
        if self.run > 0 {
            self.run -= 1;
            self.index = self.route[self.run].items.len() - 1;
            return true;
        }
        false
    }

    /// Direct selection from a list view. Returns `false` when the item is
    /// not on the current route; the position is untouched in that case.
    pub fn jump_to(&mut self, category: Category, item_id: &str) -> bool {
        for (run_idx, run) in self.route.iter().enumerate() {
            if run.category != category {
                continue;
            }
            if let Some(idx) = run.items.iter().position(|k| k.item_id == item_id) {
                self.run = run_idx;
                self.index = idx;
                return true;
            }
        }
        false
    }

    /// Total number of items on the route.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route.iter().map(|r| r.items.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route.is_empty()
    }
}
