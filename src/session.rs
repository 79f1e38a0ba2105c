//! Rating session facade: the engine wired the way the host page drives it.
//!
//! Load the taxonomy and level catalogs, hydrate the cached draft, move
//! through the items, then validate-and-submit. Local findings are
//! resolved before any network call; submission is at-most-one-in-flight
//! per draft.

use std::collections::HashMap;

use tracing::info;

use crate::cache::{DraftCache, DraftKey};
use crate::config::EngineConfig;
use crate::draft::{ChangeSet, DraftStore, RatingSelection};
use crate::error::{EngineError, Result};
use crate::events::{EngineEvent, EventSink};
use crate::sync::{SubmitClient, SyncEngine, SyncReport};
use crate::taxonomy::client::{TaxonomyClient, TaxonomyRequest};
use crate::taxonomy::{Category, ItemKey, LevelCatalog, RatableItem, Taxonomy};
use crate::traversal::{Traversal, TraversalMode};
use crate::validation::{RuleThresholds, ValidationResult, Validator};

/// Identity of the rating session: who rates which jobrole.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub rater_id: String,
    pub jobrole_id: String,
    pub jobrole_title: String,
    pub sub_institute_id: String,
}

/// Result of a submit attempt that did not fail in transport.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Remote store accepted the batch; baseline updated, cache cleared.
    Committed(SyncReport),
    /// Blocking validation errors; nothing was transmitted.
    Blocked(ValidationResult),
    /// Warnings only; explicit rater confirmation required before
    /// transmitting the same change set.
    AwaitingConfirmation(ValidationResult),
    /// The draft matches the baseline; nothing to send.
    NothingToSubmit,
}

pub struct RatingSession {
    ctx: SessionContext,
    taxonomy: Taxonomy,
    catalogs: HashMap<Category, LevelCatalog>,
    store: DraftStore,
    traversal: Traversal,
    engine: SyncEngine,
    thresholds: RuleThresholds,
    sink: Option<EventSink>,
    is_processing: bool,
}

impl std::fmt::Debug for RatingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RatingSession")
            .field("is_processing", &self.is_processing)
            .finish_non_exhaustive()
    }
}

impl RatingSession {
    /// Fetch the taxonomy and the five level catalogs, hydrate the cached
    /// draft, and start flat traversal.
    pub fn load(
        config: &EngineConfig,
        ctx: SessionContext,
        cache: Box<dyn DraftCache>,
    ) -> Result<Self> {
        let client = TaxonomyClient::new(&config.remote)?;
        let request = TaxonomyRequest {
            jobrole_id: ctx.jobrole_id.clone(),
            jobrole_title: ctx.jobrole_title.clone(),
            sub_institute_id: ctx.sub_institute_id.clone(),
        };
        let taxonomy = client.fetch_taxonomy(&request)?;
        let mut catalogs = HashMap::new();
        for category in Category::ALL {
            catalogs.insert(category, client.fetch_levels(category)?);
        }
        info!(
            jobrole_id = %ctx.jobrole_id,
            items = taxonomy.len(),
            "rating session loaded"
        );
        Self::assemble(config, ctx, taxonomy, catalogs, cache)
    }

    /// Wire a session from already-loaded collaborators (offline drafts,
    /// tests).
    pub fn assemble(
        config: &EngineConfig,
        ctx: SessionContext,
        taxonomy: Taxonomy,
        catalogs: HashMap<Category, LevelCatalog>,
        cache: Box<dyn DraftCache>,
    ) -> Result<Self> {
        let key = DraftKey::new(ctx.rater_id.clone(), ctx.jobrole_id.clone());
        let store = DraftStore::hydrate(key, cache);
        let traversal = Traversal::flat(&taxonomy);
        let engine = SyncEngine::new(
            SubmitClient::new(&config.remote)?,
            config.server.max_rank,
            ctx.rater_id.clone(),
            ctx.sub_institute_id.clone(),
        );
        Ok(Self {
            ctx,
            taxonomy,
            catalogs,
            store,
            traversal,
            engine,
            thresholds: config.validation.clone(),
            sink: None,
            is_processing: false,
        })
    }

    /// Install the host notification callback. Reports the hydrated draft
    /// so the host can reflect restored selections immediately.
    #[must_use]
    pub fn with_event_sink(mut self, sink: EventSink) -> Self {
        let restored = self.store.rated_len();
        self.sink = Some(sink);
        if restored > 0 {
            self.emit(&EngineEvent::DraftHydrated { restored });
        }
        self
    }

    fn emit(&self, event: &EngineEvent) {
        if let Some(sink) = &self.sink {
            sink(event);
        }
    }

    #[must_use]
    pub const fn context(&self) -> &SessionContext {
        &self.ctx
    }

    #[must_use]
    pub const fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    #[must_use]
    pub const fn is_processing(&self) -> bool {
        self.is_processing
    }

    #[must_use]
    pub const fn traversal(&self) -> &Traversal {
        &self.traversal
    }

    #[must_use]
    pub fn store(&self) -> &DraftStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut DraftStore {
        &mut self.store
    }

    /// Switch to the Skill→KAAB drill-down for one parent skill.
    pub fn enter_detailed(&mut self, skill_id: &str) -> Result<()> {
        let key = ItemKey::new(Category::Skill, skill_id);
        let skill = self
            .taxonomy
            .find(&key)
            .ok_or_else(|| EngineError::ItemNotFound(key.to_string()))?;
        self.traversal = Traversal::detailed(&self.taxonomy, skill);
        Ok(())
    }

    /// Switch back to the flat per-category walk.
    pub fn enter_flat(&mut self) {
        self.traversal = Traversal::flat(&self.taxonomy);
    }

    #[must_use]
    pub fn current(&self) -> Option<ItemKey> {
        self.traversal.current()
    }

    #[must_use]
    pub fn current_item(&self) -> Option<&RatableItem> {
        self.traversal.current().and_then(|key| self.taxonomy.find(&key))
    }

    /// The active item's stored selection, read from the draft store so a
    /// revisit restores what the rater chose earlier.
    #[must_use]
    pub fn current_selection(&self) -> Option<RatingSelection> {
        self.traversal.current().map(|key| self.store.get(&key))
    }

    /// Any item's stored selection.
    #[must_use]
    pub fn selection(&self, key: &ItemKey) -> RatingSelection {
        self.store.get(key)
    }

    /// Record the rater's choice for the active item. The write-through
    /// happens here, before any traversal move.
    pub fn select_level(&mut self, level_id: impl Into<String>) -> Result<()> {
        let key = self
            .traversal
            .current()
            .ok_or_else(|| EngineError::ItemNotFound("no active item".to_string()))?;
        self.store.set(key.clone(), Some(level_id.into()));
        self.emit(&EngineEvent::SelectionChanged { key });
        Ok(())
    }

    /// Clear the active item's selection.
    pub fn clear_level(&mut self) -> Result<()> {
        let key = self
            .traversal
            .current()
            .ok_or_else(|| EngineError::ItemNotFound("no active item".to_string()))?;
        self.store.set(key.clone(), None);
        self.emit(&EngineEvent::SelectionChanged { key });
        Ok(())
    }

    /// Record a KAAB yes/no answer under the active parent skill.
    pub fn answer(&mut self, sub_item_id: &str, yes: bool) -> Result<()> {
        let skill = match self.traversal.mode() {
            TraversalMode::Detailed { parent } => parent.clone(),
            TraversalMode::Flat => {
                let key = self
                    .traversal
                    .current()
                    .ok_or_else(|| EngineError::ItemNotFound("no active item".to_string()))?;
                if !key.category.is_skill() {
                    return Err(EngineError::ItemNotFound(format!(
                        "no parent skill for answer on {key}"
                    )));
                }
                key
            }
        };
        self.store.set_answer(skill, sub_item_id, yes);
        Ok(())
    }

    /// Pure pointer move; returns `false` at the end boundary.
    pub fn advance(&mut self) -> bool {
        self.traversal.next()
    }

    /// Pure pointer move; returns `false` at the start boundary.
    pub fn retreat(&mut self) -> bool {
        self.traversal.previous()
    }

    /// Direct selection from a list view. Returns the stored selection so
    /// the host restores the picker from the draft, not recomputed state.
    pub fn jump_to(&mut self, category: Category, item_id: &str) -> Result<RatingSelection> {
        if !self.traversal.jump_to(category, item_id) {
            return Err(EngineError::ItemNotFound(format!("{category}:{item_id}")));
        }
        Ok(self.store.get(&ItemKey::new(category, item_id)))
    }

    /// The current draft-vs-baseline change set.
    #[must_use]
    pub fn changes(&self) -> ChangeSet {
        self.store.diff()
    }

    /// Run both validation passes over the current change set.
    #[must_use]
    pub fn validate(&self) -> ValidationResult {
        let changeset = self.store.diff();
        let result = Validator::new(&self.taxonomy, &self.catalogs, self.thresholds.clone())
            .validate(&changeset);
        self.emit(&EngineEvent::ValidationFinished {
            errors: result.errors.len(),
            warnings: result.warnings.len(),
        });
        result
    }

    /// Validate-then-submit. Local findings are resolved before any
    /// network call; a failed transmit leaves draft and baseline untouched
    /// so the rater retries with the identical change set.
    pub fn submit(&mut self, confirm_warnings: bool) -> Result<SubmitOutcome> {
        if self.is_processing {
            return Err(EngineError::SubmitInFlight);
        }
        let changeset = self.store.diff();
        if changeset.is_empty() {
            return Ok(SubmitOutcome::NothingToSubmit);
        }

        let validation = self.validate();
        if !validation.is_valid() {
            return Ok(SubmitOutcome::Blocked(validation));
        }
        if validation.needs_confirmation() && !confirm_warnings {
            return Ok(SubmitOutcome::AwaitingConfirmation(validation));
        }

        self.is_processing = true;
        self.emit(&EngineEvent::SubmitStarted {
            entries: changeset.len(),
        });
        let outcome = self.engine.submit(&changeset, &self.taxonomy, &self.catalogs);
        self.is_processing = false;

        match outcome {
            Ok(report) => {
                self.store.rebaseline(&changeset);
                self.store.persist_after_commit();
                for coercion in &report.coercions {
                    self.emit(&EngineEvent::RankCoerced {
                        key: coercion.key.clone(),
                        from: coercion.from,
                        to: coercion.to,
                    });
                }
                self.emit(&EngineEvent::SubmitCommitted {
                    applied: report.submitted,
                });
                Ok(SubmitOutcome::Committed(report))
            }
            Err(err) => {
                self.emit(&EngineEvent::SubmitFailed {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }
}
