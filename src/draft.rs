//! Rating draft store: current selections, the committed baseline, and the
//! change-set diff between them.
//!
//! The baseline is only ever moved by a confirmed successful sync commit;
//! rater interaction touches the current map alone. Every mutation writes
//! through to the [`DraftCache`] — best effort, a failed cache write never
//! blocks the in-memory update.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::cache::{
    DraftCache, DraftKey, PersistedAnswerSet, PersistedDraft, PersistedSelection,
};
use crate::taxonomy::ItemKey;

/// The rater's current choice for one item. A `None` level means "not yet
/// rated".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingSelection {
    pub key: ItemKey,
    pub level_id: Option<String>,
}

/// One draft-vs-baseline difference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEntry {
    pub key: ItemKey,
    pub level_id: Option<String>,
}

/// The minimal set of differences between draft and baseline — the only
/// data ever transmitted on submission. Derived, never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub entries: Vec<ChangeEntry>,
}

impl ChangeSet {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChangeEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn contains(&self, key: &ItemKey) -> bool {
        self.entries.iter().any(|e| &e.key == key)
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a ChangeEntry;
    type IntoIter = std::slice::Iter<'a, ChangeEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Draft store for one (rater, jobrole) scope.
pub struct DraftStore {
    key: DraftKey,
    current: BTreeMap<ItemKey, Option<String>>,
    baseline: BTreeMap<ItemKey, Option<String>>,
    answers: BTreeMap<ItemKey, BTreeMap<String, bool>>,
    cache: Box<dyn DraftCache>,
    last_fingerprint: Option<String>,
}

impl fmt::Debug for DraftStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DraftStore")
            .field("key", &self.key)
            .field("current", &self.current.len())
            .field("baseline", &self.baseline.len())
            .finish_non_exhaustive()
    }
}

impl DraftStore {
    /// Create an empty draft, or restore the cached one for this scope.
    /// A cache read failure starts an empty draft; it never fails the
    /// session.
    pub fn hydrate(key: DraftKey, cache: Box<dyn DraftCache>) -> Self {
        let mut store = Self {
            key,
            current: BTreeMap::new(),
            baseline: BTreeMap::new(),
            answers: BTreeMap::new(),
            cache,
            last_fingerprint: None,
        };
        match store.cache.load(&store.key) {
            Ok(Some(persisted)) => {
                store.apply_persisted(persisted);
                debug!(key = %store.key, restored = store.current.len(), "draft restored from cache");
            }
            Ok(None) => {}
            Err(err) => {
                warn!(key = %store.key, error = %err, "draft cache read failed; starting empty");
            }
        }
        store
    }

    #[must_use]
    pub const fn key(&self) -> &DraftKey {
        &self.key
    }

    #[must_use]
    pub fn get(&self, key: &ItemKey) -> RatingSelection {
        RatingSelection {
            key: key.clone(),
            level_id: self.current.get(key).cloned().flatten(),
        }
    }

    /// Count of items currently carrying a rating.
    #[must_use]
    pub fn rated_len(&self) -> usize {
        self.current.values().filter(|v| v.is_some()).count()
    }

    #[must_use]
    pub fn answers(&self, skill: &ItemKey) -> Option<&BTreeMap<String, bool>> {
        self.answers.get(skill)
    }

    /// Record a selection. Overwrite semantics: last write wins.
    pub fn set(&mut self, key: ItemKey, level_id: Option<String>) {
        self.current.insert(key, level_id);
        self.flush();
    }

    /// Record a detailed-mode KAAB yes/no answer under its parent skill.
    pub fn set_answer(&mut self, skill: ItemKey, sub_item_id: impl Into<String>, yes: bool) {
        self.answers
            .entry(skill)
            .or_default()
            .insert(sub_item_id.into(), yes);
        self.flush();
    }

    /// Every key present in either map is compared; unchanged values are
    /// excluded, newly-rated keys are included.
    #[must_use]
    pub fn diff(&self) -> ChangeSet {
        let keys: BTreeSet<&ItemKey> = self.current.keys().chain(self.baseline.keys()).collect();
        let mut entries = Vec::new();
        for key in keys {
            let current = self.current.get(key).cloned().flatten();
            let baseline = self.baseline.get(key).cloned().flatten();
            if current != baseline {
                entries.push(ChangeEntry {
                    key: key.clone(),
                    level_id: current,
                });
            }
        }
        ChangeSet { entries }
    }

    /// After a successful sync: baseline takes the draft value for the
    /// applied entries only. Partial success must not rebaseline the rest.
    pub fn rebaseline(&mut self, applied: &ChangeSet) {
        for entry in applied {
            let value = self.current.get(&entry.key).cloned().flatten();
            self.baseline.insert(entry.key.clone(), value);
        }
    }

    /// Cache upkeep after a commit: nothing left to sync clears the entry,
    /// otherwise the remaining draft is stored.
    pub fn persist_after_commit(&mut self) {
        if self.diff().is_empty() {
            if let Err(err) = self.cache.clear(&self.key) {
                warn!(key = %self.key, error = %err, "draft cache clear failed");
            }
            self.last_fingerprint = None;
        } else {
            self.flush();
        }
    }

    #[must_use]
    pub fn to_persisted(&self) -> PersistedDraft {
        let to_rows = |map: &BTreeMap<ItemKey, Option<String>>| {
            map.iter()
                .map(|(key, level_id)| PersistedSelection {
                    category: key.category,
                    item_id: key.item_id.clone(),
                    level_id: level_id.clone(),
                })
                .collect()
        };
        PersistedDraft {
            selections: to_rows(&self.current),
            baseline: to_rows(&self.baseline),
            answers: self
                .answers
                .iter()
                .map(|(skill, answers)| PersistedAnswerSet {
                    skill_id: skill.item_id.clone(),
                    answers: answers.clone(),
                })
                .collect(),
            saved_at: Some(Utc::now()),
        }
    }

    fn apply_persisted(&mut self, persisted: PersistedDraft) {
        for row in persisted.selections {
            self.current
                .insert(ItemKey::new(row.category, row.item_id), row.level_id);
        }
        for row in persisted.baseline {
            self.baseline
                .insert(ItemKey::new(row.category, row.item_id), row.level_id);
        }
        for set in persisted.answers {
            self.answers.insert(
                ItemKey::new(crate::taxonomy::Category::Skill, set.skill_id),
                set.answers,
            );
        }
    }

    /// Write-through: synchronous, best-effort. Identical payloads are
    /// skipped via a content fingerprint; failures are logged and swallowed.
    fn flush(&mut self) {
        let persisted = self.to_persisted();
        let fingerprint = fingerprint(&persisted);
        if self.last_fingerprint.as_deref() == Some(fingerprint.as_str()) {
            return;
        }
        match self.cache.store(&self.key, &persisted) {
            Ok(()) => self.last_fingerprint = Some(fingerprint),
            Err(err) => warn!(key = %self.key, error = %err, "draft cache write failed"),
        }
    }
}

/// Content hash of a serialized draft, with the volatile timestamp masked
/// out so identical content always fingerprints identically.
fn fingerprint(persisted: &PersistedDraft) -> String {
    let mut stable = persisted.clone();
    stable.saved_at = None;
    serde_json::to_vec(&stable).map_or_else(
        |_| String::new(),
        |bytes| {
            let mut hasher = Sha256::new();
            hasher.update(&bytes);
            format!("{:x}", hasher.finalize())
        },
    )
}
