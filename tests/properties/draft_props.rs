//! Diff laws: the change set is exactly the draft-vs-baseline difference.

use std::collections::HashMap;

use proptest::prelude::*;

use skillsync::cache::{DraftKey, MemoryDraftCache};
use skillsync::draft::DraftStore;
use skillsync::taxonomy::{Category, ItemKey};

fn key(id: u8) -> ItemKey {
    ItemKey::new(Category::Skill, format!("s{id}"))
}

fn level(rank: u8) -> Option<String> {
    (rank > 0).then(|| format!("skill_level_{rank}"))
}

fn store() -> DraftStore {
    DraftStore::hydrate(
        DraftKey::new("u1", "jr1"),
        Box::new(MemoryDraftCache::new()),
    )
}

proptest! {
    /// `diff` excludes unchanged entries and includes every other one.
    #[test]
    fn diff_matches_a_reference_model(
        committed in prop::collection::vec((0u8..20, 0u8..6), 0..24),
        edits in prop::collection::vec((0u8..20, 0u8..6), 0..24),
    ) {
        let mut store = store();

        let mut baseline: HashMap<ItemKey, Option<String>> = HashMap::new();
        for (id, rank) in committed {
            store.set(key(id), level(rank));
            baseline.insert(key(id), level(rank));
        }
        store.rebaseline(&store.diff());

        let mut current = baseline.clone();
        for (id, rank) in edits {
            store.set(key(id), level(rank));
            current.insert(key(id), level(rank));
        }

        let expected: usize = current
            .iter()
            .filter(|(k, v)| baseline.get(*k).cloned().flatten() != (*v).clone())
            .count();

        let diff = store.diff();
        prop_assert_eq!(diff.len(), expected);
        for entry in &diff {
            let was = baseline.get(&entry.key).cloned().flatten();
            prop_assert_ne!(&was, &entry.level_id);
        }
    }

    /// Rebaselining the full diff always empties it.
    #[test]
    fn rebaseline_of_the_full_diff_empties_it(
        edits in prop::collection::vec((0u8..20, 0u8..6), 0..32),
    ) {
        let mut store = store();
        for (id, rank) in edits {
            store.set(key(id), level(rank));
        }
        store.rebaseline(&store.diff());
        prop_assert!(store.diff().is_empty());
    }

    /// Last write wins: the diff never carries more entries than keys.
    #[test]
    fn diff_has_at_most_one_entry_per_key(
        edits in prop::collection::vec((0u8..8, 1u8..6), 1..48),
    ) {
        let mut store = store();
        for (id, rank) in &edits {
            store.set(key(*id), level(*rank));
        }
        let diff = store.diff();
        let mut seen = std::collections::HashSet::new();
        for entry in &diff {
            prop_assert!(seen.insert(entry.key.clone()));
        }
    }
}
