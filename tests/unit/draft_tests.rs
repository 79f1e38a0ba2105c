//! Draft store behavior through the public API, including durable-cache
//! round trips.

use std::collections::BTreeMap;

use skillsync::cache::{DraftCache, DraftKey, JsonFileDraftCache, SqliteDraftCache};
use skillsync::draft::DraftStore;
use skillsync::taxonomy::{Category, ItemKey};
use tempfile::tempdir;

fn key(id: &str) -> ItemKey {
    ItemKey::new(Category::Skill, id)
}

#[test]
fn draft_survives_a_reload_through_the_json_cache() {
    let dir = tempdir().unwrap();

    {
        let mut store = DraftStore::hydrate(
            DraftKey::new("u1", "jr1"),
            Box::new(JsonFileDraftCache::new(dir.path())),
        );
        store.set(key("s1"), Some("skill_level_3".to_string()));
        store.set_answer(key("s1"), "k1", true);
        store.set_answer(key("s1"), "k2", false);
    }

    let restored = DraftStore::hydrate(
        DraftKey::new("u1", "jr1"),
        Box::new(JsonFileDraftCache::new(dir.path())),
    );
    assert_eq!(
        restored.get(&key("s1")).level_id,
        Some("skill_level_3".to_string())
    );
    let answers: &BTreeMap<String, bool> = restored.answers(&key("s1")).unwrap();
    assert_eq!(answers.get("k1"), Some(&true));
    assert_eq!(answers.get("k2"), Some(&false));
    // the unsynced change is still pending after the reload
    assert_eq!(restored.diff().len(), 1);
}

#[test]
fn baseline_survives_a_reload() {
    let dir = tempdir().unwrap();

    {
        let mut store = DraftStore::hydrate(
            DraftKey::new("u1", "jr1"),
            Box::new(JsonFileDraftCache::new(dir.path())),
        );
        store.set(key("s1"), Some("skill_level_3".to_string()));
        store.rebaseline(&store.diff());
        store.set(key("s2"), Some("skill_level_2".to_string()));
    }

    let restored = DraftStore::hydrate(
        DraftKey::new("u1", "jr1"),
        Box::new(JsonFileDraftCache::new(dir.path())),
    );
    // only the post-commit change is pending
    let diff = restored.diff();
    assert_eq!(diff.len(), 1);
    assert!(diff.contains(&key("s2")));
}

#[test]
fn scopes_do_not_bleed_into_each_other() {
    let dir = tempdir().unwrap();

    let mut first = DraftStore::hydrate(
        DraftKey::new("u1", "jr1"),
        Box::new(JsonFileDraftCache::new(dir.path())),
    );
    first.set(key("s1"), Some("skill_level_1".to_string()));

    let second = DraftStore::hydrate(
        DraftKey::new("u1", "jr2"),
        Box::new(JsonFileDraftCache::new(dir.path())),
    );
    assert_eq!(second.get(&key("s1")).level_id, None);
    assert!(second.diff().is_empty());
}

#[test]
fn sqlite_backend_round_trips_a_draft() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("drafts.db");

    {
        let mut store = DraftStore::hydrate(
            DraftKey::new("u1", "jr1"),
            Box::new(SqliteDraftCache::open(&db).unwrap()),
        );
        store.set(key("s1"), Some("skill_level_4".to_string()));
    }

    let restored = DraftStore::hydrate(
        DraftKey::new("u1", "jr1"),
        Box::new(SqliteDraftCache::open(&db).unwrap()),
    );
    assert_eq!(
        restored.get(&key("s1")).level_id,
        Some("skill_level_4".to_string())
    );
}

#[test]
fn commit_clears_the_cache_entry_when_nothing_is_pending() {
    let dir = tempdir().unwrap();
    let cache_key = DraftKey::new("u1", "jr1");

    let mut store = DraftStore::hydrate(
        cache_key.clone(),
        Box::new(JsonFileDraftCache::new(dir.path())),
    );
    store.set(key("s1"), Some("skill_level_3".to_string()));
    assert!(
        JsonFileDraftCache::new(dir.path())
            .load(&cache_key)
            .unwrap()
            .is_some()
    );

    store.rebaseline(&store.diff());
    store.persist_after_commit();
    assert!(
        JsonFileDraftCache::new(dir.path())
            .load(&cache_key)
            .unwrap()
            .is_none()
    );
}
