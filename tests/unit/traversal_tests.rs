//! Traversal driven together with the draft store: revisits must restore
//! stored selections in both workflows.

use std::collections::BTreeMap;

use skillsync::cache::{DraftKey, MemoryDraftCache};
use skillsync::draft::DraftStore;
use skillsync::taxonomy::{Category, ItemKey, RatableItem, Taxonomy};
use skillsync::traversal::Traversal;

fn item(category: Category, id: &str) -> RatableItem {
    RatableItem {
        id: id.to_string(),
        title: id.to_uppercase(),
        description: String::new(),
        category,
        jobrole_id: "jr-1".to_string(),
        kaab_refs: BTreeMap::new(),
    }
}

fn taxonomy() -> Taxonomy {
    let mut taxonomy = Taxonomy::new("jr-1");
    taxonomy.push(item(Category::Skill, "s1"));
    taxonomy.push(item(Category::Skill, "s2"));
    taxonomy.push(item(Category::Knowledge, "k1"));
    taxonomy.push(item(Category::Knowledge, "k2"));
    taxonomy
}

fn store() -> DraftStore {
    DraftStore::hydrate(
        DraftKey::new("u1", "jr1"),
        Box::new(MemoryDraftCache::new()),
    )
}

#[test]
fn revisit_restores_the_stored_selection_in_flat_mode() {
    let taxonomy = taxonomy();
    let mut traversal = Traversal::flat(&taxonomy);
    let mut store = store();

    let first = traversal.current().unwrap();
    store.set(first.clone(), Some("skill_level_2".to_string()));

    assert!(traversal.next());
    assert!(traversal.next());
    assert!(traversal.previous());
    assert!(traversal.previous());

    let revisited = traversal.current().unwrap();
    assert_eq!(revisited, first);
    assert_eq!(
        store.get(&revisited).level_id,
        Some("skill_level_2".to_string())
    );
}

#[test]
fn revisit_restores_the_stored_selection_in_detailed_mode() {
    let mut taxonomy = taxonomy();
    let mut skill = item(Category::Skill, "s3");
    skill
        .kaab_refs
        .insert(Category::Knowledge, vec!["k1".to_string(), "k2".to_string()]);
    taxonomy.push(skill.clone());

    let mut traversal = Traversal::detailed(&taxonomy, &skill);
    let mut store = store();

    assert!(traversal.next());
    let sub = traversal.current().unwrap();
    assert_eq!(sub, ItemKey::new(Category::Knowledge, "k1"));
    store.set(sub.clone(), Some("knowledge_level_4".to_string()));

    assert!(traversal.next());
    assert!(traversal.previous());
    assert_eq!(traversal.current().unwrap(), sub);
    assert_eq!(
        store.get(&sub).level_id,
        Some("knowledge_level_4".to_string())
    );
}

#[test]
fn jump_from_a_list_view_reads_the_draft_not_the_route() {
    let taxonomy = taxonomy();
    let mut traversal = Traversal::flat(&taxonomy);
    let mut store = store();

    let target = ItemKey::new(Category::Knowledge, "k2");
    store.set(target.clone(), Some("knowledge_level_1".to_string()));

    assert!(traversal.jump_to(Category::Knowledge, "k2"));
    assert_eq!(traversal.current().unwrap(), target);
    assert_eq!(
        store.get(&target).level_id,
        Some("knowledge_level_1".to_string())
    );
}

#[test]
fn boundary_guards_match_the_transition_results() {
    let taxonomy = taxonomy();
    let mut traversal = Traversal::flat(&taxonomy);

    assert!(!traversal.can_retreat());
    assert!(traversal.can_advance());

    while traversal.can_advance() {
        assert!(traversal.next());
    }
    assert!(traversal.is_exhausted());
    assert!(!traversal.next());
    assert!(traversal.can_retreat());
}
