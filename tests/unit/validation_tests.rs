//! Validation engine behavior with configured thresholds.

use std::collections::{BTreeMap, HashMap};

use skillsync::draft::{ChangeEntry, ChangeSet};
use skillsync::taxonomy::{Category, ItemKey, LevelCatalog, ProficiencyLevel, RatableItem, Taxonomy};
use skillsync::validation::{RuleThresholds, Validator};

fn taxonomy(count: usize) -> Taxonomy {
    let mut taxonomy = Taxonomy::new("jr-1");
    for i in 0..count {
        taxonomy.push(RatableItem {
            id: format!("s{i}"),
            title: format!("Skill {i}"),
            description: String::new(),
            category: Category::Skill,
            jobrole_id: "jr-1".to_string(),
            kaab_refs: BTreeMap::new(),
        });
    }
    taxonomy
}

fn catalogs(max: u8) -> HashMap<Category, LevelCatalog> {
    let levels = (1..=max)
        .map(|rank| ProficiencyLevel {
            id: LevelCatalog::level_id(Category::Skill, rank),
            rank,
            label: format!("Level {rank}"),
            descriptor: None,
            indicators: vec![],
            category: Category::Skill,
        })
        .collect();
    let mut catalogs = HashMap::new();
    catalogs.insert(Category::Skill, LevelCatalog::new(Category::Skill, levels));
    catalogs
}

fn entry(id: &str, level: Option<&str>) -> ChangeEntry {
    ChangeEntry {
        key: ItemKey::new(Category::Skill, id),
        level_id: level.map(String::from),
    }
}

#[test]
fn errors_and_warnings_aggregate_in_one_result() {
    let taxonomy = taxonomy(6);
    let catalogs = catalogs(5);
    let validator = Validator::new(&taxonomy, &catalogs, RuleThresholds::default());

    let changeset = ChangeSet {
        entries: vec![
            entry("s0", None),
            entry("s1", Some("skill_level_5")),
            entry("s2", Some("skill_level_5")),
            entry("s3", Some("skill_level_5")),
            entry("s4", Some("skill_level_5")),
        ],
    };
    let result = validator.validate(&changeset);

    // the incomplete entry blocks regardless of the warning
    assert!(!result.is_valid());
    assert!(!result.needs_confirmation());
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.warnings.len(), 1);
}

#[test]
fn raised_thresholds_relax_the_clustering_rule() {
    let taxonomy = taxonomy(6);
    let catalogs = catalogs(5);
    let thresholds = RuleThresholds {
        cluster_ratio: 0.8,
        cluster_min_rated: 6,
    };
    let validator = Validator::new(&taxonomy, &catalogs, thresholds);

    let changeset = ChangeSet {
        entries: (0..5)
            .map(|i| entry(&format!("s{i}"), Some("skill_level_5")))
            .collect(),
    };
    // five rated entries are below the raised minimum
    let result = validator.validate(&changeset);
    assert!(result.is_valid());
    assert!(result.warnings.is_empty());
}

#[test]
fn empty_change_set_is_trivially_valid() {
    let taxonomy = taxonomy(1);
    let catalogs = catalogs(5);
    let validator = Validator::new(&taxonomy, &catalogs, RuleThresholds::default());

    let result = validator.validate(&ChangeSet::default());
    assert!(result.is_valid());
    assert!(result.warnings.is_empty());
}
