//! Bulk-submit flows: commit, blocking validation, warning confirmation,
//! clamping, and failure classification against a mock remote store.

use httpmock::prelude::*;
use tempfile::tempdir;

use skillsync::EngineError;
use skillsync::session::SubmitOutcome;
use skillsync::taxonomy::Category;

use crate::fixture;

#[test]
fn committed_submission_rebaselines_and_clears_the_cache() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/ratings/bulk");
        then.status(200).json_body(serde_json::json!({}));
    });
    let dir = tempdir().unwrap();
    let mut session = fixture::session(&server.base_url(), dir.path(), 5);

    session.jump_to(Category::Skill, "s1").unwrap();
    session.select_level("skill_level_3").unwrap();

    let changes = session.changes();
    assert_eq!(changes.len(), 1);
    assert_eq!(
        changes.entries[0].level_id,
        Some("skill_level_3".to_string())
    );

    let outcome = session.submit(false).unwrap();
    let SubmitOutcome::Committed(report) = outcome else {
        panic!("expected a committed submission");
    };
    assert_eq!(report.submitted, 1);
    assert_eq!(report.skills, 1);
    assert_eq!(report.kaab, 0);
    mock.assert_hits(1);

    // baseline now matches the draft and the cached draft is gone
    assert!(session.changes().is_empty());
    assert!(!dir.path().join("draft-u1_jr1.json").exists());
}

#[test]
fn blocked_submission_never_touches_the_network() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/ratings/bulk");
        then.status(200).json_body(serde_json::json!({}));
    });
    let dir = tempdir().unwrap();
    let mut session = fixture::session(&server.base_url(), dir.path(), 5);

    // a previously committed rating that the rater now removes
    session.jump_to(Category::Skill, "s1").unwrap();
    session.select_level("skill_level_3").unwrap();
    let committed = session.changes();
    session.store_mut().rebaseline(&committed);
    session.clear_level().unwrap();

    let outcome = session.submit(false).unwrap();
    let SubmitOutcome::Blocked(validation) = outcome else {
        panic!("expected a blocked submission");
    };
    assert!(!validation.is_valid());
    assert!(validation.errors[0].text.contains("incomplete rating"));
    mock.assert_hits(0);
}

#[test]
fn warning_only_submissions_wait_for_explicit_confirmation() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/ratings/bulk");
        then.status(200).json_body(serde_json::json!({}));
    });
    let dir = tempdir().unwrap();
    let mut session = fixture::session(&server.base_url(), dir.path(), 5);

    // four items, all at the catalog maximum
    for (category, id, level) in [
        (Category::Skill, "s1", "skill_level_5"),
        (Category::Skill, "s2", "skill_level_5"),
        (Category::Knowledge, "k1", "knowledge_level_5"),
        (Category::Attitude, "at1", "attitude_level_5"),
    ] {
        session.jump_to(category, id).unwrap();
        session.select_level(level).unwrap();
    }

    let outcome = session.submit(false).unwrap();
    let SubmitOutcome::AwaitingConfirmation(validation) = outcome else {
        panic!("expected a confirmation request");
    };
    assert!(validation.needs_confirmation());
    mock.assert_hits(0);

    // the rater confirms; the identical change set goes out
    let outcome = session.submit(true).unwrap();
    assert!(matches!(outcome, SubmitOutcome::Committed(_)));
    mock.assert_hits(1);
}

#[test]
fn rank_above_the_server_ceiling_is_clamped_and_reported() {
    let server = MockServer::start();
    // the mock only matches a request carrying the clamped rank
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/ratings/bulk")
            .json_body_includes(r#"{"skills": [{"skill_id": "s1", "skill_level": 5}]}"#);
        then.status(200).json_body(serde_json::json!({}));
    });
    let dir = tempdir().unwrap();
    // catalogs expose a 7th tier; the server ceiling stays at 5
    let mut session = fixture::session(&server.base_url(), dir.path(), 7);

    session.jump_to(Category::Skill, "s1").unwrap();
    session.select_level("skill_level_7").unwrap();

    let outcome = session.submit(false).unwrap();
    let SubmitOutcome::Committed(report) = outcome else {
        panic!("expected a committed submission");
    };
    mock.assert_hits(1);

    assert_eq!(report.coercions.len(), 1);
    assert_eq!(report.coercions[0].from, 7);
    assert_eq!(report.coercions[0].to, 5);
    assert_eq!(report.notes.len(), 1);
    assert!(report.notes[0].text.contains("server ceiling 5"));
    assert_eq!(report.notes[0].severity, skillsync::Severity::Info);
}

#[test]
fn transport_failure_preserves_the_draft_for_a_manual_retry() {
    let server = MockServer::start();
    let mut failing = server.mock(|when, then| {
        when.method(POST).path("/ratings/bulk");
        then.status(500).body("upstream exploded");
    });
    let dir = tempdir().unwrap();
    let mut session = fixture::session(&server.base_url(), dir.path(), 5);

    session.jump_to(Category::Skill, "s1").unwrap();
    session.select_level("skill_level_3").unwrap();

    let err = session.submit(false).unwrap_err();
    assert!(matches!(err, EngineError::Transport(_)));
    assert!(err.is_retryable());
    failing.assert_hits(1);

    // draft and baseline untouched; cache still holds the draft
    assert_eq!(
        session.selection(&skillsync::taxonomy::ItemKey::new(Category::Skill, "s1"))
            .level_id,
        Some("skill_level_3".to_string())
    );
    assert_eq!(session.changes().len(), 1);
    assert!(dir.path().join("draft-u1_jr1.json").exists());
    assert!(!session.is_processing());

    // manual retry with the identical change set succeeds
    failing.delete();
    let ok = server.mock(|when, then| {
        when.method(POST).path("/ratings/bulk");
        then.status(200).json_body(serde_json::json!({}));
    });
    let outcome = session.submit(false).unwrap();
    assert!(matches!(outcome, SubmitOutcome::Committed(_)));
    ok.assert_hits(1);
    assert!(session.changes().is_empty());
}

#[test]
fn remote_422_surfaces_field_errors_verbatim_and_preserves_the_draft() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/ratings/bulk");
        then.status(422).json_body(serde_json::json!({
            "errors": {
                "skills.0.skill_level": ["must be between 1 and 5"],
                "user_id": ["unknown user"]
            }
        }));
    });
    let dir = tempdir().unwrap();
    let mut session = fixture::session(&server.base_url(), dir.path(), 5);

    session.jump_to(Category::Skill, "s1").unwrap();
    session.select_level("skill_level_2").unwrap();

    let err = session.submit(false).unwrap_err();
    mock.assert_hits(1);
    let EngineError::RemoteRejected { messages } = &err else {
        panic!("expected a remote rejection");
    };
    assert!(
        messages
            .contains(&"skills.0.skill_level: must be between 1 and 5".to_string())
    );
    assert!(messages.contains(&"user_id: unknown user".to_string()));

    // every failure renders as Error-severity user messages
    let rendered = err.user_messages();
    assert_eq!(rendered.len(), 2);
    assert!(rendered.iter().all(|m| m.severity == skillsync::Severity::Error));

    assert_eq!(session.changes().len(), 1);
}

#[test]
fn successful_submission_rebaselines_exactly_the_submitted_subset() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/ratings/bulk");
        then.status(200).json_body(serde_json::json!({}));
    });
    let dir = tempdir().unwrap();
    let mut session = fixture::session(&server.base_url(), dir.path(), 5);

    // first pass: three items
    for (category, id, level) in [
        (Category::Skill, "s1", "skill_level_3"),
        (Category::Skill, "s2", "skill_level_2"),
        (Category::Knowledge, "k1", "knowledge_level_4"),
    ] {
        session.jump_to(category, id).unwrap();
        session.select_level(level).unwrap();
    }
    assert!(matches!(
        session.submit(false).unwrap(),
        SubmitOutcome::Committed(_)
    ));
    assert!(session.changes().is_empty());

    // second pass: one new item plus one revision
    session.jump_to(Category::Attitude, "at1").unwrap();
    session.select_level("attitude_level_1").unwrap();
    session.jump_to(Category::Skill, "s1").unwrap();
    session.select_level("skill_level_4").unwrap();

    let pending = session.changes();
    assert_eq!(pending.len(), 2);
    // s2 and k1 stayed at their committed baseline
    assert!(!pending.contains(&skillsync::taxonomy::ItemKey::new(Category::Skill, "s2")));
    assert!(
        !pending.contains(&skillsync::taxonomy::ItemKey::new(Category::Knowledge, "k1"))
    );
    mock.assert_hits(1);
}

#[test]
fn an_unchanged_draft_has_nothing_to_submit() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/ratings/bulk");
        then.status(200).json_body(serde_json::json!({}));
    });
    let dir = tempdir().unwrap();
    let mut session = fixture::session(&server.base_url(), dir.path(), 5);

    let outcome = session.submit(false).unwrap();
    assert!(matches!(outcome, SubmitOutcome::NothingToSubmit));
    mock.assert_hits(0);
}

#[test]
fn kaab_rows_travel_in_the_same_request_as_skills() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/ratings/bulk").json_body_includes(
            r#"{
                "skills": [{"skill_id": "s1", "skill_level": 3, "type": "skill", "user_id": "u1"}],
                "kaab": [{"skill_id": "k1", "skill_level": 2, "type": "knowledge", "user_id": "u1"}],
                "user_id": "u1",
                "sub_institute_id": "inst-1"
            }"#,
        );
        then.status(200).json_body(serde_json::json!({}));
    });
    let dir = tempdir().unwrap();
    let mut session = fixture::session(&server.base_url(), dir.path(), 5);

    session.jump_to(Category::Skill, "s1").unwrap();
    session.select_level("skill_level_3").unwrap();
    session.jump_to(Category::Knowledge, "k1").unwrap();
    session.select_level("knowledge_level_2").unwrap();

    let outcome = session.submit(false).unwrap();
    assert!(matches!(outcome, SubmitOutcome::Committed(_)));
    mock.assert_hits(1);
}
