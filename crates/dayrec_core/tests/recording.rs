mod common;

use common::{count_rows, record, seed_categories, seed_records, ScriptedPrompter};
use dayrec_core::db::{open_db, open_db_in_memory};
use dayrec_core::{
    AbortReason, ActivityCategory, IntegrityKind, LabelCount, Prompter, RecordListQuery,
    RecordOutcome, RepairOutcome, RepoError, Resolver,
};

#[test]
fn known_label_is_committed_without_prompts() {
    let mut store = open_db_in_memory().unwrap();
    seed_categories(&mut store, &[("yoga", "fitness")]);

    let session = store.begin_session();
    let mut prompter = ScriptedPrompter::default();
    let outcome =
        Resolver::new(&session, &mut prompter).record_activity(&record((8, 0), (8, 45), "yoga"));

    let RecordOutcome::Committed { id } = outcome else {
        panic!("unexpected outcome: {outcome:?}");
    };
    assert!(!session.has_pending_changes());
    assert_eq!(
        session.get_record(id).unwrap().unwrap().comment.as_deref(),
        Some("NFI")
    );
    assert!(prompter.prompts.is_empty());
}

#[test]
fn approved_repair_creates_category_and_stores_the_record() {
    let mut store = open_db_in_memory().unwrap();
    seed_categories(&mut store, &[("yoga", "fitness")]);

    let session = store.begin_session();
    // create? (default yes), category fragment, end narrowing, final choice
    let mut prompter = ScriptedPrompter::new(&["", "fit", "", "fitness"]);
    let outcome =
        Resolver::new(&session, &mut prompter).record_activity(&record((9, 0), (9, 30), "yoga2"));

    assert!(outcome.is_committed());
    assert_eq!(
        session.get_category("yoga2").unwrap(),
        Some(ActivityCategory::new("yoga2", "fitness"))
    );
    let stored = session
        .list_records(&RecordListQuery {
            labels: Some(vec!["yoga2".to_string()]),
            ..RecordListQuery::default()
        })
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(prompter.choices, vec![vec!["fitness".to_string()]]);
    assert!(prompter.notes.iter().any(|note| note == "... added..."));
}

#[test]
fn declined_repair_leaves_both_tables_unchanged() {
    let mut store = open_db_in_memory().unwrap();
    seed_categories(&mut store, &[("yoga", "fitness")]);

    let session = store.begin_session();
    let mut prompter = ScriptedPrompter::new(&["n"]);
    let outcome =
        Resolver::new(&session, &mut prompter).record_activity(&record((9, 0), (9, 30), "yoga2"));

    assert_eq!(outcome, RecordOutcome::Aborted(AbortReason::CategoryMissing));
    assert!(!session.has_pending_changes());
    assert_eq!(count_rows(session.connection(), "act_cats"), 1);
    assert_eq!(count_rows(session.connection(), "act_recs"), 0);
}

#[test]
fn empty_category_choice_aborts_repair() {
    let mut store = open_db_in_memory().unwrap();

    let session = store.begin_session();
    let mut prompter = ScriptedPrompter::new(&["y", "", ""]);
    let outcome =
        Resolver::new(&session, &mut prompter).record_activity(&record((9, 0), (9, 30), "yoga2"));

    assert_eq!(outcome, RecordOutcome::Aborted(AbortReason::CategoryMissing));
    assert_eq!(count_rows(session.connection(), "act_cats"), 0);
    assert_eq!(count_rows(session.connection(), "act_recs"), 0);
}

#[test]
fn repair_commits_category_only() {
    let mut store = open_db_in_memory().unwrap();
    let session = store.begin_session();
    let pending = record((9, 0), (9, 30), "yoga2");

    let err = session.insert_record(&pending).unwrap_err();
    let violation = err.integrity().cloned().unwrap();
    assert_eq!(violation.kind, IntegrityKind::ForeignKey);

    let mut prompter = ScriptedPrompter::new(&["", "", "fitness"]);
    let outcome = Resolver::new(&session, &mut prompter).repair_and_retry(&violation, &pending);

    assert_eq!(outcome, RepairOutcome::Committed);
    assert_eq!(count_rows(session.connection(), "act_cats"), 1);
    assert_eq!(count_rows(session.connection(), "act_recs"), 0);
}

#[test]
fn duplicate_start_time_is_rejected_and_first_record_kept() {
    let mut store = open_db_in_memory().unwrap();
    seed_categories(&mut store, &[("yoga", "fitness"), ("email", "comms")]);
    let ids = seed_records(&mut store, &[record((10, 0), (10, 30), "yoga")]);

    let session = store.begin_session();
    let mut prompter = ScriptedPrompter::default();
    let outcome = Resolver::new(&session, &mut prompter)
        .record_activity(&record((10, 0), (11, 0), "email"));

    match outcome {
        RecordOutcome::Aborted(AbortReason::Duplicate(violation)) => {
            assert_eq!(violation.kind, IntegrityKind::Uniqueness)
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(!session.has_pending_changes());
    let all = session.list_records(&RecordListQuery::default()).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, Some(ids[0]));
    assert!(prompter.prompts.is_empty());
}

#[test]
fn duplicate_end_time_is_a_uniqueness_violation() {
    let mut store = open_db_in_memory().unwrap();
    seed_categories(&mut store, &[("yoga", "fitness")]);
    seed_records(&mut store, &[record((10, 0), (10, 30), "yoga")]);

    let session = store.begin_session();
    let err = session
        .insert_record(&record((10, 15), (10, 30), "yoga"))
        .unwrap_err();
    match err {
        RepoError::Integrity(violation) => assert_eq!(violation.kind, IntegrityKind::Uniqueness),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn same_times_on_another_day_are_allowed() {
    let mut store = open_db_in_memory().unwrap();
    seed_categories(&mut store, &[("yoga", "fitness")]);
    seed_records(&mut store, &[record((10, 0), (10, 30), "yoga")]);

    let mut next_day = record((10, 0), (10, 30), "yoga");
    next_day.day = next_day.day.succ_opt().unwrap();

    let session = store.begin_session();
    let mut prompter = ScriptedPrompter::default();
    let outcome = Resolver::new(&session, &mut prompter).record_activity(&next_day);
    assert!(outcome.is_committed());
}

#[test]
fn clashing_time_with_unknown_label_is_reported_without_repair() {
    let mut store = open_db_in_memory().unwrap();
    seed_categories(&mut store, &[("yoga", "fitness")]);
    seed_records(&mut store, &[record((10, 0), (10, 30), "yoga")]);

    let session = store.begin_session();
    let mut prompter = ScriptedPrompter::new(&["", "", "fitness"]);
    let outcome = Resolver::new(&session, &mut prompter)
        .record_activity(&record((10, 0), (10, 45), "pilates"));

    assert!(matches!(
        outcome,
        RecordOutcome::Aborted(AbortReason::Duplicate(_))
    ));
    assert!(prompter.prompts.is_empty());
    assert!(session.get_category("pilates").unwrap().is_none());
    assert_eq!(count_rows(session.connection(), "act_recs"), 1);
    assert!(!session.has_pending_changes());
}

#[test]
fn invalid_record_is_rejected_before_any_write() {
    let mut store = open_db_in_memory().unwrap();

    let session = store.begin_session();
    let mut prompter = ScriptedPrompter::default();
    let outcome = Resolver::new(&session, &mut prompter)
        .record_activity(&record((10, 0), (10, 30), &"x".repeat(41)));

    assert!(matches!(
        outcome,
        RecordOutcome::Aborted(AbortReason::Invalid(_))
    ));
    assert!(!session.has_pending_changes());
}

/// Scripted prompter that runs `after_repair` once the repaired category is committed.
struct InterleavedPrompter<F: FnMut()> {
    script: ScriptedPrompter,
    after_repair: F,
}

impl<F: FnMut()> Prompter for InterleavedPrompter<F> {
    fn ask(&mut self, prompt: &str) -> String {
        self.script.ask(prompt)
    }

    fn choose(&mut self, prompt: &str, candidates: &[String]) -> String {
        self.script.choose(prompt, candidates)
    }

    fn show_tally(&mut self, rows: &[LabelCount]) {
        self.script.show_tally(rows)
    }

    fn notify(&mut self, message: &str) {
        if message == "... added..." {
            (self.after_repair)();
        }
        self.script.notify(message);
    }
}

#[test]
fn resubmission_after_repair_can_still_fail() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("day_record.db");
    let mut store = open_db(&path).unwrap();
    seed_categories(&mut store, &[("yoga", "fitness")]);

    // Another writer takes 09:00 between the repair and the second submission.
    let mut other = open_db(&path).unwrap();
    let mut prompter = InterleavedPrompter {
        script: ScriptedPrompter::new(&["", "fit", "", "fitness"]),
        after_repair: move || {
            let session = other.begin_session();
            session
                .insert_record(&record((9, 0), (9, 15), "yoga"))
                .unwrap();
            session.commit().unwrap();
        },
    };

    let session = store.begin_session();
    let outcome =
        Resolver::new(&session, &mut prompter).record_activity(&record((9, 0), (9, 30), "yoga2"));

    assert!(
        matches!(outcome, RecordOutcome::Aborted(AbortReason::RetryFailed(_))),
        "unexpected outcome: {outcome:?}"
    );
    assert!(!session.has_pending_changes());
    assert!(session.get_category("yoga2").unwrap().is_some());
    let stored = session.list_records(&RecordListQuery::default()).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].activity, "yoga");
    assert!(prompter
        .script
        .notes
        .iter()
        .any(|note| note.contains("still not stored after repair")));
}
