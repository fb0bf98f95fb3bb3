mod common;

use common::{count_rows, record, seed_categories, seed_records, write_legacy_ledger};
use dayrec_core::db::migrations::latest_version;
use dayrec_core::db::{declared_default, open_db, open_db_in_memory, DbError};
use dayrec_core::{IntegrityKind, RecordListQuery, RepoError};
use rusqlite::types::Value;
use rusqlite::Connection;

#[test]
fn fresh_ledger_has_both_tables_and_current_version() {
    let mut store = open_db_in_memory().unwrap();
    let session = store.begin_session();
    let conn = session.connection();

    assert_eq!(schema_version(conn), latest_version());
    assert_table_exists(conn, "act_recs");
    assert_table_exists(conn, "act_cats");
    let foreign_keys: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(foreign_keys, 1);
}

#[test]
fn reopening_a_ledger_keeps_its_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("day_record.db");

    {
        let mut store = open_db(&path).unwrap();
        seed_categories(&mut store, &[("yoga", "fitness")]);
        seed_records(&mut store, &[record((10, 0), (10, 30), "yoga")]);
    }

    let mut store = open_db(&path).unwrap();
    let session = store.begin_session();
    assert_eq!(schema_version(session.connection()), latest_version());
    let records = session.list_records(&RecordListQuery::default()).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].activity, "yoga");
    assert_eq!(records[0].comment.as_deref(), Some("NFI"));
}

#[test]
fn unversioned_ledger_with_existing_tables_is_adopted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");
    write_legacy_ledger(
        &path,
        "INSERT INTO act_cats VALUES ('email', 'admin');
         INSERT INTO act_recs (day, startt, endt, a_done, comments)
            VALUES ('2024-05-06', '10:03:00.000000', '10:04:00.000000', 'email', 'NFI');",
    );

    let mut store = open_db(&path).unwrap();
    let session = store.begin_session();
    let conn = session.connection();
    assert_eq!(schema_version(conn), latest_version());
    assert_eq!(count_rows(conn, "act_cats"), 1);

    let stored_start: String = conn
        .query_row("SELECT startt FROM act_recs;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(stored_start, "10:03:00");
    assert_eq!(
        declared_default(conn, "act_recs", "comments").unwrap(),
        Some(Value::Text("NFI".to_string()))
    );

    let records = session.list_records(&RecordListQuery::default()).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].start, common::at(10, 3));
    assert_eq!(records[0].end, common::at(10, 4));
    assert_eq!(records[0].comment.as_deref(), Some("NFI"));
}

#[test]
fn adopted_ledger_enforces_interval_uniqueness() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");
    write_legacy_ledger(
        &path,
        "INSERT INTO act_cats VALUES ('email', 'admin');
         INSERT INTO act_recs (day, startt, endt, a_done, comments)
            VALUES ('2024-05-06', '10:03:00.000000', '10:04:00.000000', 'email', 'NFI');",
    );

    let mut store = open_db(&path).unwrap();
    let session = store.begin_session();
    let err = session
        .insert_record(&record((10, 3), (10, 30), "email"))
        .unwrap_err();
    match err {
        RepoError::Integrity(violation) => {
            assert_eq!(violation.kind, IntegrityKind::Uniqueness)
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn legacy_rows_the_schema_cannot_hold_refuse_the_upgrade() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");
    write_legacy_ledger(
        &path,
        "INSERT INTO act_cats VALUES ('email', 'admin');
         INSERT INTO act_recs (day, startt, endt, a_done)
            VALUES ('2024-05-06', '10:03:00.000000', '10:04:00.000000', 'email');
         INSERT INTO act_recs (day, startt, endt, a_done)
            VALUES ('2024-05-06', '10:03:00', '10:30:00', 'email');
         INSERT INTO act_recs (day, startt, endt, a_done)
            VALUES ('2024-05-06', '11:00:00', NULL, 'email');
         INSERT INTO act_recs (day, startt, endt, a_done)
            VALUES ('2024-05-07', '09:00:00', '09:30:00', 'ghost');",
    );

    let err = open_db(&path).err().unwrap();
    assert!(
        matches!(
            err,
            DbError::LegacyRowsRejected {
                incomplete: 1,
                orphaned: 1,
                clashing: 1
            }
        ),
        "unexpected error: {err}"
    );
    assert!(err.to_string().contains("cannot be upgraded"));

    // The failed upgrade leaves the file as it was.
    let conn = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&conn), 0);
    assert_eq!(count_rows(&conn, "act_recs"), 4);
}

#[test]
fn ledger_from_a_newer_build_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).err().unwrap();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unreachable_path_is_reported_as_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no-such-dir").join("ledger.db");

    let err = open_db(&path).err().unwrap();
    assert!(matches!(err, DbError::Unavailable { .. }));
    assert!(err.to_string().contains("store unavailable"));
}

#[test]
fn session_writes_are_visible_before_commit_and_discarded_on_close() {
    let mut store = open_db_in_memory().unwrap();
    seed_categories(&mut store, &[("yoga", "fitness")]);

    {
        let session = store.begin_session();
        let id = session
            .insert_record(&record((7, 0), (7, 45), "yoga"))
            .unwrap();
        assert!(session.has_pending_changes());
        assert!(session.get_record(id).unwrap().is_some());
        session.close();
    }

    {
        let session = store.begin_session();
        assert!(!session.has_pending_changes());
        assert_eq!(count_rows(session.connection(), "act_recs"), 0);
        session.insert_record(&record((7, 0), (7, 45), "yoga")).unwrap();
        // Dropped without commit.
    }

    let session = store.begin_session();
    assert_eq!(count_rows(session.connection(), "act_recs"), 0);
}

#[test]
fn commit_and_rollback_without_pending_writes_are_no_ops() {
    let mut store = open_db_in_memory().unwrap();
    let session = store.begin_session();
    session.commit().unwrap();
    session.rollback().unwrap();
    assert!(!session.has_pending_changes());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
