//! Store handle and unit-of-work sessions.
//!
//! # Responsibility
//! - Own the single ledger connection for the lifetime of the process.
//! - Scope reads/writes into a [`Session`] that commits or rolls back explicitly.
//!
//! # Invariants
//! - At most one session exists per store (`begin_session` takes `&mut self`).
//! - A session opens a transaction lazily, on its first write.
//! - Dropping or closing a session rolls back uncommitted writes.
//! - Writes are visible to later reads of the same session before commit.

use crate::model::activity::{ActivityCategory, ActivityRecord};
use crate::repo::activity_repo::{
    ActivityRepository, LabelColumn, LabelCount, RecordListQuery, RepoResult,
    SqliteActivityRepository,
};
use log::{debug, warn};
use rusqlite::Connection;

/// Backing kind of an open store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    File,
    Memory,
}

impl StoreMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Memory => "memory",
        }
    }
}

/// An opened, migrated ledger database.
pub struct Store {
    conn: Connection,
    mode: StoreMode,
}

impl Store {
    pub(crate) fn new(conn: Connection, mode: StoreMode) -> Self {
        Self { conn, mode }
    }

    pub fn mode(&self) -> StoreMode {
        self.mode
    }

    /// Starts a unit of work. The borrow ends when the session is closed or dropped.
    pub fn begin_session(&mut self) -> Session<'_> {
        debug!(
            "event=session_begin module=db status=ok mode={}",
            self.mode.as_str()
        );
        Session { conn: &self.conn }
    }
}

/// Exclusive read/write handle over the store.
pub struct Session<'s> {
    conn: &'s Connection,
}

impl<'s> Session<'s> {
    /// Raw connection access for schema introspection.
    pub fn connection(&self) -> &Connection {
        self.conn
    }

    pub(crate) fn repo(&self) -> SqliteActivityRepository<'s> {
        SqliteActivityRepository::new(self.conn)
    }

    /// Returns whether writes are waiting for `commit` or `rollback`.
    pub fn has_pending_changes(&self) -> bool {
        !self.conn.is_autocommit()
    }

    pub fn insert_record(&self, record: &ActivityRecord) -> RepoResult<i64> {
        self.ensure_transaction()?;
        self.repo().insert_record(record)
    }

    pub fn insert_category(&self, category: &ActivityCategory) -> RepoResult<()> {
        self.ensure_transaction()?;
        self.repo().insert_category(category)
    }

    pub fn update_record(&self, record: &ActivityRecord) -> RepoResult<()> {
        self.ensure_transaction()?;
        self.repo().update_record(record)
    }

    pub fn get_record(&self, id: i64) -> RepoResult<Option<ActivityRecord>> {
        self.repo().get_record(id)
    }

    pub fn list_records(&self, query: &RecordListQuery) -> RepoResult<Vec<ActivityRecord>> {
        self.repo().list_records(query)
    }

    pub fn get_category(&self, label: &str) -> RepoResult<Option<ActivityCategory>> {
        self.repo().get_category(label)
    }

    pub fn list_categories(&self) -> RepoResult<Vec<ActivityCategory>> {
        self.repo().list_categories()
    }

    pub fn label_tally(
        &self,
        column: LabelColumn,
        fragment: &str,
        limit: Option<usize>,
    ) -> RepoResult<Vec<LabelCount>> {
        self.repo().label_tally(column, fragment, limit)
    }

    /// Makes pending writes durable. A no-op when nothing is pending.
    pub fn commit(&self) -> RepoResult<()> {
        if self.conn.is_autocommit() {
            return Ok(());
        }
        self.conn.execute_batch("COMMIT;")?;
        debug!("event=session_commit module=db status=ok");
        Ok(())
    }

    /// Discards pending writes. A no-op when nothing is pending.
    pub fn rollback(&self) -> RepoResult<()> {
        if self.conn.is_autocommit() {
            return Ok(());
        }
        self.conn.execute_batch("ROLLBACK;")?;
        debug!("event=session_rollback module=db status=ok");
        Ok(())
    }

    /// Ends the session, discarding anything not committed.
    pub fn close(self) {}

    fn ensure_transaction(&self) -> RepoResult<()> {
        if self.conn.is_autocommit() {
            self.conn.execute_batch("BEGIN DEFERRED;")?;
        }
        Ok(())
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        if self.conn.is_autocommit() {
            return;
        }
        match self.conn.execute_batch("ROLLBACK;") {
            Ok(()) => debug!("event=session_close module=db status=ok discarded_pending=true"),
            Err(err) => warn!(
                "event=session_close module=db status=error error_code=rollback_failed error={}",
                err
            ),
        }
    }
}
