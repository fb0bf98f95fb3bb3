//! SQLite storage bootstrap, sessions and schema introspection.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the day-record ledger.
//! - Bring every ledger to the latest schema before it is used.
//! - Hand out one exclusive [`Session`] at a time for reads and writes.
//!
//! # Invariants
//! - The ledger schema version lives in `PRAGMA user_version`.
//! - No session exists for a ledger whose migrations failed.
//! - Every connection handed out has foreign-key enforcement enabled.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod defaults;
pub mod migrations;
mod open;
mod session;

pub use defaults::{declared_default, is_default, matches_default, Entity};
pub use open::{open_db, open_db_in_memory};
pub use session::{Session, Store, StoreMode};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    /// The store could not be opened or bootstrapped. Fatal for callers.
    Unavailable {
        target: String,
        source: rusqlite::Error,
    },
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// An adopted ledger holds rows the current schema cannot accept: rows with
    /// missing fields, labels without a category, or clashing `(day, time)` keys.
    LegacyRowsRejected {
        incomplete: u64,
        orphaned: u64,
        clashing: u64,
    },
}

impl DbError {
    pub(crate) fn unavailable(target: impl Into<String>, err: DbError) -> Self {
        match err {
            Self::Sqlite(source) => Self::Unavailable {
                target: target.into(),
                source,
            },
            other => other,
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable { target, source } => {
                write!(f, "store unavailable at `{target}`: {source}")
            }
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "ledger schema version {db_version} is newer than this build understands ({latest_supported})"
            ),
            Self::LegacyRowsRejected {
                incomplete,
                orphaned,
                clashing,
            } => write!(
                f,
                "ledger rows cannot be upgraded: {incomplete} incomplete, {orphaned} with an unknown activity, {clashing} clashing (day, time) keys"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unavailable { source, .. } => Some(source),
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } | Self::LegacyRowsRejected { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
