//! Connection bootstrap utilities for the ledger store.
//!
//! # Responsibility
//! - Turn a file path (or `:memory:`) into a migrated, FK-enforcing [`Store`].
//!
//! # Invariants
//! - Returned stores have `foreign_keys=ON`. SQLite ships with enforcement off.
//! - Returned stores have migrations fully applied.
//! - Open/bootstrap failures surface as `DbError::Unavailable`.

use super::migrations::apply_migrations;
use super::session::{Store, StoreMode};
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens (or creates) a ledger database file and applies pending migrations.
///
/// # Side effects
/// - Creates `act_cats` / `act_recs` on a fresh file.
/// - Logs `event=db_open` at start and end, with elapsed milliseconds.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Store> {
    let path = path.as_ref();
    let target = path.display().to_string();
    open_with(StoreMode::File, &target, || Connection::open(path))
}

/// Opens a private in-memory ledger and applies all migrations.
pub fn open_db_in_memory() -> DbResult<Store> {
    open_with(StoreMode::Memory, ":memory:", Connection::open_in_memory)
}

fn open_with(
    mode: StoreMode,
    target: &str,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Store> {
    let started_at = Instant::now();
    info!(
        "event=db_open module=db status=start mode={}",
        mode.as_str()
    );

    let mut conn = match connect() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode.as_str(),
                started_at.elapsed().as_millis(),
                err
            );
            return Err(DbError::Unavailable {
                target: target.to_string(),
                source: err,
            });
        }
    };

    match bootstrap_connection(&mut conn) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode.as_str(),
                started_at.elapsed().as_millis()
            );
            Ok(Store::new(conn, mode))
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode.as_str(),
                started_at.elapsed().as_millis(),
                err
            );
            Err(DbError::unavailable(target, err))
        }
    }
}

fn bootstrap_connection(conn: &mut Connection) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_secs(5))?;
    apply_migrations(conn)?;
    Ok(())
}
