//! SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register schema migrations in strictly increasing order.
//! - Apply pending migrations atomically.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - Every ledger row survives a migration; rows a rebuild cannot carry over
//!   fail the migration with `DbError::LegacyRowsRejected` instead.

use crate::db::{DbError, DbResult};
use log::{info, warn};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
    /// Runs inside the migration transaction before `sql`.
    precheck: Option<fn(&Connection) -> DbResult<()>>,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: include_str!("0001_init.sql"),
        precheck: None,
    },
    Migration {
        version: 2,
        sql: include_str!("0002_rebuild_act_recs.sql"),
        precheck: Some(check_rebuildable_records),
    },
];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies all pending migrations on the provided connection.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        if let Some(precheck) = migration.precheck {
            precheck(&tx)?;
        }
        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
        info!(
            "event=db_migrate module=db status=ok version={}",
            migration.version
        );
    }
    tx.commit()?;

    Ok(())
}

/// Counts `act_recs` rows the canonical table would refuse.
///
/// Times compare on their first eight characters, matching the rebuild.
fn check_rebuildable_records(conn: &Connection) -> DbResult<()> {
    let count = |sql: &str| conn.query_row(sql, [], |row| row.get::<_, u64>(0));

    let incomplete = count(
        "SELECT COUNT(*) FROM act_recs
         WHERE day IS NULL OR startt IS NULL OR endt IS NULL OR a_done IS NULL;",
    )?;
    let orphaned = count(
        "SELECT COUNT(*) FROM act_recs AS r
         WHERE r.a_done IS NOT NULL
           AND NOT EXISTS (SELECT 1 FROM act_cats AS c WHERE c.a_done = r.a_done);",
    )?;
    let clashing = count(
        "SELECT
            (SELECT COUNT(*) FROM (
                SELECT 1 FROM act_recs
                WHERE day IS NOT NULL AND startt IS NOT NULL
                GROUP BY day, substr(startt, 1, 8)
                HAVING COUNT(*) > 1))
          + (SELECT COUNT(*) FROM (
                SELECT 1 FROM act_recs
                WHERE day IS NOT NULL AND endt IS NOT NULL
                GROUP BY day, substr(endt, 1, 8)
                HAVING COUNT(*) > 1));",
    )?;

    if incomplete + orphaned + clashing > 0 {
        warn!(
            "event=db_migrate module=db status=error version=2 incomplete={} orphaned={} clashing={}",
            incomplete, orphaned, clashing
        );
        return Err(DbError::LegacyRowsRejected {
            incomplete,
            orphaned,
            clashing,
        });
    }
    Ok(())
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
