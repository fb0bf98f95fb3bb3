//! Schema-declared default detection.
//!
//! # Responsibility
//! - Read a column's declared default from the live schema.
//! - Decide whether an entity's current column value still equals that default.
//!
//! # Invariants
//! - Only literal defaults count; `DEFAULT NULL` and expressions mean "no default".
//! - Text against text compares case-insensitively; anything else compares exactly.
//! - Classification never fails: lookup problems classify as `false`.

use crate::db::Session;
use log::warn;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension};

/// Persisted entity whose column values can be inspected by name.
pub trait Entity {
    /// Backing table name.
    const TABLE: &'static str;

    /// Current value of `column`, or `None` when the entity has no such column.
    fn column_value(&self, column: &str) -> Option<Value>;
}

/// Returns whether `record.<column>` currently holds the schema-declared default.
pub fn is_default<E: Entity>(session: &Session<'_>, column: &str, record: &E) -> bool {
    let Some(current) = record.column_value(column) else {
        return false;
    };

    match declared_default(session.connection(), E::TABLE, column) {
        Ok(Some(default)) => matches_default(&current, &default),
        Ok(None) => false,
        Err(err) => {
            warn!(
                "event=default_lookup module=db status=error table={} column={} error={}",
                E::TABLE,
                column,
                err
            );
            false
        }
    }
}

/// Compares a current value against a declared default.
pub fn matches_default(current: &Value, default: &Value) -> bool {
    match (current, default) {
        (Value::Text(current), Value::Text(default)) => {
            current.to_lowercase() == default.to_lowercase()
        }
        _ => current == default,
    }
}

/// Reads the literal default declared for `table.column`.
///
/// Returns `Ok(None)` for unknown columns and for columns without a literal default.
pub fn declared_default(
    conn: &Connection,
    table: &str,
    column: &str,
) -> rusqlite::Result<Option<Value>> {
    let raw: Option<Option<String>> = conn
        .query_row(
            "SELECT dflt_value FROM pragma_table_info(?1) WHERE name = ?2;",
            [table, column],
            |row| row.get(0),
        )
        .optional()?;

    Ok(raw.flatten().and_then(|text| parse_default_literal(&text)))
}

fn parse_default_literal(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    // Wrapped defaults such as `DEFAULT ('x')` are reported with the parentheses.
    let unwrapped = trimmed
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
        .map_or(trimmed, str::trim);

    if unwrapped.len() >= 2 && unwrapped.starts_with('\'') && unwrapped.ends_with('\'') {
        let inner = &unwrapped[1..unwrapped.len() - 1];
        return Some(Value::Text(inner.replace("''", "'")));
    }
    if unwrapped.eq_ignore_ascii_case("null") {
        return None;
    }
    if let Ok(integer) = unwrapped.parse::<i64>() {
        return Some(Value::Integer(integer));
    }
    if let Ok(real) = unwrapped.parse::<f64>() {
        return Some(Value::Real(real));
    }
    None
}
