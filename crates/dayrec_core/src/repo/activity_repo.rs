//! Activity ledger repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide record/category persistence over `act_recs` and `act_cats`.
//! - Classify constraint failures into typed integrity violations.
//! - Provide label usage tallies for interactive narrowing.
//!
//! # Invariants
//! - Write paths call `validate()` before SQL mutations.
//! - Integrity failures are classified by SQLite extended result code, never by
//!   message text.
//! - Repository calls never commit; transaction scope belongs to `Session`.

use crate::db::DbError;
use crate::model::activity::{
    ActivityCategory, ActivityRecord, ActivityValidationError, CATEGORIES_TABLE, RECORDS_TABLE,
};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{ffi, params, params_from_iter, Connection, ErrorCode, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const RECORD_SELECT_SQL: &str = "SELECT
    a_id,
    day,
    startt,
    endt,
    a_done,
    comments
FROM act_recs";

pub type RepoResult<T> = Result<T, RepoError>;

/// Constraint family behind a rejected write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityKind {
    /// Referenced `act_cats` row is missing.
    ForeignKey,
    /// `(day, startt)`, `(day, endt)` or a primary key collided.
    Uniqueness,
}

/// A write rejected by a foreign-key or uniqueness constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityViolation {
    pub kind: IntegrityKind,
    pub message: String,
}

impl Display for IntegrityViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            IntegrityKind::ForeignKey => "foreign key",
            IntegrityKind::Uniqueness => "uniqueness",
        };
        write!(f, "{kind} constraint violated: {}", self.message)
    }
}

impl Error for IntegrityViolation {}

/// Repository error for ledger persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ActivityValidationError),
    Integrity(IntegrityViolation),
    Db(DbError),
    NotFound(i64),
    InvalidData(String),
}

impl RepoError {
    /// Returns the integrity violation when this error is one.
    pub fn integrity(&self) -> Option<&IntegrityViolation> {
        match self {
            Self::Integrity(violation) => Some(violation),
            _ => None,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Integrity(violation) => write!(f, "{violation}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "activity record not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted ledger data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Integrity(violation) => Some(violation),
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ActivityValidationError> for RepoError {
    fn from(value: ActivityValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match integrity_kind(&value) {
            Some(kind) => Self::Integrity(IntegrityViolation {
                kind,
                message: value.to_string(),
            }),
            None => Self::Db(DbError::Sqlite(value)),
        }
    }
}

fn integrity_kind(err: &rusqlite::Error) -> Option<IntegrityKind> {
    let rusqlite::Error::SqliteFailure(failure, _) = err else {
        return None;
    };
    if failure.code != ErrorCode::ConstraintViolation {
        return None;
    }
    match failure.extended_code {
        ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Some(IntegrityKind::ForeignKey),
        ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
            Some(IntegrityKind::Uniqueness)
        }
        _ => None,
    }
}

/// Text column that narrowing can search and tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelColumn {
    /// `act_recs.a_done`: labels as used by logged records.
    RecordActivity,
    /// `act_cats.a_done`: labels that have a category.
    CategoryActivity,
    /// `act_cats.a_cat`: category names.
    CategoryName,
}

impl LabelColumn {
    pub fn table(self) -> &'static str {
        match self {
            Self::RecordActivity => RECORDS_TABLE,
            Self::CategoryActivity | Self::CategoryName => CATEGORIES_TABLE,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            Self::RecordActivity | Self::CategoryActivity => "a_done",
            Self::CategoryName => "a_cat",
        }
    }
}

/// Distinct label with the number of rows carrying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelCount {
    pub label: String,
    pub count: i64,
}

/// Query options for listing records.
#[derive(Debug, Clone, Default)]
pub struct RecordListQuery {
    /// Only records whose label is one of these. An empty list matches nothing.
    pub labels: Option<Vec<String>>,
    pub day: Option<NaiveDate>,
    pub limit: Option<u32>,
}

/// Repository interface for ledger reads and writes.
pub trait ActivityRepository {
    fn insert_record(&self, record: &ActivityRecord) -> RepoResult<i64>;
    fn update_record(&self, record: &ActivityRecord) -> RepoResult<()>;
    fn get_record(&self, id: i64) -> RepoResult<Option<ActivityRecord>>;
    fn list_records(&self, query: &RecordListQuery) -> RepoResult<Vec<ActivityRecord>>;
    fn insert_category(&self, category: &ActivityCategory) -> RepoResult<()>;
    fn get_category(&self, label: &str) -> RepoResult<Option<ActivityCategory>>;
    fn list_categories(&self) -> RepoResult<Vec<ActivityCategory>>;
    /// Distinct values of `column` containing `fragment` (case-sensitive), most used first.
    ///
    /// `None` returns every match.
    fn label_tally(
        &self,
        column: LabelColumn,
        fragment: &str,
        limit: Option<usize>,
    ) -> RepoResult<Vec<LabelCount>>;
}

/// SQLite-backed ledger repository.
pub struct SqliteActivityRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteActivityRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ActivityRepository for SqliteActivityRepository<'_> {
    fn insert_record(&self, record: &ActivityRecord) -> RepoResult<i64> {
        record.validate()?;

        match record.comment.as_deref() {
            Some(comment) => self.conn.execute(
                "INSERT INTO act_recs (day, startt, endt, a_done, comments)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    record.day,
                    record.start,
                    record.end,
                    record.activity.as_str(),
                    comment
                ],
            )?,
            // Omitting the column lets the declared default apply.
            None => self.conn.execute(
                "INSERT INTO act_recs (day, startt, endt, a_done)
                 VALUES (?1, ?2, ?3, ?4);",
                params![record.day, record.start, record.end, record.activity.as_str()],
            )?,
        };

        Ok(self.conn.last_insert_rowid())
    }

    fn update_record(&self, record: &ActivityRecord) -> RepoResult<()> {
        record.validate()?;
        let id = record
            .id
            .ok_or_else(|| RepoError::InvalidData("cannot update a record without id".into()))?;

        let changed = self.conn.execute(
            "UPDATE act_recs
             SET
                day = ?1,
                startt = ?2,
                endt = ?3,
                a_done = ?4,
                comments = ?5
             WHERE a_id = ?6;",
            params![
                record.day,
                record.start,
                record.end,
                record.activity.as_str(),
                record.comment.as_deref(),
                id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn get_record(&self, id: i64) -> RepoResult<Option<ActivityRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{RECORD_SELECT_SQL} WHERE a_id = ?1;"))?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_record_row(row)?));
        }

        Ok(None)
    }

    fn list_records(&self, query: &RecordListQuery) -> RepoResult<Vec<ActivityRecord>> {
        let mut sql = format!("{RECORD_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(labels) = &query.labels {
            if labels.is_empty() {
                return Ok(Vec::new());
            }
            let placeholders = vec!["?"; labels.len()].join(", ");
            sql.push_str(&format!(" AND a_done IN ({placeholders})"));
            bind_values.extend(labels.iter().cloned().map(Value::Text));
        }

        if let Some(day) = query.day {
            sql.push_str(" AND day = ?");
            bind_values.push(Value::Text(day.format("%F").to_string()));
        }

        sql.push_str(" ORDER BY day ASC, startt ASC, a_id ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut records = Vec::new();

        while let Some(row) = rows.next()? {
            records.push(parse_record_row(row)?);
        }

        Ok(records)
    }

    fn insert_category(&self, category: &ActivityCategory) -> RepoResult<()> {
        category.validate()?;

        self.conn.execute(
            "INSERT INTO act_cats (a_done, a_cat) VALUES (?1, ?2);",
            params![category.activity.as_str(), category.category.as_str()],
        )?;

        Ok(())
    }

    fn get_category(&self, label: &str) -> RepoResult<Option<ActivityCategory>> {
        let mut stmt = self
            .conn
            .prepare("SELECT a_done, a_cat FROM act_cats WHERE a_done = ?1;")?;

        let mut rows = stmt.query([label])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_category_row(row)?));
        }

        Ok(None)
    }

    fn list_categories(&self) -> RepoResult<Vec<ActivityCategory>> {
        let mut stmt = self
            .conn
            .prepare("SELECT a_done, a_cat FROM act_cats ORDER BY a_cat ASC, a_done ASC;")?;
        let mut rows = stmt.query([])?;
        let mut categories = Vec::new();

        while let Some(row) = rows.next()? {
            categories.push(parse_category_row(row)?);
        }

        Ok(categories)
    }

    fn label_tally(
        &self,
        column: LabelColumn,
        fragment: &str,
        limit: Option<usize>,
    ) -> RepoResult<Vec<LabelCount>> {
        let name = column.column();
        // instr() keeps the match case-sensitive; LIKE folds ASCII case in SQLite.
        let sql = format!(
            "SELECT {name} AS label, COUNT(*) AS uses
             FROM {table}
             WHERE instr({name}, ?1) > 0
             GROUP BY {name}
             ORDER BY uses DESC, label ASC
             LIMIT ?2;",
            table = column.table()
        );
        // A negative LIMIT is unbounded in SQLite.
        let limit = limit.map_or(-1, |limit| i64::try_from(limit).unwrap_or(i64::MAX));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![fragment, limit])?;
        let mut tally = Vec::new();

        while let Some(row) = rows.next()? {
            tally.push(LabelCount {
                label: row.get("label")?,
                count: row.get("uses")?,
            });
        }

        Ok(tally)
    }
}

fn parse_record_row(row: &Row<'_>) -> RepoResult<ActivityRecord> {
    let id: i64 = row.get("a_id")?;
    let day = row.get("day").map_err(|err| invalid_column(id, "day", err))?;
    let start = row
        .get("startt")
        .map_err(|err| invalid_column(id, "startt", err))?;
    let end = row
        .get("endt")
        .map_err(|err| invalid_column(id, "endt", err))?;

    Ok(ActivityRecord {
        id: Some(id),
        day,
        start,
        end,
        activity: row.get("a_done")?,
        comment: row.get("comments")?,
    })
}

fn parse_category_row(row: &Row<'_>) -> RepoResult<ActivityCategory> {
    Ok(ActivityCategory {
        activity: row.get("a_done")?,
        category: row.get::<_, Option<String>>("a_cat")?.unwrap_or_default(),
    })
}

fn invalid_column(id: i64, column: &str, err: rusqlite::Error) -> RepoError {
    RepoError::InvalidData(format!("act_recs.{column} of record {id}: {err}"))
}
