#![allow(dead_code)]

use chrono::{NaiveDate, NaiveTime};
use dayrec_core::{ActivityCategory, ActivityRecord, LabelCount, Prompter, Store};
use rusqlite::Connection;
use std::collections::VecDeque;

/// Prompter that replays canned answers and records everything shown.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    pub prompts: Vec<String>,
    pub choices: Vec<Vec<String>>,
    pub tallies: Vec<Vec<LabelCount>>,
    pub notes: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|answer| answer.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn unused_answers(&self) -> usize {
        self.answers.len()
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, prompt: &str) -> String {
        self.prompts.push(prompt.to_string());
        self.answers.pop_front().unwrap_or_default()
    }

    fn choose(&mut self, prompt: &str, candidates: &[String]) -> String {
        self.choices.push(candidates.to_vec());
        self.ask(prompt)
    }

    fn show_tally(&mut self, rows: &[LabelCount]) {
        self.tallies.push(rows.to_vec());
    }

    fn notify(&mut self, message: &str) {
        self.notes.push(message.to_string());
    }
}

pub fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()
}

pub fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

pub fn record(start: (u32, u32), end: (u32, u32), label: &str) -> ActivityRecord {
    ActivityRecord::new(day(), at(start.0, start.1), at(end.0, end.1), label)
}

pub fn seed_categories(store: &mut Store, pairs: &[(&str, &str)]) {
    let session = store.begin_session();
    for (label, category) in pairs {
        session
            .insert_category(&ActivityCategory::new(*label, *category))
            .unwrap();
    }
    session.commit().unwrap();
}

/// Inserts and commits records, returning their ids in order.
pub fn seed_records(store: &mut Store, records: &[ActivityRecord]) -> Vec<i64> {
    let session = store.begin_session();
    let ids = records
        .iter()
        .map(|record| session.insert_record(record).unwrap())
        .collect();
    session.commit().unwrap();
    ids
}

pub fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

/// Schema written by the SQLAlchemy era of the ledger: nullable columns, no
/// comment default, no interval constraints, times with microseconds.
pub const LEGACY_SCHEMA: &str = "
    CREATE TABLE act_cats (
        a_done VARCHAR(40) NOT NULL,
        a_cat VARCHAR(40),
        PRIMARY KEY (a_done)
    );
    CREATE TABLE act_recs (
        a_id INTEGER NOT NULL,
        day DATE,
        startt TIME,
        endt TIME,
        a_done VARCHAR(40),
        comments VARCHAR(50),
        PRIMARY KEY (a_id),
        FOREIGN KEY(a_done) REFERENCES act_cats (a_done)
    );
    CREATE INDEX ix_act_recs_day ON act_recs (day);
    CREATE INDEX ix_act_recs_startt ON act_recs (startt);
    CREATE INDEX ix_act_recs_a_done ON act_recs (a_done);
";

/// Writes an unversioned legacy ledger at `path` and runs `rows` against it.
pub fn write_legacy_ledger(path: &std::path::Path, rows: &str) {
    let conn = Connection::open(path).unwrap();
    // The bundled SQLite defaults to enforcement on; legacy ledgers were
    // written without it.
    conn.execute_batch("PRAGMA foreign_keys = OFF;").unwrap();
    conn.execute_batch(LEGACY_SCHEMA).unwrap();
    conn.execute_batch(rows).unwrap();
}
