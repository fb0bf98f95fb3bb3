//! Core logic for the day-record activity ledger.
//! This crate owns the schema, integrity rules and the record consolidation engine.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{load_config, ConfigError, DayrecConfig};
pub use db::{open_db, open_db_in_memory, DbError, Session, Store};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::activity::{ActivityCategory, ActivityRecord, ActivityValidationError};
pub use repo::activity_repo::{
    ActivityRepository, IntegrityKind, IntegrityViolation, LabelColumn, LabelCount,
    RecordListQuery, RepoError, RepoResult, SqliteActivityRepository,
};
pub use service::consolidation::{
    collapse_activities, labels_at_or_below, parse_threshold, run_collapse, CollapseAbort,
    CollapseOutcome, CollapseStats, ThresholdParseError,
};
pub use service::prompt::{is_accepted, is_declined, Prompter};
pub use service::recording::{AbortReason, RecordOutcome};
pub use service::resolver::{
    Narrowing, RepairOutcome, Resolver, ACTIVITY_GREETING, SHOW_RESULTS_NO,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
