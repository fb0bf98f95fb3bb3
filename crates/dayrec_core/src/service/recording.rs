//! "Record one activity" flow.
//!
//! # Responsibility
//! - Submit a drafted record (insert + commit) and route failures.
//!
//! # Invariants
//! - Foreign-key rejections go through category repair; after a committed repair
//!   the record is re-submitted exactly once.
//! - Uniqueness rejections and unclassified errors are rolled back and reported
//!   without repair.
//! - An aborted flow leaves the store as it was before the flow started, apart
//!   from a category row committed by repair.

use crate::model::activity::{ActivityRecord, ActivityValidationError};
use crate::repo::activity_repo::{IntegrityKind, IntegrityViolation, RepoError, RepoResult};
use crate::service::prompt::Prompter;
use crate::service::resolver::{RepairOutcome, Resolver};
use log::{info, warn};

/// Why a record was not stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// Field limits were violated; nothing was written.
    Invalid(ActivityValidationError),
    /// `(day, start)` or `(day, end)` already taken.
    Duplicate(IntegrityViolation),
    /// The category was not created (declined, empty or failed repair).
    CategoryMissing,
    /// Repair committed but the second submission failed.
    RetryFailed(String),
    /// Any other store failure.
    WriteFailed(String),
}

/// Terminal state of the recording flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Committed { id: i64 },
    Aborted(AbortReason),
}

impl RecordOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }
}

impl<P: Prompter + ?Sized> Resolver<'_, '_, P> {
    /// Stores `record`, repairing a missing category when the user agrees.
    pub fn record_activity(&mut self, record: &ActivityRecord) -> RecordOutcome {
        if let Err(err) = record.validate() {
            self.prompter()
                .notify(&format!("... !! record not stored: {err}"));
            return RecordOutcome::Aborted(AbortReason::Invalid(err));
        }

        let outcome = match self.submit(record) {
            Ok(id) => RecordOutcome::Committed { id },
            Err(RepoError::Integrity(violation)) if violation.kind == IntegrityKind::ForeignKey => {
                match self.repair_and_retry(&violation, record) {
                    RepairOutcome::Committed => self.resubmit(record),
                    RepairOutcome::Aborted => RecordOutcome::Aborted(AbortReason::CategoryMissing),
                }
            }
            Err(RepoError::Integrity(violation)) => {
                self.abandon();
                self.prompter().notify(&format!(
                    "... !! record not stored: {violation}. Change the conflicting time and resubmit."
                ));
                RecordOutcome::Aborted(AbortReason::Duplicate(violation))
            }
            Err(err) => {
                self.abandon();
                self.prompter()
                    .notify(&format!("... !! could not store {record}: {err}"));
                RecordOutcome::Aborted(AbortReason::WriteFailed(err.to_string()))
            }
        };

        match &outcome {
            RecordOutcome::Committed { id } => {
                self.prompter().notify("... successfully committed record.");
                info!("event=record_activity module=recording status=ok id={id}");
            }
            RecordOutcome::Aborted(reason) => warn!(
                "event=record_activity module=recording status=aborted reason={}",
                reason_code(reason)
            ),
        }
        outcome
    }

    fn submit(&self, record: &ActivityRecord) -> RepoResult<i64> {
        let session = self.session();
        let id = session.insert_record(record)?;
        session.commit()?;
        Ok(id)
    }

    fn resubmit(&mut self, record: &ActivityRecord) -> RecordOutcome {
        match self.submit(record) {
            Ok(id) => RecordOutcome::Committed { id },
            Err(err) => {
                self.abandon();
                self.prompter()
                    .notify(&format!("... !! record still not stored after repair: {err}"));
                RecordOutcome::Aborted(AbortReason::RetryFailed(err.to_string()))
            }
        }
    }
}

fn reason_code(reason: &AbortReason) -> &'static str {
    match reason {
        AbortReason::Invalid(_) => "invalid",
        AbortReason::Duplicate(_) => "duplicate",
        AbortReason::CategoryMissing => "category_missing",
        AbortReason::RetryFailed(_) => "retry_failed",
        AbortReason::WriteFailed(_) => "write_failed",
    }
}
