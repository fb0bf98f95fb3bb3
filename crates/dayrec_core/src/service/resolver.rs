//! Interactive label resolution and foreign-key repair.
//!
//! # Responsibility
//! - Narrow a free-text fragment to existing labels with usage counts.
//! - Repair a missing `act_cats` row after a foreign-key rejection.
//!
//! # Invariants
//! - Narrowing is case-sensitive substring matching against live data.
//! - Repair rolls back the failed write before anything else.
//! - Repair commits at most once; a failed commit is terminal for the attempt.

use crate::db::Session;
use crate::model::activity::{ActivityCategory, ActivityRecord};
use crate::repo::activity_repo::{IntegrityKind, IntegrityViolation, LabelColumn, RepoResult};
use crate::service::prompt::{is_declined, Prompter};
use log::{debug, info, warn};

/// Tally rows shown per narrowing round unless configured otherwise.
pub const SHOW_RESULTS_NO: usize = 20;

pub const ACTIVITY_GREETING: &str =
    "... Choose activity : please enter some letters for activity and hit enter >>> ";
const ACTIVITY_CHOICE_PROMPT: &str = "Complete activity choice >>  ";
const CATEGORY_CHOICE_PROMPT: &str = "... complete activity category choice >>  ";

/// Result of a narrowing session: parallel label/count lists, most used first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Narrowing {
    pub candidates: Vec<String>,
    pub counts: Vec<i64>,
    /// The fragment that ended the loop; always empty when narrowing completes.
    pub last_fragment: String,
}

impl Narrowing {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, i64)> + '_ {
        self.candidates
            .iter()
            .map(String::as_str)
            .zip(self.counts.iter().copied())
    }
}

/// Terminal state of a foreign-key repair attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairOutcome {
    Committed,
    Aborted,
}

/// Session-bound interactive helper shared by the recording and collapse flows.
pub struct Resolver<'a, 's, P: Prompter + ?Sized> {
    session: &'a Session<'s>,
    prompter: &'a mut P,
    show_results: usize,
}

impl<'a, 's, P: Prompter + ?Sized> Resolver<'a, 's, P> {
    pub fn new(session: &'a Session<'s>, prompter: &'a mut P) -> Self {
        Self::with_limit(session, prompter, SHOW_RESULTS_NO)
    }

    pub fn with_limit(session: &'a Session<'s>, prompter: &'a mut P, show_results: usize) -> Self {
        Self {
            session,
            prompter,
            show_results: show_results.max(1),
        }
    }

    pub fn session(&self) -> &'a Session<'s> {
        self.session
    }

    pub fn prompter(&mut self) -> &mut P {
        &mut *self.prompter
    }

    /// Repeatedly asks for a fragment and tallies matching values of `column`
    /// until an empty fragment is entered.
    ///
    /// Each round shows at most `show_results` rows. Returns the complete tally
    /// computed for the last non-empty fragment.
    pub fn narrow(&mut self, column: LabelColumn, greeting: &str) -> RepoResult<Narrowing> {
        let mut narrowing = Narrowing::default();
        let mut rounds = 0_u32;
        let mut fragment = self.prompter.ask(greeting);

        while !fragment.is_empty() {
            let tally = self.session.label_tally(column, &fragment, None)?;
            self.prompter
                .show_tally(&tally[..tally.len().min(self.show_results)]);

            let (candidates, counts) = tally.into_iter().map(|row| (row.label, row.count)).unzip();
            narrowing = Narrowing {
                candidates,
                counts,
                last_fragment: String::new(),
            };
            rounds += 1;
            fragment = self.prompter.ask(&format!("Re-enter? {greeting}"));
        }

        narrowing.last_fragment = fragment;
        debug!(
            "event=narrow module=resolver status=ok column={}.{} rounds={} candidates={}",
            column.table(),
            column.column(),
            rounds,
            narrowing.candidates.len()
        );
        Ok(narrowing)
    }

    /// Narrows over logged activity labels, then asks for the final label.
    pub fn choose_activity(&mut self) -> RepoResult<String> {
        let narrowing = self.narrow(LabelColumn::RecordActivity, ACTIVITY_GREETING)?;
        let choice = self
            .prompter
            .choose(ACTIVITY_CHOICE_PROMPT, &narrowing.candidates);
        Ok(choice.trim().to_string())
    }

    /// Offers to create the category row for `label` and adds it to the session.
    ///
    /// Returns `None` when the user declines or picks no category name. Nothing
    /// is committed here.
    pub fn offer_category(&mut self, label: &str) -> RepoResult<Option<ActivityCategory>> {
        let answer = self.prompter.ask(&format!(
            "... !! {label} isn't in the category table. Would you like to add it ? ([y]/n) >>> "
        ));
        if is_declined(&answer) {
            return Ok(None);
        }

        let greeting = format!("... Enter activity category for {label} >>> ");
        let narrowing = self.narrow(LabelColumn::CategoryName, &greeting)?;
        let choice = self
            .prompter
            .choose(CATEGORY_CHOICE_PROMPT, &narrowing.candidates);
        let choice = choice.trim();
        if choice.is_empty() {
            return Ok(None);
        }

        let category = ActivityCategory::new(label, choice);
        self.session.insert_category(&category)?;
        Ok(Some(category))
    }

    /// Recovers from a foreign-key rejection of `pending` by creating its category.
    ///
    /// The pending record itself is not re-submitted here.
    pub fn repair_and_retry(
        &mut self,
        violation: &IntegrityViolation,
        pending: &ActivityRecord,
    ) -> RepairOutcome {
        self.prompter.notify(&format!(
            "***** integrity violation while recording {pending}: {violation}"
        ));

        if let Err(err) = self.session.rollback() {
            self.prompter
                .notify(&format!("... ! could not roll back the failed write: {err}"));
            return RepairOutcome::Aborted;
        }
        if violation.kind != IntegrityKind::ForeignKey {
            return RepairOutcome::Aborted;
        }

        let category = match self.offer_category(&pending.activity) {
            Ok(Some(category)) => category,
            Ok(None) => {
                self.abandon();
                self.prompter.notify("... category not added.");
                info!("event=category_repair module=resolver status=aborted reason=declined");
                return RepairOutcome::Aborted;
            }
            Err(err) => {
                self.abandon();
                self.prompter
                    .notify(&format!("... ! could not add category: {err}"));
                warn!(
                    "event=category_repair module=resolver status=error error_code=insert_failed error={}",
                    err
                );
                return RepairOutcome::Aborted;
            }
        };

        match self.session.commit() {
            Ok(()) => {
                self.prompter.notify("... added...");
                info!("event=category_repair module=resolver status=ok");
                RepairOutcome::Committed
            }
            Err(err) => {
                self.abandon();
                self.prompter.notify(&format!(
                    "... ! could not commit {} : {} relationship: {err}",
                    category.activity, category.category
                ));
                warn!(
                    "event=category_repair module=resolver status=error error_code=commit_failed error={}",
                    err
                );
                RepairOutcome::Aborted
            }
        }
    }

    /// Rolls back pending writes, reporting (not propagating) a failure.
    pub(crate) fn abandon(&mut self) {
        if let Err(err) = self.session.rollback() {
            warn!(
                "event=session_rollback module=resolver status=error error={}",
                err
            );
            self.prompter
                .notify(&format!("... ! rollback failed: {err}"));
        }
    }
}
