//! Activity label consolidation ("collapse").
//!
//! # Responsibility
//! - Rewrite every record carrying one of several labels onto one target label.
//! - Keep the old label as provenance in the record comment.
//! - Drive the interactive collapse task: threshold, target, confirmation.
//!
//! # Invariants
//! - A comment still at its schema default is replaced by the old label;
//!   any other comment gets the old label appended after a space.
//! - `collapse_activities` never commits. Only `run_collapse` commits, and only
//!   after the user confirms the reported counts.
//! - An empty label set is a no-op.

use crate::db::{is_default, Session};
use crate::model::activity::ActivityRecord;
use crate::repo::activity_repo::{RecordListQuery, RepoResult};
use crate::service::prompt::{is_accepted, Prompter};
use crate::service::resolver::{Narrowing, Resolver};
use log::{info, warn};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

const COMMENT_COLUMN: &str = "comments";

const THRESHOLD_PROMPT: &str =
    "... enter count of items at or below which will collapse to same activity >>> ";
const TARGET_PROMPT: &str = "... enter name of collapsed activity name >>> ";

/// Per-branch counts of a collapse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollapseStats {
    /// Records whose custom comment got the old label appended.
    pub concatenated: usize,
    /// Records whose default comment was replaced by the old label.
    pub replaced: usize,
}

impl CollapseStats {
    pub fn total(&self) -> usize {
        self.concatenated + self.replaced
    }
}

/// Collapse threshold was not a non-negative integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdParseError {
    pub input: String,
}

impl Display for ThresholdParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "threshold must be a non-negative integer, got `{}`",
            self.input
        )
    }
}

impl Error for ThresholdParseError {}

/// Why the collapse task stopped without committing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollapseAbort {
    Threshold(ThresholdParseError),
    EmptyTarget,
    NothingToCollapse,
    CategoryMissing,
    Store(String),
}

/// Terminal state of the collapse task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollapseOutcome {
    Committed(CollapseStats),
    /// Changes were computed, shown and rolled back on the user's answer.
    Declined(CollapseStats),
    Aborted(CollapseAbort),
}

/// Moves every record labelled with one of `labels` onto `new_label`.
///
/// Mutations stay in the session's open transaction; the caller decides whether
/// to commit.
pub fn collapse_activities(
    session: &Session<'_>,
    labels: &BTreeSet<String>,
    new_label: &str,
) -> RepoResult<CollapseStats> {
    let mut stats = CollapseStats::default();
    if labels.is_empty() {
        return Ok(stats);
    }

    let query = RecordListQuery {
        labels: Some(labels.iter().cloned().collect()),
        ..RecordListQuery::default()
    };
    for mut record in session.list_records(&query)? {
        if is_default(session, COMMENT_COLUMN, &record) {
            record.comment = Some(record.activity.clone());
            stats.replaced += 1;
        } else {
            record.comment = Some(append_provenance(&record));
            stats.concatenated += 1;
        }
        record.activity = new_label.to_string();
        session.update_record(&record)?;
    }

    info!(
        "event=collapse module=consolidation status=ok labels={} concatenated={} replaced={}",
        labels.len(),
        stats.concatenated,
        stats.replaced
    );
    Ok(stats)
}

fn append_provenance(record: &ActivityRecord) -> String {
    match record.comment.as_deref() {
        Some(comment) => format!("{comment} {}", record.activity),
        None => record.activity.clone(),
    }
}

/// Parses the "collapse at or below" count.
pub fn parse_threshold(input: &str) -> Result<u32, ThresholdParseError> {
    input.trim().parse::<u32>().map_err(|_| ThresholdParseError {
        input: input.to_string(),
    })
}

/// Labels from `narrowing` used at most `threshold` times.
pub fn labels_at_or_below(narrowing: &Narrowing, threshold: u32) -> BTreeSet<String> {
    narrowing
        .pairs()
        .filter(|(_, count)| *count <= i64::from(threshold))
        .map(|(label, _)| label.to_string())
        .collect()
}

/// Interactive collapse over the labels of a previous narrowing.
pub fn run_collapse<P: Prompter + ?Sized>(
    resolver: &mut Resolver<'_, '_, P>,
    narrowing: &Narrowing,
) -> CollapseOutcome {
    let raw_threshold = resolver.prompter().ask(THRESHOLD_PROMPT);
    let threshold = match parse_threshold(&raw_threshold) {
        Ok(threshold) => threshold,
        Err(err) => {
            resolver
                .prompter()
                .notify("... Threshold must be an integer!. Aborting collapse.");
            return CollapseOutcome::Aborted(CollapseAbort::Threshold(err));
        }
    };

    let new_label = resolver.prompter().ask(TARGET_PROMPT).trim().to_string();
    if new_label.is_empty() {
        resolver
            .prompter()
            .notify("... no target activity given. Aborting collapse.");
        return CollapseOutcome::Aborted(CollapseAbort::EmptyTarget);
    }

    let labels = labels_at_or_below(narrowing, threshold);
    if labels.is_empty() {
        resolver
            .prompter()
            .notify("... no activities at or below that count; nothing to collapse.");
        return CollapseOutcome::Aborted(CollapseAbort::NothingToCollapse);
    }
    let listed = labels.iter().cloned().collect::<Vec<_>>().join(", ");
    resolver
        .prompter()
        .notify(&format!("... collapsing: {listed}"));

    match ensure_category(resolver, &new_label) {
        Ok(true) => {}
        Ok(false) => {
            resolver.abandon();
            resolver
                .prompter()
                .notify("... target activity has no category. Aborting collapse.");
            return CollapseOutcome::Aborted(CollapseAbort::CategoryMissing);
        }
        Err(err) => return abort_on_store_error(resolver, err.to_string()),
    }

    let stats = match collapse_activities(resolver.session(), &labels, &new_label) {
        Ok(stats) => stats,
        Err(err) => return abort_on_store_error(resolver, err.to_string()),
    };

    let answer = resolver.prompter().ask(&format!(
        " ... Proceed with {} concatenations and {} replacements for {new_label} (y/[n])? >>> ",
        stats.concatenated, stats.replaced
    ));
    if !is_accepted(&answer) {
        resolver.abandon();
        resolver.prompter().notify("... collapse discarded.");
        info!(
            "event=collapse module=consolidation status=declined records={}",
            stats.total()
        );
        return CollapseOutcome::Declined(stats);
    }

    match resolver.session().commit() {
        Ok(()) => {
            resolver.prompter().notify("... collapse committed.");
            CollapseOutcome::Committed(stats)
        }
        Err(err) => abort_on_store_error(resolver, err.to_string()),
    }
}

/// Makes sure `label` has a category row, offering to create one.
fn ensure_category<P: Prompter + ?Sized>(
    resolver: &mut Resolver<'_, '_, P>,
    label: &str,
) -> RepoResult<bool> {
    if resolver.session().get_category(label)?.is_some() {
        return Ok(true);
    }
    Ok(resolver.offer_category(label)?.is_some())
}

fn abort_on_store_error<P: Prompter + ?Sized>(
    resolver: &mut Resolver<'_, '_, P>,
    message: String,
) -> CollapseOutcome {
    resolver.abandon();
    resolver
        .prompter()
        .notify(&format!("... ! collapse failed: {message}"));
    warn!(
        "event=collapse module=consolidation status=error error={}",
        message
    );
    CollapseOutcome::Aborted(CollapseAbort::Store(message))
}
