//! Interactive tasks offered by the `dayrec` binary.

use crate::cli::Command;
use crate::input::{ask_day, ask_time};
use dayrec_core::{
    is_declined, run_collapse, ActivityRecord, CollapseOutcome, LabelColumn, Prompter,
    RecordOutcome, Resolver, Session, Store, ACTIVITY_GREETING,
};
use log::info;

const MENU_PROMPT: &str =
    "\nPlease choose the integer corresponding to task to perform (or Enter to exit): >> ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    RecordActivity,
    CollapseActivities,
}

impl TaskKind {
    pub const ALL: [TaskKind; 2] = [TaskKind::RecordActivity, TaskKind::CollapseActivities];

    pub fn title(self) -> &'static str {
        match self {
            Self::RecordActivity => "Enter activity record",
            Self::CollapseActivities => "Collapse rarely used activities",
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::RecordActivity => "record",
            Self::CollapseActivities => "collapse",
        }
    }

    /// Parses a 1-based menu choice.
    pub fn from_choice(input: &str) -> Option<Self> {
        let index = input.trim().parse::<usize>().ok()?;
        index
            .checked_sub(1)
            .and_then(|index| Self::ALL.get(index).copied())
    }
}

impl From<Command> for TaskKind {
    fn from(command: Command) -> Self {
        match command {
            Command::Record => Self::RecordActivity,
            Command::Collapse => Self::CollapseActivities,
        }
    }
}

/// Runs one task inside its own session; pending writes never outlive it.
pub fn run_task<P: Prompter + ?Sized>(
    kind: TaskKind,
    store: &mut Store,
    prompter: &mut P,
    show_results: usize,
) {
    info!("event=task_run module=cli status=start task={}", kind.as_str());
    let session = store.begin_session();
    match kind {
        TaskKind::RecordActivity => record_task(&session, prompter, show_results),
        TaskKind::CollapseActivities => collapse_task(&session, prompter, show_results),
    }
    session.close();
    info!("event=task_run module=cli status=ok task={}", kind.as_str());
}

/// Shows the task menu until an empty choice is entered.
pub fn run_menu<P: Prompter + ?Sized>(store: &mut Store, prompter: &mut P, show_results: usize) {
    loop {
        prompter.notify("\nWhat would you like to do ?");
        for (index, kind) in TaskKind::ALL.iter().enumerate() {
            prompter.notify(&format!("{}. {}", index + 1, kind.title()));
        }

        let choice = prompter.ask(MENU_PROMPT);
        if choice.trim().is_empty() {
            break;
        }
        match TaskKind::from_choice(&choice) {
            Some(kind) => run_task(kind, store, prompter, show_results),
            None => prompter.notify(&format!("... `{}` is not a listed task.", choice.trim())),
        }
    }
    prompter.notify("Bye-bye!");
}

fn record_task<P: Prompter + ?Sized>(session: &Session<'_>, prompter: &mut P, show_results: usize) {
    let day = ask_day(prompter, "Enter date: ([today]) >>> ");
    let start = ask_time(prompter, "Enter start time: ([now], eg 22:39) >>> ");
    let end = ask_time(prompter, "Enter end time: ([now], eg 22:39) >>> ");

    let mut resolver = Resolver::with_limit(session, prompter, show_results);
    let label = match resolver.choose_activity() {
        Ok(label) => label,
        Err(err) => {
            resolver
                .prompter()
                .notify(&format!("... cannot read activities: {err}"));
            return;
        }
    };

    let record = ActivityRecord::new(day, start, end, label);
    let answer = resolver
        .prompter()
        .ask(&format!("... Proceed to enter {record} ([y]/n)? >> "));
    if is_declined(&answer) {
        resolver.prompter().notify("... record discarded.");
        return;
    }

    if let RecordOutcome::Aborted(reason) = resolver.record_activity(&record) {
        info!("event=task_record module=cli status=aborted reason={reason:?}");
    }
}

fn collapse_task<P: Prompter + ?Sized>(
    session: &Session<'_>,
    prompter: &mut P,
    show_results: usize,
) {
    let mut resolver = Resolver::with_limit(session, prompter, show_results);
    let narrowing = match resolver.narrow(LabelColumn::RecordActivity, ACTIVITY_GREETING) {
        Ok(narrowing) => narrowing,
        Err(err) => {
            resolver
                .prompter()
                .notify(&format!("... cannot read activities: {err}"));
            return;
        }
    };
    if narrowing.is_empty() {
        resolver
            .prompter()
            .notify("... no activities selected; nothing to collapse.");
        return;
    }

    match run_collapse(&mut resolver, &narrowing) {
        CollapseOutcome::Committed(stats) => info!(
            "event=task_collapse module=cli status=ok changed={}",
            stats.total()
        ),
        other => info!("event=task_collapse module=cli status=skipped outcome={other:?}"),
    }
}
