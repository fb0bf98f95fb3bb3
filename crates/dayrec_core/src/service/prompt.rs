//! Console seam used by interactive services.
//!
//! Core never reads stdin or writes stdout directly; everything user-facing goes
//! through a [`Prompter`] so flows can be driven by a terminal or by a script.

use crate::repo::activity_repo::LabelCount;

/// Line-oriented user interaction.
pub trait Prompter {
    /// Shows `prompt` and returns the entered line without its line terminator.
    ///
    /// End of input is reported as the empty string.
    fn ask(&mut self, prompt: &str) -> String;

    /// Like [`Prompter::ask`], but the UI may complete the answer from `candidates`.
    fn choose(&mut self, prompt: &str, candidates: &[String]) -> String {
        let _ = candidates;
        self.ask(prompt)
    }

    /// Renders a `(label, count)` table, most used first.
    fn show_tally(&mut self, rows: &[LabelCount]);

    /// Prints a diagnostic or progress line.
    fn notify(&mut self, message: &str);
}

/// `([y]/n)` prompts: anything but an explicit no accepts.
pub fn is_declined(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "n" | "no")
}

/// `(y/[n])` prompts: only an explicit yes accepts.
pub fn is_accepted(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
