use crate::input::complete_choice;
use dayrec_core::{LabelCount, Prompter};
use log::warn;
use std::io::{self, BufRead, StdinLock, Stdout, Write};

/// Terminal prompter over any line reader and writer.
pub struct StdConsole<R, W> {
    input: R,
    output: W,
}

impl StdConsole<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> StdConsole<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn emit(&mut self, text: &str) {
        let written = self
            .output
            .write_all(text.as_bytes())
            .and_then(|()| self.output.flush());
        if let Err(err) = written {
            warn!("event=console_write module=cli status=error error={err}");
        }
    }

    #[cfg(test)]
    fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Prompter for StdConsole<R, W> {
    fn ask(&mut self, prompt: &str) -> String {
        self.emit(prompt);
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(_) => line.trim_end_matches(['\n', '\r']).to_string(),
            Err(err) => {
                warn!("event=console_read module=cli status=error error={err}");
                String::new()
            }
        }
    }

    fn choose(&mut self, prompt: &str, candidates: &[String]) -> String {
        if !candidates.is_empty() {
            let hints = candidates
                .iter()
                .enumerate()
                .map(|(index, candidate)| format!("[{}] {candidate}", index + 1))
                .collect::<Vec<_>>()
                .join("  ");
            self.emit(&format!("{hints}\n"));
        }
        let answer = self.ask(prompt);
        complete_choice(&answer, candidates)
    }

    fn show_tally(&mut self, rows: &[LabelCount]) {
        let table = render_tally(rows);
        self.emit(&table);
    }

    fn notify(&mut self, message: &str) {
        self.emit(&format!("{message}\n"));
    }
}

/// Two aligned columns: label, then right-aligned use count.
pub fn render_tally(rows: &[LabelCount]) -> String {
    let width = rows
        .iter()
        .map(|row| row.label.chars().count())
        .max()
        .unwrap_or(0)
        .max("activity".len());

    let mut table = format!("{:<width$}  {:>6}\n", "activity", "count");
    for row in rows {
        table.push_str(&format!("{:<width$}  {:>6}\n", row.label, row.count));
    }
    table
}
