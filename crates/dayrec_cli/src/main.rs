//! `dayrec` terminal entry point.
//!
//! # Responsibility
//! - Merge config file, environment and flags into one runtime config.
//! - Open the ledger once and hand it to the chosen task or the menu.

mod cli;
mod console;
mod input;
mod tasks;

use clap::Parser;
use cli::Cli;
use console::StdConsole;
use dayrec_core::{
    default_log_level, init_logging, load_config, open_db, ConfigError, DayrecConfig, DbError,
};
use log::info;
use std::fmt::{Display, Formatter};
use std::process::ExitCode;

#[derive(Debug)]
enum CliError {
    Config(ConfigError),
    Store(DbError),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "configuration error: {err}"),
            Self::Store(err) => write!(f, "cannot open ledger: {err}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<DbError> for CliError {
    fn from(err: DbError) -> Self {
        Self::Store(err)
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("dayrec: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(level) = cli.log_level {
        config.log_level = Some(level);
    }
    if let Some(dir) = cli.log_dir {
        config.log_dir = Some(dir);
    }

    start_logging(&config);

    let mut store = open_db(&config.db_path)?;
    info!(
        "event=cli_start module=cli status=ok db={} show_results={}",
        config.db_path.display(),
        config.show_results
    );

    let mut console = StdConsole::stdio();
    match cli.command {
        Some(command) => {
            tasks::run_task(command.into(), &mut store, &mut console, config.show_results)
        }
        None => tasks::run_menu(&mut store, &mut console, config.show_results),
    }
    Ok(())
}

/// Configured level, or the build default when none is set.
fn log_level_of(config: &DayrecConfig) -> &str {
    config
        .log_level
        .as_deref()
        .unwrap_or(default_log_level())
}

// Logging problems are reported but never stop the ledger from opening.
fn start_logging(config: &DayrecConfig) {
    let level = log_level_of(config);
    let Some(dir) = config.effective_log_dir() else {
        eprintln!("dayrec: logging disabled: no home directory for logs");
        return;
    };
    let dir = if dir.is_relative() {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(dir),
            Err(_) => dir,
        }
    } else {
        dir
    };

    if let Err(err) = init_logging(level, &dir) {
        eprintln!("dayrec: logging disabled: {err}");
    }
}
