use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dayrec", version, about = "Personal time-tracking ledger")]
pub struct Cli {
    /// Ledger database path
    #[arg(long, env = "DAYREC_DB", global = true)]
    pub db: Option<PathBuf>,

    /// Config file (default: $DAYREC_CONFIG or ~/.dayrec/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Directory for rotated log files
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Task to run; without one an interactive menu is shown
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Log one activity interval
    Record,
    /// Merge rarely used activity labels into one
    Collapse,
}
