//! User configuration.
//!
//! Loaded from an explicit path, `$DAYREC_CONFIG`, or `~/.dayrec/config.toml`.
//! A missing file means defaults.

use crate::service::resolver::SHOW_RESULTS_NO;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DEFAULT_DB: &str = "day_record.db";
pub const CONFIG_ENV: &str = "DAYREC_CONFIG";

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, message: String },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Parse { path, message } => write!(f, "{}: {message}", path.display()),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DayrecConfig {
    /// Ledger database file.
    pub db_path: PathBuf,
    /// `trace|debug|info|warn|error`; build-mode default when unset.
    pub log_level: Option<String>,
    /// Absolute directory for rotated log files; `~/.dayrec/logs` when unset.
    pub log_dir: Option<PathBuf>,
    /// Rows shown per narrowing round.
    pub show_results: usize,
}

impl Default for DayrecConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB),
            log_level: None,
            log_dir: None,
            show_results: SHOW_RESULTS_NO,
        }
    }
}

impl DayrecConfig {
    /// Log directory to use, falling back to `~/.dayrec/logs`.
    pub fn effective_log_dir(&self) -> Option<PathBuf> {
        self.log_dir
            .clone()
            .or_else(|| dayrec_home().map(|home| home.join("logs")))
    }
}

/// Loads configuration from `explicit`, the environment, or the home default.
pub fn load_config(explicit: Option<&Path>) -> Result<DayrecConfig, ConfigError> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => config_path(),
    };

    match path {
        // An explicitly named file must exist.
        Some(path) if explicit.is_some() || path.exists() => parse_config_file(&path),
        _ => Ok(DayrecConfig::default()),
    }
}

pub fn parse_config_file(path: &Path) -> Result<DayrecConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config_str(&content).map_err(|err| match err {
        ConfigError::Parse { message, .. } => ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        },
        other => other,
    })?;
    Ok(config)
}

pub fn parse_config_str(content: &str) -> Result<DayrecConfig, ConfigError> {
    let config: DayrecConfig = toml::from_str(content).map_err(|err| ConfigError::Parse {
        path: PathBuf::new(),
        message: err.to_string(),
    })?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &DayrecConfig) -> Result<(), ConfigError> {
    if config.show_results == 0 {
        return Err(ConfigError::Invalid(
            "show_results must be at least 1".to_string(),
        ));
    }
    if config.db_path.as_os_str().is_empty() {
        return Err(ConfigError::Invalid("db_path cannot be empty".to_string()));
    }
    Ok(())
}

fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    dayrec_home().map(|home| home.join("config.toml"))
}

fn dayrec_home() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(Path::new(&home).join(".dayrec"))
}
