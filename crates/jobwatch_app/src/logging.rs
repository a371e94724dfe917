//! Process logging for the jobwatch binary.
//!
//! Logs go to the terminal and to `LOG_FILE_PATH` (default
//! `./job_scraper.log`).

use std::path::PathBuf;

use jobwatch_logging::{parse_level, LogDestination};
use log::LevelFilter;

const DEFAULT_LOG_FILE: &str = "job_scraper.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: LevelFilter,
    pub file: PathBuf,
}

impl LogSettings {
    /// `DEBUG_MODE=true` wins over `LOG_LEVEL`; an unknown level name falls
    /// back to info.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let debug = lookup("DEBUG_MODE").is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));
        let level = if debug {
            LevelFilter::Debug
        } else {
            lookup("LOG_LEVEL")
                .and_then(|name| parse_level(&name))
                .unwrap_or(LevelFilter::Info)
        };
        let file = lookup("LOG_FILE_PATH")
            .map(|path| path.trim().to_string())
            .filter(|path| !path.is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());
        Self {
            level,
            file: PathBuf::from(file),
        }
    }
}

pub fn initialize(settings: &LogSettings) {
    jobwatch_logging::initialize(LogDestination::Both(settings.file.clone()), settings.level);
}
