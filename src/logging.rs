//! Event logging.
//!
//! Pipeline stages never call the `log` macros directly; they receive an
//! [`EventLog`] so tests can capture what was reported. [`LogFacade`]
//! forwards to the `log` crate, which [`init_file_logging`] wires to an
//! append-only log file through `simplelog`.

use crate::config::LoggingSettings;
use crate::error::ConfigError;
use log::Level;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::cell::RefCell;
use std::fs::OpenOptions;
use std::io;

/// Sink for pipeline events.
pub trait EventLog {
    fn log(&self, level: Level, message: &str);

    fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }

    fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    fn warning(&self, message: &str) {
        self.log(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }
}

/// Forwards events to the global `log` logger.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFacade;

impl EventLog for LogFacade {
    fn log(&self, level: Level, message: &str) {
        log::log!(target: "sizetidy", level, "{}", message);
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    entries: RefCell<Vec<(Level, String)>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured events in the order they were logged.
    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries.borrow().clone()
    }

    /// Messages logged at exactly `level`.
    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Returns true if any message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.borrow().iter().any(|(_, m)| m.contains(needle))
    }
}

impl EventLog for MemoryLog {
    fn log(&self, level: Level, message: &str) {
        self.entries.borrow_mut().push((level, message.to_string()));
    }
}

/// Errors from setting up the log file.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error(transparent)]
    Level(#[from] ConfigError),

    #[error("could not open log file: {0}")]
    Open(#[from] io::Error),

    #[error("a logger is already installed: {0}")]
    AlreadyInstalled(#[from] log::SetLoggerError),
}

/// Install a file logger according to `settings`.
///
/// Returns `Ok(false)` without installing anything when logging is disabled.
/// Each line carries an RFC 3339 timestamp, the level and the message.
pub fn init_file_logging(settings: &LoggingSettings) -> Result<bool, LoggingError> {
    if !settings.enabled {
        return Ok(false);
    }

    let level = settings.level_filter()?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&settings.file)?;

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .build();

    WriteLogger::init(level, config, file)?;
    Ok(true)
}
