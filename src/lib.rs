//! sizetidy - sort files into size-tier folders
//!
//! This library scans a directory, classifies every file as small, medium
//! or large by two byte thresholds, and moves medium and large files into
//! tier folders inside the scanned directory. Runs can be simulated, limited
//! to statistics, and preceded by a JSON manifest of original locations.

pub mod cancel;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod organizer;
pub mod output;
pub mod pipeline;
pub mod scanner;
pub mod size_category;
pub mod stats;
pub mod validator;

pub use cancel::CancelToken;
pub use config::Config;
pub use error::{ConfigError, OrganizeError, OrganizeResult};
pub use logging::{EventLog, LogFacade, MemoryLog};
pub use manifest::BackupManifest;
pub use organizer::{FileOrganizer, Operation, OrganizeOptions, OrganizeReport};
pub use pipeline::{Pipeline, RunMode, RunObserver, RunState, RunStatus, RunSummary, SilentObserver};
pub use scanner::{CategorizedFiles, FileRecord, ScanOptions, Scanner};
pub use size_category::{SizeCategory, Thresholds, classify};
pub use stats::Statistics;
pub use validator::validate_directory;

pub use cli::{Cli, run_cli};
