//! Error types shared across the pipeline.
//!
//! `ConfigError` covers everything that can go wrong before a directory is
//! touched. `OrganizeError` covers the fatal stage-level failures of a run
//! (validation, manifest writing, folder creation) and is also the value
//! carried by a single failed file move, which the caller counts instead of
//! propagating.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    /// Invalid glob pattern in the excluded folder list.
    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidGlobPattern { pattern: String, reason: String },

    /// The large threshold is below the medium threshold.
    #[error("Invalid thresholds: large ({large} bytes) must be >= medium ({medium} bytes)")]
    InvertedThresholds { medium: u64, large: u64 },

    /// A destination folder name is empty, contains a separator, or both
    /// tiers share one name.
    #[error("Invalid destination folder name '{name}': {reason}")]
    InvalidFolderName { name: String, reason: String },

    /// Unrecognized log level string.
    #[error("Unknown log level '{0}' (expected one of: off, error, warning, info, debug, trace)")]
    InvalidLogLevel(String),

    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors raised by the organize pipeline.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The target directory does not exist.
    #[error("Source directory does not exist: {}", .path.display())]
    NotFound { path: PathBuf },

    /// The target path exists but is not a directory.
    #[error("Source path is not a directory: {}", .path.display())]
    NotADirectory { path: PathBuf },

    /// The process cannot read from or write to the target directory.
    #[error("Insufficient permissions for {}: {reason}", .path.display())]
    PermissionDenied { path: PathBuf, reason: String },

    /// Failed to create a tier directory.
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to move a file to its tier directory.
    #[error("Failed to move {} to {}: {cause}", .from.display(), .to.display())]
    FileMoveFailure {
        from: PathBuf,
        to: PathBuf,
        cause: std::io::Error,
    },

    /// Failed to persist the backup manifest.
    #[error("Failed to write backup manifest {}: {source}", .path.display())]
    ManifestWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read a previously written backup manifest.
    #[error("Failed to read backup manifest {}: {reason}", .path.display())]
    ManifestReadFailed { path: PathBuf, reason: String },

    /// No directory was given and none could be obtained.
    #[error("No directory path provided")]
    NoDirectory,

    /// The user interrupted the run.
    #[error("Operation cancelled by user")]
    Cancelled,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for pipeline operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;
