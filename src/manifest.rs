/// Backup manifest of original file locations.
///
/// Before any file is moved, the organizer can write a JSON record of every
/// medium and large file into the scanned root. The manifest is never
/// updated afterwards; it is the record to rebuild the old layout by hand.
use crate::error::{OrganizeError, OrganizeResult};
use crate::organizer::resolve_destination;
use crate::scanner::CategorizedFiles;
use crate::size_category::SizeCategory;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// One file as it was before the move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub original_path: String,
    pub filename: String,
    pub size: u64,
    pub category: SizeCategory,
}

/// The persisted record of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupManifest {
    /// When the manifest was created.
    pub timestamp: DateTime<Local>,
    /// The scanned root directory.
    pub source_directory: String,
    /// Large files first, then medium, each in scan order.
    pub files: Vec<ManifestEntry>,
}

impl BackupManifest {
    /// Build a manifest covering every medium and large file.
    pub fn from_categorized(source_directory: &Path, files: &CategorizedFiles) -> Self {
        let files = files
            .movable()
            .map(|(category, record)| ManifestEntry {
                original_path: record.path.to_string_lossy().to_string(),
                filename: record.file_name(),
                size: record.size,
                category,
            })
            .collect();

        Self {
            timestamp: Local::now(),
            source_directory: source_directory.to_string_lossy().to_string(),
            files,
        }
    }

    /// The file name this manifest is saved under.
    pub fn file_name(&self) -> String {
        format!(
            "backup_manifest_{}.json",
            self.timestamp.format("%Y%m%d_%H%M%S")
        )
    }

    /// Write the manifest into `dir` as pretty JSON and return its path.
    ///
    /// An existing manifest with the same name is never overwritten; the
    /// name gets a `_1`, `_2`, ... suffix instead.
    ///
    /// # Errors
    ///
    /// Returns `OrganizeError::ManifestWriteFailed` if the file cannot be
    /// created or written.
    pub fn save(&self, dir: &Path) -> OrganizeResult<PathBuf> {
        let path = resolve_destination(dir, &self.file_name(), &HashSet::new());

        let json = serde_json::to_string_pretty(self).map_err(|e| {
            OrganizeError::ManifestWriteFailed {
                path: path.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("JSON serialization failed: {}", e),
                ),
            }
        })?;

        let write = || -> std::io::Result<()> {
            let mut file = OpenOptions::new().write(true).create_new(true).open(&path)?;
            file.write_all(json.as_bytes())?;
            file.write_all(b"\n")?;
            file.sync_all()
        };

        write().map_err(|e| OrganizeError::ManifestWriteFailed {
            path: path.clone(),
            source: e,
        })?;

        Ok(path)
    }

    /// Read a manifest back from disk.
    pub fn load(path: &Path) -> OrganizeResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| OrganizeError::ManifestReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| OrganizeError::ManifestReadFailed {
            path: path.to_path_buf(),
            reason: format!("JSON parse error: {}", e),
        })
    }
}
