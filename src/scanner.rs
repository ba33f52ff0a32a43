//! Directory scanning and inline classification.
//!
//! The scanner walks the target directory, filters each file through the
//! configured rules, reads its size and drops it into the matching tier
//! list. Per-file failures are logged and counted; they never stop the scan.

use crate::cancel::CancelToken;
use crate::config::{Config, normalize_extension};
use crate::error::ConfigError;
use crate::logging::EventLog;
use crate::size_category::{SizeCategory, Thresholds};
use crate::stats::{NO_EXTENSION, Statistics};
use glob::Pattern;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// A file found during the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Absolute path where the file was found.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// Lower-cased extension without the dot, or `no_extension`.
    pub extension: String,
}

impl FileRecord {
    pub fn new(path: PathBuf, size: u64) -> Self {
        let extension = extension_key(&path);
        Self {
            path,
            size,
            extension,
        }
    }

    /// The file's base name.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Histogram key for a path: lower-cased extension, or `no_extension`.
pub fn extension_key(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| NO_EXTENSION.to_string())
}

/// Scanned files grouped by tier, each list in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorizedFiles {
    pub small: Vec<FileRecord>,
    pub medium: Vec<FileRecord>,
    pub large: Vec<FileRecord>,
}

impl CategorizedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, category: SizeCategory, record: FileRecord) {
        self.get_mut(category).push(record);
    }

    pub fn get(&self, category: SizeCategory) -> &[FileRecord] {
        match category {
            SizeCategory::Small => &self.small,
            SizeCategory::Medium => &self.medium,
            SizeCategory::Large => &self.large,
        }
    }

    fn get_mut(&mut self, category: SizeCategory) -> &mut Vec<FileRecord> {
        match category {
            SizeCategory::Small => &mut self.small,
            SizeCategory::Medium => &mut self.medium,
            SizeCategory::Large => &mut self.large,
        }
    }

    pub fn count(&self, category: SizeCategory) -> usize {
        self.get(category).len()
    }

    /// Medium and large files, in processing order (large first).
    pub fn movable(&self) -> impl Iterator<Item = (SizeCategory, &FileRecord)> {
        SizeCategory::MOVABLE
            .into_iter()
            .flat_map(move |category| self.get(category).iter().map(move |r| (category, r)))
    }

    pub fn total(&self) -> usize {
        self.small.len() + self.medium.len() + self.large.len()
    }
}

/// Why a file was left out of the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Hidden,
    ExtensionNotAllowed,
    ExcludedFolder,
    DestinationFolder,
    NotRegularFile,
}

impl SkipReason {
    pub fn describe(&self) -> &'static str {
        match self {
            SkipReason::Hidden => "hidden file",
            SkipReason::ExtensionNotAllowed => "extension filter",
            SkipReason::ExcludedFolder => "excluded folder",
            SkipReason::DestinationFolder => "already organized",
            SkipReason::NotRegularFile => "not a regular file",
        }
    }
}

/// Scanner settings with patterns compiled up front.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub recursive: bool,
    pub exclude_hidden: bool,
    allowed_extensions: HashSet<String>,
    excluded_folders: Vec<Pattern>,
    destination_folders: [String; 2],
    pub thresholds: Thresholds,
}

impl ScanOptions {
    /// Build scan options from a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if an excluded-folder pattern does not compile.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            recursive: config.scan.recursive,
            exclude_hidden: config.scan.exclude_hidden,
            allowed_extensions: config
                .scan
                .allowed_extensions
                .iter()
                .map(|ext| normalize_extension(ext))
                .filter(|ext| !ext.is_empty())
                .collect(),
            excluded_folders: config.excluded_folder_patterns()?,
            destination_folders: [config.folders.medium.clone(), config.folders.large.clone()],
            thresholds: config.thresholds,
        })
    }

    /// Decide whether a file under `root` should be skipped.
    ///
    /// Rules are checked in this order and the first match wins:
    /// 1. Hidden file name (when hidden files are excluded)
    /// 2. Extension not on a non-empty allow-list
    /// 3. A parent directory matches an excluded folder pattern
    /// 4. A parent directory is one of the destination folders
    pub fn skip_reason(&self, root: &Path, file_path: &Path) -> Option<SkipReason> {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.exclude_hidden && file_name.starts_with('.') {
            return Some(SkipReason::Hidden);
        }

        if !self.allowed_extensions.is_empty() {
            let ext = file_path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            if !self.allowed_extensions.contains(&ext) {
                return Some(SkipReason::ExtensionNotAllowed);
            }
        }

        let relative = file_path.strip_prefix(root).unwrap_or(file_path);
        let parents: Vec<String> = relative
            .parent()
            .map(|parent| {
                parent
                    .components()
                    .filter_map(|c| match c {
                        Component::Normal(name) => Some(name.to_string_lossy().to_string()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        if parents
            .iter()
            .any(|dir| self.excluded_folders.iter().any(|p| p.matches(dir)))
        {
            return Some(SkipReason::ExcludedFolder);
        }

        if parents
            .iter()
            .any(|dir| self.destination_folders.iter().any(|d| d == dir))
        {
            return Some(SkipReason::DestinationFolder);
        }

        None
    }
}

/// Walks a directory and classifies what it finds.
pub struct Scanner<'a> {
    options: &'a ScanOptions,
    log: &'a dyn EventLog,
    cancel: Option<&'a CancelToken>,
}

impl<'a> Scanner<'a> {
    pub fn new(options: &'a ScanOptions, log: &'a dyn EventLog) -> Self {
        Self {
            options,
            log,
            cancel: None,
        }
    }

    /// Stop walking once `cancel` is set.
    pub fn with_cancel(mut self, cancel: &'a CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Scan `root`, updating `stats` as files are found.
    ///
    /// `root` should already have passed `validate_directory`. Entries are
    /// visited in file-name order within each directory so repeated scans of
    /// the same tree produce the same lists.
    pub fn scan(&self, root: &Path, stats: &mut Statistics) -> CategorizedFiles {
        let mut categorized = CategorizedFiles::new();
        self.log
            .info(&format!("Scanning directory: {}", root.display()));

        let mut walker = WalkDir::new(root).min_depth(1).sort_by_file_name();
        if !self.options.recursive {
            walker = walker.max_depth(1);
        }

        for entry in walker {
            if self.cancel.is_some_and(CancelToken::is_cancelled) {
                self.log.warning("Scan interrupted");
                break;
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let location = e
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| root.display().to_string());
                    self.log
                        .warning(&format!("Could not access {}: {}", location, e));
                    stats.errors += 1;
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            if let Some(reason) = self.options.skip_reason(root, path) {
                self.log.debug(&format!(
                    "Skipping file ({}): {}",
                    reason.describe(),
                    path.display()
                ));
                stats.skipped += 1;
                continue;
            }

            // Follows symlinks, so a link is sized by its target.
            let size = match std::fs::metadata(path) {
                Ok(metadata) if metadata.is_file() => metadata.len(),
                Ok(_) => {
                    self.log.debug(&format!(
                        "Skipping file ({}): {}",
                        SkipReason::NotRegularFile.describe(),
                        path.display()
                    ));
                    stats.skipped += 1;
                    continue;
                }
                Err(e) => {
                    self.log.warning(&format!(
                        "Could not access {}: {}",
                        entry.file_name().to_string_lossy(),
                        e
                    ));
                    stats.errors += 1;
                    continue;
                }
            };

            let record = FileRecord::new(path.to_path_buf(), size);
            let category = self.options.thresholds.classify(size);
            stats.record_extension(&record.extension);
            stats.scanned += 1;
            categorized.push(category, record);
        }

        self.log.info(&format!(
            "Scan finished: {} scanned, {} skipped, {} errors",
            stats.scanned, stats.skipped, stats.errors
        ));
        categorized
    }
}
