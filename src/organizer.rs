/// File relocation into tier directories.
///
/// This module moves medium and large files into their tier folders inside
/// the scanned root. It handles folder creation, collision-safe naming,
/// cross-device moves, and the optional backup manifest written before the
/// first move.
use crate::cancel::CancelToken;
use crate::config::FolderNames;
use crate::error::{OrganizeError, OrganizeResult};
use crate::logging::EventLog;
use crate::manifest::BackupManifest;
use crate::scanner::{CategorizedFiles, FileRecord};
use crate::size_category::{SizeCategory, format_size};
use crate::stats::Statistics;
use indicatif::ProgressBar;
use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A single file relocation, performed or simulated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// Where the file was found.
    pub original_path: PathBuf,
    /// Where the file went (or would go).
    pub new_path: PathBuf,
    pub category: SizeCategory,
    pub size: u64,
}

/// What an organize pass produced besides the statistics.
#[derive(Debug, Default)]
pub struct OrganizeReport {
    /// Successful (or simulated) moves, in processing order.
    pub operations: Vec<Operation>,
    /// Files that could not be moved, with the reason.
    pub failures: Vec<(PathBuf, String)>,
    /// Path of the backup manifest, if one was written.
    pub manifest_path: Option<PathBuf>,
    /// True if an interrupt stopped the pass early.
    pub cancelled: bool,
}

/// Options for one organize pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrganizeOptions {
    pub dry_run: bool,
    pub backup: bool,
}

/// Pick a destination inside `dir` for a file called `file_name`.
///
/// If `dir/file_name` is free it is returned as is. Otherwise the smallest
/// counter starting at 1 is chosen such that `dir/{stem}_{counter}{suffix}`
/// is free. A path counts as taken if anything exists there (including a
/// dangling symlink) or if it is in `claimed`.
///
/// ```
/// use sizetidy::organizer::resolve_destination;
/// use std::collections::HashSet;
/// use std::path::{Path, PathBuf};
///
/// let mut claimed = HashSet::new();
/// claimed.insert(PathBuf::from("/nowhere/dup.bin"));
/// let dest = resolve_destination(Path::new("/nowhere"), "dup.bin", &claimed);
/// assert_eq!(dest, PathBuf::from("/nowhere/dup_1.bin"));
/// ```
pub fn resolve_destination(
    dir: &Path,
    file_name: impl AsRef<OsStr>,
    claimed: &HashSet<PathBuf>,
) -> PathBuf {
    let is_taken = |p: &Path| claimed.contains(p) || fs::symlink_metadata(p).is_ok();
    let file_name = file_name.as_ref();

    let candidate = dir.join(file_name);
    if !is_taken(&candidate) {
        return candidate;
    }

    // Built from OS strings so names that are not valid UTF-8 survive intact.
    let as_path = Path::new(file_name);
    let stem = as_path.file_stem().unwrap_or(file_name);
    let extension = as_path.extension();

    let mut counter: u64 = 1;
    loop {
        let mut name = OsString::from(stem);
        name.push(format!("_{}", counter));
        if let Some(ext) = extension {
            name.push(".");
            name.push(ext);
        }
        let candidate = dir.join(&name);
        if !is_taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Move `from` to `to`.
///
/// Tries a rename first. When source and destination are on different
/// filesystems the file is copied and the original removed. A failed copy
/// removes whatever part of the destination was written; if the original
/// cannot be removed after a good copy, the copy is removed again so the
/// file only ever ends up in one place.
pub fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => copy_then_remove(from, to),
        Err(e) => Err(e),
    }
}

fn copy_then_remove(from: &Path, to: &Path) -> io::Result<()> {
    if let Err(e) = fs::copy(from, to) {
        let _ = fs::remove_file(to);
        return Err(e);
    }
    if let Err(e) = fs::remove_file(from) {
        let _ = fs::remove_file(to);
        return Err(e);
    }
    Ok(())
}

/// Moves classified files into tier directories under a root.
pub struct FileOrganizer<'a> {
    root: &'a Path,
    folders: &'a FolderNames,
    log: &'a dyn EventLog,
    cancel: Option<&'a CancelToken>,
    progress: Option<ProgressBar>,
}

impl<'a> FileOrganizer<'a> {
    pub fn new(root: &'a Path, folders: &'a FolderNames, log: &'a dyn EventLog) -> Self {
        Self {
            root,
            folders,
            log,
            cancel: None,
            progress: None,
        }
    }

    /// Stop issuing moves once `cancel` is set.
    pub fn with_cancel(mut self, cancel: &'a CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Tick `progress` once per processed file.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Absolute path of the folder for a movable tier.
    pub fn folder_path(&self, category: SizeCategory) -> Option<PathBuf> {
        self.folders
            .for_category(category)
            .map(|name| self.root.join(name))
    }

    /// Move every medium and large file into its tier folder.
    ///
    /// In order: write the backup manifest (real runs with backup enabled),
    /// create the tier folders (real runs), then process large files and
    /// then medium files in scan order. A failure on one file is logged and
    /// counted in `stats.errors`; the batch always continues.
    ///
    /// # Errors
    ///
    /// Only the manifest write and folder creation are fatal. Both happen
    /// before any file is moved.
    pub fn organize(
        &self,
        files: &CategorizedFiles,
        options: OrganizeOptions,
        stats: &mut Statistics,
    ) -> OrganizeResult<OrganizeReport> {
        let mut report = OrganizeReport::default();

        if options.dry_run {
            self.log.info("Running in DRY RUN mode");
        } else {
            if options.backup {
                let manifest = BackupManifest::from_categorized(self.root, files);
                let path = manifest.save(self.root)?;
                self.log
                    .info(&format!("Backup manifest created: {}", path.display()));
                report.manifest_path = Some(path);
            }
            self.create_folders()?;
        }

        let mut claimed = HashSet::new();
        for (category, record) in files.movable() {
            if self.cancel.is_some_and(CancelToken::is_cancelled) {
                self.log
                    .warning("Interrupted; no further files will be moved");
                report.cancelled = true;
                break;
            }

            match self.relocate(record, category, options.dry_run, &mut claimed) {
                Ok(operation) => {
                    stats.record_moved(category);
                    report.operations.push(operation);
                }
                Err(e) => {
                    self.log
                        .error(&format!("Error moving {}: {}", record.file_name(), e));
                    stats.errors += 1;
                    report.failures.push((record.path.clone(), e.to_string()));
                }
            }

            if let Some(progress) = &self.progress {
                progress.inc(1);
            }
        }

        if let Some(progress) = &self.progress {
            progress.finish_and_clear();
        }
        Ok(report)
    }

    fn create_folders(&self) -> OrganizeResult<()> {
        for category in SizeCategory::MOVABLE {
            let Some(path) = self.folder_path(category) else {
                continue;
            };
            fs::create_dir_all(&path).map_err(|e| OrganizeError::DirectoryCreationFailed {
                path: path.clone(),
                source: e,
            })?;
            self.log
                .debug(&format!("Ensured folder exists: {}", path.display()));
        }
        Ok(())
    }

    fn relocate(
        &self,
        record: &FileRecord,
        category: SizeCategory,
        dry_run: bool,
        claimed: &mut HashSet<PathBuf>,
    ) -> OrganizeResult<Operation> {
        let folder = self.folder_path(category).ok_or_else(|| OrganizeError::FileMoveFailure {
            from: record.path.clone(),
            to: self.root.to_path_buf(),
            cause: io::Error::new(io::ErrorKind::InvalidInput, "tier is not movable"),
        })?;

        let file_name = record.path.file_name().ok_or_else(|| OrganizeError::FileMoveFailure {
            from: record.path.clone(),
            to: folder.clone(),
            cause: io::Error::new(io::ErrorKind::InvalidInput, "file has no name component"),
        })?;

        let destination = resolve_destination(&folder, file_name, claimed);

        if dry_run {
            self.log.debug(&format!(
                "Would move: {} -> {}",
                record.path.display(),
                destination.display()
            ));
        } else {
            move_file(&record.path, &destination).map_err(|e| OrganizeError::FileMoveFailure {
                from: record.path.clone(),
                to: destination.clone(),
                cause: e,
            })?;
            self.log.info(&format!(
                "Moved: {} ({}) -> {}",
                record.path.display(),
                format_size(record.size),
                destination.display()
            ));
        }

        claimed.insert(destination.clone());
        Ok(Operation {
            original_path: record.path.clone(),
            new_path: destination,
            category,
            size: record.size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemoryLog;
    use std::fs;
    use tempfile::TempDir;

    fn record(path: PathBuf, size: u64) -> FileRecord {
        FileRecord::new(path, size)
    }

    #[test]
    fn test_resolve_destination_free_name() {
        let temp = TempDir::new().unwrap();
        let dest = resolve_destination(temp.path(), "a.bin", &HashSet::new());
        assert_eq!(dest, temp.path().join("a.bin"));
    }

    #[test]
    fn test_resolve_destination_counts_up() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("name.ext"), "x").unwrap();
        assert_eq!(
            resolve_destination(temp.path(), "name.ext", &HashSet::new()),
            temp.path().join("name_1.ext")
        );

        fs::write(temp.path().join("name_1.ext"), "x").unwrap();
        assert_eq!(
            resolve_destination(temp.path(), "name.ext", &HashSet::new()),
            temp.path().join("name_2.ext")
        );
    }

    #[test]
    fn test_resolve_destination_without_extension() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("README"), "x").unwrap();
        assert_eq!(
            resolve_destination(temp.path(), "README", &HashSet::new()),
            temp.path().join("README_1")
        );
    }

    #[test]
    fn test_resolve_destination_keeps_inner_dots_in_stem() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("backup.tar.gz"), "x").unwrap();
        assert_eq!(
            resolve_destination(temp.path(), "backup.tar.gz", &HashSet::new()),
            temp.path().join("backup.tar_1.gz")
        );
    }

    #[test]
    fn test_move_file_renames() {
        let temp = TempDir::new().unwrap();
        let from = temp.path().join("a.bin");
        let to = temp.path().join("b.bin");
        fs::write(&from, "payload").unwrap();

        move_file(&from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(fs::read_to_string(&to).unwrap(), "payload");
    }

    #[test]
    fn test_move_missing_file_fails_without_creating_destination() {
        let temp = TempDir::new().unwrap();
        let to = temp.path().join("b.bin");
        assert!(move_file(&temp.path().join("missing.bin"), &to).is_err());
        assert!(!to.exists());
    }

    #[test]
    fn test_copy_then_remove_moves_content() {
        let temp = TempDir::new().unwrap();
        let from = temp.path().join("a.bin");
        let to = temp.path().join("b.bin");
        fs::write(&from, "payload").unwrap();

        copy_then_remove(&from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(fs::read_to_string(&to).unwrap(), "payload");
    }

    #[test]
    fn test_copy_then_remove_cleans_up_on_copy_failure() {
        let temp = TempDir::new().unwrap();
        let to = temp.path().join("b.bin");
        assert!(copy_then_remove(&temp.path().join("missing"), &to).is_err());
        assert!(!to.exists());
    }

    #[test]
    fn test_organize_moves_large_and_medium() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("mid.bin"), "m").unwrap();
        fs::write(root.join("big.iso"), "l").unwrap();
        fs::write(root.join("small.txt"), "s").unwrap();

        let mut files = CategorizedFiles::new();
        files.push(SizeCategory::Medium, record(root.join("mid.bin"), 1));
        files.push(SizeCategory::Large, record(root.join("big.iso"), 1));
        files.push(SizeCategory::Small, record(root.join("small.txt"), 1));

        let folders = FolderNames::default();
        let log = MemoryLog::new();
        let mut stats = Statistics::new();
        let report = FileOrganizer::new(root, &folders, &log)
            .organize(&files, OrganizeOptions::default(), &mut stats)
            .unwrap();

        assert_eq!(stats.large, 1);
        assert_eq!(stats.medium, 1);
        assert_eq!(stats.small, 0);
        assert_eq!(report.operations.len(), 2);
        assert_eq!(report.operations[0].category, SizeCategory::Large);
        assert!(root.join("above 1GB/big.iso").exists());
        assert!(root.join("1MB-1GB/mid.bin").exists());
        assert!(root.join("small.txt").exists());
        assert!(report.manifest_path.is_none());
    }

    #[test]
    fn test_organize_dry_run_touches_nothing() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir(root.join("a")).unwrap();
        fs::create_dir(root.join("b")).unwrap();
        fs::write(root.join("a/dup.bin"), "1").unwrap();
        fs::write(root.join("b/dup.bin"), "2").unwrap();

        let mut files = CategorizedFiles::new();
        files.push(SizeCategory::Large, record(root.join("a/dup.bin"), 1));
        files.push(SizeCategory::Large, record(root.join("b/dup.bin"), 1));

        let folders = FolderNames::default();
        let log = MemoryLog::new();
        let mut stats = Statistics::new();
        let report = FileOrganizer::new(root, &folders, &log)
            .organize(
                &files,
                OrganizeOptions {
                    dry_run: true,
                    backup: true,
                },
                &mut stats,
            )
            .unwrap();

        assert_eq!(stats.large, 2);
        assert!(!root.join("above 1GB").exists());
        assert!(root.join("a/dup.bin").exists());
        assert!(report.manifest_path.is_none());
        // Simulated collisions still resolve the way a real run would.
        assert_eq!(
            report.operations[1].new_path,
            root.join("above 1GB/dup_1.bin")
        );
    }

    #[test]
    fn test_organize_continues_after_single_failure() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("ok.bin"), "x").unwrap();

        let mut files = CategorizedFiles::new();
        files.push(SizeCategory::Medium, record(root.join("vanished.bin"), 9));
        files.push(SizeCategory::Medium, record(root.join("ok.bin"), 9));

        let folders = FolderNames::default();
        let log = MemoryLog::new();
        let mut stats = Statistics::new();
        let report = FileOrganizer::new(root, &folders, &log)
            .organize(&files, OrganizeOptions::default(), &mut stats)
            .unwrap();

        assert_eq!(stats.errors, 1);
        assert_eq!(stats.medium, 1);
        assert_eq!(report.failures.len(), 1);
        assert!(root.join("1MB-1GB/ok.bin").exists());
        assert!(log.contains("Error moving vanished.bin"));
    }

    #[test]
    fn test_organize_writes_manifest_before_moving() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("big.iso"), "l").unwrap();

        let mut files = CategorizedFiles::new();
        files.push(SizeCategory::Large, record(root.join("big.iso"), 1));

        let folders = FolderNames::default();
        let log = MemoryLog::new();
        let mut stats = Statistics::new();
        let report = FileOrganizer::new(root, &folders, &log)
            .organize(
                &files,
                OrganizeOptions {
                    dry_run: false,
                    backup: true,
                },
                &mut stats,
            )
            .unwrap();

        let manifest_path = report.manifest_path.expect("manifest written");
        let manifest = BackupManifest::load(&manifest_path).unwrap();
        assert_eq!(manifest.files.len(), 1);
        assert_eq!(
            manifest.files[0].original_path,
            root.join("big.iso").to_string_lossy()
        );
        let entries = log.entries();
        let manifest_at = entries
            .iter()
            .position(|(_, m)| m.contains("Backup manifest created"))
            .unwrap();
        let moved_at = entries
            .iter()
            .position(|(_, m)| m.starts_with("Moved:"))
            .unwrap();
        assert!(manifest_at < moved_at);
    }

    #[test]
    fn test_organize_fails_when_folder_cannot_be_created() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        // A plain file where the tier folder should go.
        fs::write(root.join("above 1GB"), "blocker").unwrap();
        fs::write(root.join("big.iso"), "l").unwrap();

        let mut files = CategorizedFiles::new();
        files.push(SizeCategory::Large, record(root.join("big.iso"), 1));

        let folders = FolderNames::default();
        let log = MemoryLog::new();
        let mut stats = Statistics::new();
        let result = FileOrganizer::new(root, &folders, &log).organize(
            &files,
            OrganizeOptions::default(),
            &mut stats,
        );

        assert!(matches!(
            result,
            Err(OrganizeError::DirectoryCreationFailed { .. })
        ));
        assert!(root.join("big.iso").exists());
    }

    #[test]
    fn test_organize_stops_when_cancelled() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("big.iso"), "l").unwrap();

        let mut files = CategorizedFiles::new();
        files.push(SizeCategory::Large, record(root.join("big.iso"), 1));

        let folders = FolderNames::default();
        let log = MemoryLog::new();
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut stats = Statistics::new();
        let report = FileOrganizer::new(root, &folders, &log)
            .with_cancel(&cancel)
            .organize(&files, OrganizeOptions::default(), &mut stats)
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(stats.large, 0);
        assert!(root.join("big.iso").exists());
    }

    /// Records events and raises `token` once the first file has moved.
    struct CancelAfterMove {
        inner: MemoryLog,
        token: CancelToken,
    }

    impl EventLog for CancelAfterMove {
        fn log(&self, level: log::Level, message: &str) {
            if message.starts_with("Moved:") {
                self.token.cancel();
            }
            self.inner.log(level, message);
        }
    }

    #[test]
    fn test_cancel_mid_batch_keeps_completed_moves() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("first.iso"), "1").unwrap();
        fs::write(root.join("second.iso"), "2").unwrap();

        let mut files = CategorizedFiles::new();
        files.push(SizeCategory::Large, record(root.join("first.iso"), 1));
        files.push(SizeCategory::Large, record(root.join("second.iso"), 1));

        let cancel = CancelToken::new();
        let log = CancelAfterMove {
            inner: MemoryLog::new(),
            token: cancel.clone(),
        };
        let folders = FolderNames::default();
        let mut stats = Statistics::new();
        let report = FileOrganizer::new(root, &folders, &log)
            .with_cancel(&cancel)
            .organize(&files, OrganizeOptions::default(), &mut stats)
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(stats.large, 1);
        assert_eq!(report.operations.len(), 1);
        assert!(root.join("above 1GB/first.iso").exists());
        assert!(!root.join("first.iso").exists());
        assert!(root.join("second.iso").exists());
        assert!(!root.join("above 1GB/second.iso").exists());
        assert!(log.inner.contains("Interrupted"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_names_are_kept_byte_for_byte() {
        use std::os::unix::ffi::OsStrExt;

        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let latin1 = OsStr::from_bytes(b"caf\xe9.bin");
        let other = OsStr::from_bytes(b"caf\xe8.bin");
        fs::write(root.join(latin1), "1").unwrap();
        fs::write(root.join(other), "2").unwrap();

        let mut files = CategorizedFiles::new();
        files.push(SizeCategory::Medium, record(root.join(latin1), 1));
        files.push(SizeCategory::Medium, record(root.join(other), 1));

        let folders = FolderNames::default();
        let log = MemoryLog::new();
        let mut stats = Statistics::new();
        let report = FileOrganizer::new(root, &folders, &log)
            .organize(&files, OrganizeOptions::default(), &mut stats)
            .unwrap();

        // Distinct names must not collapse into one and trigger a counter.
        assert_eq!(stats.medium, 2);
        assert_eq!(report.operations[0].new_path, root.join("1MB-1GB").join(latin1));
        assert_eq!(report.operations[1].new_path, root.join("1MB-1GB").join(other));
        assert!(root.join("1MB-1GB").join(latin1).exists());
        assert!(root.join("1MB-1GB").join(other).exists());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_resolve_destination_counter_on_non_utf8_name() {
        use std::os::unix::ffi::OsStrExt;

        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(OsStr::from_bytes(b"caf\xe9.bin")), "x").unwrap();
        assert_eq!(
            resolve_destination(
                temp.path(),
                OsStr::from_bytes(b"caf\xe9.bin"),
                &HashSet::new()
            ),
            temp.path().join(OsStr::from_bytes(b"caf\xe9_1.bin"))
        );
    }
}
