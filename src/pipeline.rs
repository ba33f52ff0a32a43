//! The organize run: validate → scan → (report | organize) → done.

use crate::cancel::CancelToken;
use crate::config::Config;
use crate::error::{OrganizeError, OrganizeResult};
use crate::logging::EventLog;
use crate::organizer::{FileOrganizer, OrganizeOptions, OrganizeReport};
use crate::scanner::{CategorizedFiles, ScanOptions, Scanner};
use crate::stats::Statistics;
use crate::validator::validate_directory;
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// What a run should do after scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Move medium and large files (or simulate it with `dry_run`).
    Organize { dry_run: bool },
    /// Stop after the scan and report.
    StatsOnly,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Failed,
    Cancelled,
}

/// Phases of a run, in order. No phase is entered twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Validating,
    Scanning,
    Reporting,
    Organizing,
    Done(RunStatus),
}

/// Hooks for presenting a run while it happens.
pub trait RunObserver {
    /// Called when the scan has finished, before anything is moved.
    fn on_scanned(&mut self, _root: &Path, _files: &CategorizedFiles, _stats: &Statistics) {}

    /// Return a progress bar to tick once per file the organizer handles.
    fn progress_bar(&mut self, _total: u64, _dry_run: bool) -> Option<ProgressBar> {
        None
    }
}

/// Observer that does nothing.
#[derive(Debug, Default)]
pub struct SilentObserver;

impl RunObserver for SilentObserver {}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub root: PathBuf,
    pub mode: RunMode,
    pub files: CategorizedFiles,
    pub stats: Statistics,
    /// Present unless the run was stats-only or stopped before organizing.
    pub report: Option<OrganizeReport>,
    pub status: RunStatus,
    /// The fatal error that ended an organize phase early, if any.
    pub failure: Option<OrganizeError>,
    /// Every state the run passed through.
    pub states: Vec<RunState>,
}

/// Drives a single run against one directory.
pub struct Pipeline<'a> {
    config: &'a Config,
    scan_options: ScanOptions,
    log: &'a dyn EventLog,
    cancel: Option<&'a CancelToken>,
}

impl<'a> Pipeline<'a> {
    /// # Errors
    ///
    /// Fails if `config` does not pass validation.
    pub fn new(config: &'a Config, log: &'a dyn EventLog) -> OrganizeResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            scan_options: ScanOptions::from_config(config)?,
            log,
            cancel: None,
        })
    }

    pub fn with_cancel(mut self, cancel: &'a CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(CancelToken::is_cancelled)
    }

    /// Run every phase against `directory`.
    ///
    /// # Errors
    ///
    /// Validation failures are returned as errors and nothing is touched.
    /// Once validation passes the run always yields a summary; a fatal
    /// organize failure is reported through `RunSummary::failure`.
    pub fn run(
        &self,
        directory: &Path,
        mode: RunMode,
        observer: &mut dyn RunObserver,
    ) -> OrganizeResult<RunSummary> {
        let started = Instant::now();
        let mut states = vec![RunState::NotStarted];

        self.enter(&mut states, RunState::Validating);
        let root = match validate_directory(directory) {
            Ok(root) => root,
            Err(e) => {
                self.log.error(&e.to_string());
                self.enter(&mut states, RunState::Done(RunStatus::Failed));
                return Err(e);
            }
        };
        self.log
            .info(&format!("Validated target directory: {}", root.display()));

        self.enter(&mut states, RunState::Scanning);
        let mut stats = Statistics::new();
        let mut scanner = Scanner::new(&self.scan_options, self.log);
        if let Some(cancel) = self.cancel {
            scanner = scanner.with_cancel(cancel);
        }
        let files = scanner.scan(&root, &mut stats);
        observer.on_scanned(&root, &files, &stats);

        let mut report = None;
        let mut failure = None;
        let status = if self.is_cancelled() {
            RunStatus::Cancelled
        } else {
            match mode {
                RunMode::StatsOnly => {
                    self.enter(&mut states, RunState::Reporting);
                    RunStatus::Success
                }
                RunMode::Organize { dry_run } => {
                    self.enter(&mut states, RunState::Organizing);
                    match self.organize(&root, &files, dry_run, &mut stats, observer) {
                        Ok(organized) => {
                            let status = if organized.cancelled {
                                RunStatus::Cancelled
                            } else {
                                RunStatus::Success
                            };
                            report = Some(organized);
                            status
                        }
                        Err(e) => {
                            self.log.error(&e.to_string());
                            failure = Some(e);
                            RunStatus::Failed
                        }
                    }
                }
            }
        };

        stats.execution_time = started.elapsed();
        self.enter(&mut states, RunState::Done(status));
        self.log.info(&format!(
            "Run finished ({:?}) in {:.2}s: {} scanned, {} large, {} medium moved, {} skipped, {} errors",
            status,
            stats.execution_time.as_secs_f64(),
            stats.scanned,
            stats.large,
            stats.medium,
            stats.skipped,
            stats.errors
        ));

        Ok(RunSummary {
            root,
            mode,
            files,
            stats,
            report,
            status,
            failure,
            states,
        })
    }

    fn organize(
        &self,
        root: &Path,
        files: &CategorizedFiles,
        dry_run: bool,
        stats: &mut Statistics,
        observer: &mut dyn RunObserver,
    ) -> OrganizeResult<OrganizeReport> {
        let total = (files.large.len() + files.medium.len()) as u64;
        let mut organizer = FileOrganizer::new(root, &self.config.folders, self.log);
        if let Some(cancel) = self.cancel {
            organizer = organizer.with_cancel(cancel);
        }
        if let Some(progress) = observer.progress_bar(total, dry_run) {
            organizer = organizer.with_progress(progress);
        }

        organizer.organize(
            files,
            OrganizeOptions {
                dry_run,
                backup: self.config.backup.enabled,
            },
            stats,
        )
    }

    fn enter(&self, states: &mut Vec<RunState>, next: RunState) {
        debug_assert!(!states.contains(&next), "state {:?} re-entered", next);
        self.log.debug(&format!("Run state: {:?}", next));
        states.push(next);
    }
}
