//! Command-line interface module for sizetidy.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Resolving which directory to work on
//! - Wiring configuration, logging and interrupt handling into a run
//! - Mapping the outcome to an exit code

use crate::cancel::CancelToken;
use crate::config::Config;
use crate::error::OrganizeError;
use crate::logging::{EventLog, LogFacade, init_file_logging};
use crate::output::OutputFormatter;
use crate::pipeline::{Pipeline, RunMode, RunObserver, RunStatus};
use crate::scanner::CategorizedFiles;
use crate::stats::Statistics;
use clap::Parser;
use directories::BaseDirs;
use indicatif::ProgressBar;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::{self, ExitCode};
use std::sync::atomic::{AtomicBool, Ordering};

const CANCELLED_MESSAGE: &str = "Operation cancelled by user";

/// Set while blocked on the directory prompt; an interrupt there exits at once.
static AT_PROMPT: AtomicBool = AtomicBool::new(false);

/// Sort large files into size-tier folders.
#[derive(Parser, Debug, Default)]
#[command(name = "sizetidy", version)]
#[command(
    about = "Organize files by size with logging, analytics and optional backup manifests",
    long_about = "Scans a directory and moves files at or above the medium threshold into \
                  tier folders inside it. Small files stay where they are.\n\n\
                  Exit codes:\n  \
                  0 - Success\n  \
                  1 - Validation, configuration or permission error, cancellation, or failure"
)]
pub struct Cli {
    /// Directory to organize (overrides `default_directory` from the config)
    pub directory: Option<String>,

    /// Simulate organization without moving files
    #[arg(long)]
    pub dry_run: bool,

    /// Display current configuration and exit
    #[arg(long)]
    pub show_config: bool,

    /// Show statistics without organizing files
    #[arg(long)]
    pub stats_only: bool,

    /// Configuration file to use instead of the default locations
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    fn mode(&self) -> RunMode {
        if self.stats_only {
            RunMode::StatsOnly
        } else {
            RunMode::Organize {
                dry_run: self.dry_run,
            }
        }
    }
}

/// Prints the scan summary and drives the progress bar during a run.
struct ConsoleObserver<'a> {
    config: &'a Config,
    mode: RunMode,
}

impl RunObserver for ConsoleObserver<'_> {
    fn on_scanned(&mut self, root: &Path, files: &CategorizedFiles, stats: &Statistics) {
        if let RunMode::Organize { dry_run } = self.mode {
            OutputFormatter::scan_summary(root, files, stats, self.config);
            if dry_run {
                println!();
                OutputFormatter::dry_run_notice("No files will be moved");
            }
        }
    }

    fn progress_bar(&mut self, total: u64, dry_run: bool) -> Option<ProgressBar> {
        if total == 0 {
            return None;
        }
        println!();
        OutputFormatter::info(if dry_run {
            "Simulating files..."
        } else {
            "Organizing files..."
        });
        Some(OutputFormatter::create_progress_bar(total))
    }
}

/// Runs the CLI application and returns the process exit code.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use sizetidy::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["sizetidy", "--dry-run", "/path/to/directory"]);
/// let code = run_cli(cli);
/// ```
pub fn run_cli(cli: Cli) -> ExitCode {
    let cancel = CancelToken::new();
    let handler = cancel.install_ctrlc_handler(|_| {
        if AT_PROMPT.load(Ordering::SeqCst) {
            println!();
            OutputFormatter::warning(CANCELLED_MESSAGE);
            process::exit(1);
        }
    });

    let (config, source) = match Config::load_with_source(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            OutputFormatter::error(&format!("Configuration Error: {}", e));
            return ExitCode::FAILURE;
        }
    };

    if cli.show_config {
        OutputFormatter::show_config(&config, source.as_deref());
        return ExitCode::SUCCESS;
    }

    if let Err(e) = init_file_logging(&config.logging) {
        OutputFormatter::warning(&format!(
            "File logging disabled ({}): {}",
            config.logging.file.display(),
            e
        ));
    }

    if let Err(e) = handler {
        LogFacade.warning(&format!("Could not install interrupt handler: {}", e));
    }

    let directory = match resolve_directory(cli.directory.as_deref(), &config, &cancel) {
        Ok(directory) => directory,
        Err(OrganizeError::Cancelled) => return cancelled(),
        Err(e) => {
            OutputFormatter::error(&format!("Error: {}", e));
            return ExitCode::FAILURE;
        }
    };
    if cancel.is_cancelled() {
        return cancelled();
    }

    match organize(&directory, cli.mode(), &config, &cancel) {
        Ok(RunStatus::Success) => ExitCode::SUCCESS,
        Ok(RunStatus::Cancelled) | Err(OrganizeError::Cancelled) => cancelled(),
        Ok(RunStatus::Failed) => ExitCode::FAILURE,
        Err(e) => {
            let label = match &e {
                OrganizeError::PermissionDenied { .. } => "Permission Error",
                OrganizeError::NotFound { .. }
                | OrganizeError::NotADirectory { .. }
                | OrganizeError::Config(_) => "Configuration Error",
                _ => "Unexpected error",
            };
            OutputFormatter::error(&format!("{}: {}", label, e));
            ExitCode::FAILURE
        }
    }
}

fn cancelled() -> ExitCode {
    LogFacade.warning(CANCELLED_MESSAGE);
    OutputFormatter::warning(CANCELLED_MESSAGE);
    ExitCode::FAILURE
}

/// Runs the pipeline on `directory` and prints the results.
pub fn organize(
    directory: &Path,
    mode: RunMode,
    config: &Config,
    cancel: &CancelToken,
) -> Result<RunStatus, OrganizeError> {
    let log = LogFacade;
    let pipeline = Pipeline::new(config, &log)?.with_cancel(cancel);
    let mut observer = ConsoleObserver { config, mode };
    let summary = pipeline.run(directory, mode, &mut observer)?;

    match mode {
        RunMode::StatsOnly => OutputFormatter::stats_only(&summary.files, &summary.stats),
        RunMode::Organize { dry_run } => {
            if let Some(report) = &summary.report {
                OutputFormatter::operations(&report.operations, config, dry_run);
                for (path, reason) in &report.failures {
                    OutputFormatter::error(&format!("{}: {}", path.display(), reason));
                }
            }
            if let Some(failure) = &summary.failure {
                OutputFormatter::error(&failure.to_string());
            }
            OutputFormatter::final_summary(&summary, config, dry_run);
        }
    }

    Ok(summary.status)
}

/// Pick the directory to work on: argument, then config, then a prompt.
fn resolve_directory(
    argument: Option<&str>,
    config: &Config,
    cancel: &CancelToken,
) -> Result<PathBuf, OrganizeError> {
    if let Some(dir) = argument.filter(|d| !clean_input(d).is_empty()) {
        return Ok(expand_path(dir));
    }

    if let Some(dir) = config.default_directory() {
        OutputFormatter::plain(&format!("Using configured folder path: {}", dir));
        return Ok(expand_path(dir));
    }

    let stdin = io::stdin();
    AT_PROMPT.store(true, Ordering::SeqCst);
    let input = prompt_for_directory(&mut stdin.lock(), cancel);
    AT_PROMPT.store(false, Ordering::SeqCst);
    Ok(expand_path(&input?))
}

fn prompt_for_directory(
    input: &mut impl BufRead,
    cancel: &CancelToken,
) -> Result<String, OrganizeError> {
    OutputFormatter::rule();
    OutputFormatter::plain("SIZETIDY - organize files by size");
    OutputFormatter::rule();
    print!("\nEnter folder path to organize: ");
    let _ = io::stdout().flush();

    let mut line = String::new();
    let read = input.read_line(&mut line);
    if cancel.is_cancelled() {
        return Err(OrganizeError::Cancelled);
    }
    match read {
        Err(e) if e.kind() == io::ErrorKind::Interrupted => return Err(OrganizeError::Cancelled),
        Err(_) => return Err(OrganizeError::NoDirectory),
        Ok(_) => {}
    }
    let cleaned = clean_input(&line);
    if cleaned.is_empty() {
        return Err(OrganizeError::NoDirectory);
    }
    Ok(cleaned.to_string())
}

/// Trim whitespace and one layer of surrounding quotes.
pub fn clean_input(raw: &str) -> &str {
    raw.trim().trim_matches('"').trim_matches('\'').trim()
}

/// Clean user input and expand a leading `~` to the home directory.
pub fn expand_path(raw: &str) -> PathBuf {
    let cleaned = clean_input(raw);
    let home = BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());

    match (cleaned, home) {
        ("~", Some(home)) => home,
        (path, Some(home)) if path.starts_with("~/") => home.join(&path[2..]),
        (path, _) => PathBuf::from(path),
    }
}
