//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output, including colored output,
//! progress tracking, and the statistics blocks printed at the end of a run.

use crate::config::Config;
use crate::organizer::Operation;
use crate::pipeline::RunSummary;
use crate::scanner::CategorizedFiles;
use crate::size_category::{SizeCategory, format_size};
use crate::stats::{NO_EXTENSION, Statistics};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

/// Extensions listed in the final summary.
pub const SUMMARY_TOP_EXTENSIONS: usize = 10;
/// Extensions listed by `--stats-only`.
pub const STATS_TOP_EXTENSIONS: usize = 15;

const RULE_WIDTH: usize = 70;

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a horizontal rule.
    pub fn rule() {
        println!("{}", "=".repeat(RULE_WIDTH));
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a progress bar for file moves.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints the tier counts right after scanning.
    pub fn scan_summary(root: &Path, files: &CategorizedFiles, stats: &Statistics, config: &Config) {
        let t = &config.thresholds;
        Self::header("Scan Summary");
        println!("   Directory: {}", root.display());
        println!("   Files scanned: {}", stats.scanned);
        println!(
            "   Large files (>= {}): {}",
            format_size(t.large),
            files.count(SizeCategory::Large)
        );
        println!(
            "   Medium files ({} - {}): {}",
            format_size(t.medium),
            format_size(t.large),
            files.count(SizeCategory::Medium)
        );
        println!(
            "   Small files (< {}): {} - will remain in place",
            format_size(t.medium),
            files.count(SizeCategory::Small)
        );
        println!("   Skipped: {}", stats.skipped);
    }

    /// Prints each moved (or simulated) file grouped by destination folder.
    pub fn operations(operations: &[Operation], config: &Config, dry_run: bool) {
        for category in SizeCategory::MOVABLE {
            let in_tier: Vec<_> = operations
                .iter()
                .filter(|op| op.category == category)
                .collect();
            if in_tier.is_empty() {
                continue;
            }
            let folder = config.folders.for_category(category).unwrap_or_default();
            println!("\n📁 {}:", folder.bold());
            for op in in_tier {
                let name = op
                    .original_path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                let renamed = op
                    .new_path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .filter(|new_name| *new_name != name)
                    .map(|new_name| format!(" as {}", new_name))
                    .unwrap_or_default();
                let verb = if dry_run { "→" } else { "✓" };
                println!(
                    "   {} {} ({}){}",
                    verb.green(),
                    name,
                    format_size(op.size),
                    renamed
                );
            }
        }
    }

    /// Prints the most common extensions.
    pub fn extension_distribution(stats: &Statistics, limit: usize) {
        let top = stats.top_extensions(limit);
        if top.is_empty() {
            return;
        }
        Self::header("File Type Distribution");
        for (ext, count) in top {
            let label = if ext == NO_EXTENSION {
                "(no extension)".to_string()
            } else {
                format!(".{}", ext)
            };
            println!("   {}: {}", label, count.to_string().green());
        }
    }

    /// Prints the `--stats-only` report.
    pub fn stats_only(files: &CategorizedFiles, stats: &Statistics) {
        Self::header("Statistics Summary");
        println!("   Total files scanned: {}", stats.scanned);
        println!("   Large files: {}", files.count(SizeCategory::Large));
        println!("   Medium files: {}", files.count(SizeCategory::Medium));
        println!("   Small files: {}", files.count(SizeCategory::Small));
        if stats.skipped > 0 {
            println!("   Files skipped: {}", stats.skipped);
        }
        if stats.errors > 0 {
            println!("   {} {}", "Errors:".yellow(), stats.errors);
        }
        Self::extension_distribution(stats, STATS_TOP_EXTENSIONS);
    }

    /// Prints the closing statistics block of an organize run.
    pub fn final_summary(summary: &RunSummary, config: &Config, dry_run: bool) {
        let stats = &summary.stats;
        println!();
        Self::rule();
        let title = if dry_run { "Simulation" } else { "Organization" };
        println!("{}", format!("{} Complete!", title).bold());
        Self::rule();

        Self::header("Statistics");
        println!("   Files scanned: {}", stats.scanned);
        if stats.large > 0 {
            println!("   Large files moved: {}", stats.large);
        }
        if stats.medium > 0 {
            println!("   Medium files moved: {}", stats.medium);
        }
        if stats.skipped > 0 {
            println!("   Files skipped: {}", stats.skipped);
        }
        if stats.errors > 0 {
            println!("   {} {}", "Errors:".yellow(), stats.errors);
        }

        let moved_label = if dry_run {
            "Total files that would be moved"
        } else {
            "Total files moved"
        };
        println!("\n   {}: {}", moved_label, stats.total_moved());
        println!(
            "   Execution time: {:.2} seconds",
            stats.execution_time.as_secs_f64()
        );

        Self::extension_distribution(stats, SUMMARY_TOP_EXTENSIONS);

        if let Some(path) = summary.report.as_ref().and_then(|r| r.manifest_path.as_ref()) {
            println!("\n💾 Backup manifest: {}", path.display());
        }
        println!(
            "\n💡 Files smaller than {} were left in their original location",
            format_size(config.thresholds.medium)
        );
        if config.logging.enabled {
            println!("📝 Detailed log saved to: {}", config.logging.file.display());
        }
    }

    /// Prints the active configuration.
    pub fn show_config(config: &Config, source: Option<&Path>) {
        Self::rule();
        println!("{}", "CURRENT CONFIGURATION".bold());
        Self::rule();
        match source {
            Some(path) => println!("Config File: {}", path.display()),
            None => println!("Config File: (built-in defaults)"),
        }
        println!(
            "Folder Path: {}",
            config
                .default_directory()
                .unwrap_or("(Not set - will prompt)")
        );
        println!(
            "Medium Threshold: {} ({} bytes)",
            format_size(config.thresholds.medium),
            config.thresholds.medium
        );
        println!(
            "Large Threshold: {} ({} bytes)",
            format_size(config.thresholds.large),
            config.thresholds.large
        );
        println!("Medium Folder: {}", config.folders.medium);
        println!("Large Folder: {}", config.folders.large);
        println!("Logging Enabled: {}", config.logging.enabled);
        println!("Log File: {}", config.logging.file.display());
        println!("Log Level: {}", config.logging.level);
        println!("Recursive Scan: {}", config.scan.recursive);
        println!("Exclude Hidden: {}", config.scan.exclude_hidden);
        println!("Backup Before Move: {}", config.backup.enabled);
        if config.scan.allowed_extensions.is_empty() {
            println!("Allowed Extensions: All files");
        } else {
            println!(
                "Allowed Extensions: {}",
                config.scan.allowed_extensions.join(", ")
            );
        }
        println!(
            "Excluded Folders: {}",
            config.scan.excluded_folders.join(", ")
        );
    }
}
