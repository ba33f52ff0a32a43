//! Run configuration.
//!
//! This module loads the immutable configuration every pipeline stage reads
//! from. Configuration lives in a TOML file; every key is optional and falls
//! back to the defaults shown below.
//!
//! # Configuration File Format
//!
//! ```toml
//! default_directory = "~/Downloads"
//!
//! [thresholds]
//! medium = 1048576       # 1 MiB
//! large = 1073741824     # 1 GiB
//!
//! [folders]
//! medium = "1MB-1GB"
//! large = "above 1GB"
//!
//! [scan]
//! recursive = true
//! exclude_hidden = true
//! allowed_extensions = []           # empty means every extension
//! excluded_folders = [".git", "node_modules", "__pycache__", ".vscode"]
//!
//! [backup]
//! enabled = false
//!
//! [logging]
//! enabled = true
//! file = "sizetidy.log"
//! level = "info"
//! ```

use crate::error::ConfigError;
use crate::size_category::{SizeCategory, Thresholds};
use directories::ProjectDirs;
use glob::Pattern;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".sizetidy.toml";

/// Complete configuration for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Directory to organize when none is given on the command line.
    #[serde(default)]
    pub default_directory: Option<String>,

    #[serde(default)]
    pub thresholds: Thresholds,

    #[serde(default)]
    pub folders: FolderNames,

    #[serde(default)]
    pub scan: ScanSettings,

    #[serde(default)]
    pub backup: BackupSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Names of the tier subdirectories created inside the scanned root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderNames {
    #[serde(default = "default_medium_folder")]
    pub medium: String,
    #[serde(default = "default_large_folder")]
    pub large: String,
}

fn default_medium_folder() -> String {
    "1MB-1GB".to_string()
}

fn default_large_folder() -> String {
    "above 1GB".to_string()
}

impl Default for FolderNames {
    fn default() -> Self {
        Self {
            medium: default_medium_folder(),
            large: default_large_folder(),
        }
    }
}

impl FolderNames {
    /// Returns the destination folder name for a tier, or `None` for `Small`.
    pub fn for_category(&self, category: SizeCategory) -> Option<&str> {
        match category {
            SizeCategory::Small => None,
            SizeCategory::Medium => Some(&self.medium),
            SizeCategory::Large => Some(&self.large),
        }
    }
}

/// Which files the scanner looks at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Descend into subdirectories.
    #[serde(default = "default_true")]
    pub recursive: bool,

    /// Skip files whose name starts with a dot.
    #[serde(default = "default_true")]
    pub exclude_hidden: bool,

    /// Only process these extensions (case-insensitive, leading dot optional).
    /// Empty means every extension.
    #[serde(default)]
    pub allowed_extensions: Vec<String>,

    /// Folder names (or glob patterns) whose contents are never processed.
    #[serde(default = "default_excluded_folders")]
    pub excluded_folders: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_excluded_folders() -> Vec<String> {
    [".git", "node_modules", "__pycache__", ".vscode"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            recursive: true,
            exclude_hidden: true,
            allowed_extensions: Vec::new(),
            excluded_folders: default_excluded_folders(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackupSettings {
    /// Write a JSON manifest of original locations before moving anything.
    #[serde(default)]
    pub enabled: bool,
}

/// Log file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log file path. Relative paths resolve against the working directory.
    #[serde(default = "default_log_file")]
    pub file: PathBuf,

    /// One of off, error, warning, info, debug, trace.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_file() -> PathBuf {
    PathBuf::from("sizetidy.log")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            file: default_log_file(),
            level: default_log_level(),
        }
    }
}

impl LoggingSettings {
    /// Parses the configured level. `warning` is accepted as an alias of `warn`.
    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        let normalized = self.level.trim().to_lowercase();
        let normalized = if normalized == "warning" {
            "warn".to_string()
        } else {
            normalized
        };
        normalized
            .parse::<LevelFilter>()
            .map_err(|_| ConfigError::InvalidLogLevel(self.level.clone()))
    }
}

impl Config {
    /// Load configuration, falling back through the usual locations.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.sizetidy.toml` in the current directory
    /// 3. Look for `config.toml` in the platform config directory
    ///    (e.g. `~/.config/sizetidy/config.toml`)
    /// 4. Fall back to default configuration
    ///
    /// The loaded configuration is validated before it is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly provided file cannot be read, if any
    /// file found fails to parse, or if validation fails.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_source(config_path).map(|(config, _)| config)
    }

    /// Like [`Config::load`], also returning the file that was read, if any.
    pub fn load_with_source(
        config_path: Option<&Path>,
    ) -> Result<(Self, Option<PathBuf>), ConfigError> {
        let source = Self::locate(config_path);
        let config = match &source {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok((config, source))
    }

    fn locate(config_path: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = config_path {
            return Some(path.to_path_buf());
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Some(local_config);
        }

        ProjectDirs::from("", "", "sizetidy")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .filter(|path| path.exists())
    }

    /// Load configuration from a specific file without validating it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if the file does not exist,
    /// `ConfigError::ConfigInvalid` if TOML parsing fails and
    /// `ConfigError::IoError` if the file cannot be read.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config =
            toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))?;
        config.scan.allowed_extensions = config
            .scan
            .allowed_extensions
            .iter()
            .map(|ext| normalize_extension(ext))
            .filter(|ext| !ext.is_empty())
            .collect();
        Ok(config)
    }

    /// Check the invariants every stage relies on.
    ///
    /// # Errors
    ///
    /// Fails on inverted thresholds, empty or clashing folder names, an
    /// unknown log level, or an unparsable excluded-folder pattern.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.thresholds.is_ordered() {
            return Err(ConfigError::InvertedThresholds {
                medium: self.thresholds.medium,
                large: self.thresholds.large,
            });
        }

        for name in [&self.folders.medium, &self.folders.large] {
            validate_folder_name(name)?;
        }
        if self.folders.medium == self.folders.large {
            return Err(ConfigError::InvalidFolderName {
                name: self.folders.medium.clone(),
                reason: "medium and large tiers must use different folders".to_string(),
            });
        }

        self.logging.level_filter()?;
        self.excluded_folder_patterns()?;
        Ok(())
    }

    /// Compile the excluded folder entries into glob patterns.
    pub fn excluded_folder_patterns(&self) -> Result<Vec<Pattern>, ConfigError> {
        self.scan
            .excluded_folders
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|e| ConfigError::InvalidGlobPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    /// The configured default directory, if set to something non-blank.
    pub fn default_directory(&self) -> Option<&str> {
        self.default_directory
            .as_deref()
            .map(str::trim)
            .filter(|dir| !dir.is_empty())
    }
}

fn validate_folder_name(name: &str) -> Result<(), ConfigError> {
    let reason = if name.trim().is_empty() {
        "name is empty"
    } else if name.contains('/') || name.contains('\\') {
        "name must not contain a path separator"
    } else if name == "." || name == ".." {
        "name must not refer to the current or parent directory"
    } else {
        return Ok(());
    };
    Err(ConfigError::InvalidFolderName {
        name: name.to_string(),
        reason: reason.to_string(),
    })
}

/// Lower-cases an extension and strips a leading dot.
///
/// ```
/// use sizetidy::config::normalize_extension;
///
/// assert_eq!(normalize_extension(".PDF"), "pdf");
/// assert_eq!(normalize_extension("mp4"), "mp4");
/// ```
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.thresholds, Thresholds::default());
        assert!(config.scan.recursive);
        assert!(config.scan.exclude_hidden);
        assert!(!config.backup.enabled);
        assert!(config.scan.excluded_folders.contains(&".git".to_string()));
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.folders, FolderNames::default());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.scan.excluded_folders.len(), 4);
    }

    #[test]
    fn test_partial_sections_fill_in_defaults() {
        let config = Config::from_toml(
            r#"
            [thresholds]
            medium = 10

            [folders]
            large = "huge"
            "#,
        )
        .unwrap();
        assert_eq!(config.thresholds.medium, 10);
        assert_eq!(config.thresholds.large, crate::size_category::GIB);
        assert_eq!(config.folders.large, "huge");
        assert_eq!(config.folders.medium, "1MB-1GB");
    }

    #[test]
    fn test_allowed_extensions_are_normalized() {
        let config = Config::from_toml(
            r#"
            [scan]
            allowed_extensions = [".PDF", "Mp4", "", "."]
            "#,
        )
        .unwrap();
        assert_eq!(config.scan.allowed_extensions, vec!["pdf", "mp4"]);
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let config = Config::from_toml(
            r#"
            [thresholds]
            medium = 2000
            large = 1000
            "#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvertedThresholds {
                medium: 2000,
                large: 1000
            }
        ));
    }

    #[test]
    fn test_same_folder_names_rejected() {
        let mut config = Config::default();
        config.folders.large = config.folders.medium.clone();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidFolderName { .. })
        ));
    }

    #[test]
    fn test_folder_name_with_separator_rejected() {
        let mut config = Config::default();
        config.folders.medium = "a/b".to_string();
        assert!(config.validate().is_err());
        config.folders.medium = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_level_parsing() {
        let mut logging = LoggingSettings::default();
        assert_eq!(logging.level_filter().unwrap(), LevelFilter::Info);
        logging.level = "WARNING".to_string();
        assert_eq!(logging.level_filter().unwrap(), LevelFilter::Warn);
        logging.level = "debug".to_string();
        assert_eq!(logging.level_filter().unwrap(), LevelFilter::Debug);
        logging.level = "chatty".to_string();
        assert!(logging.level_filter().is_err());
    }

    #[test]
    fn test_invalid_glob_pattern_returns_error() {
        let mut config = Config::default();
        config.scan.excluded_folders.push("[invalid".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidGlobPattern { .. })
        ));
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let result = Config::from_toml("[thresholds\nmedium = ");
        assert!(matches!(result, Err(ConfigError::ConfigInvalid(_))));
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let result = Config::load(Some(Path::new("/non/existent/sizetidy.toml")));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }

    #[test]
    fn test_load_explicit_file_validates() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[thresholds]\nmedium = 5\nlarge = 1").unwrap();
        let result = Config::load(Some(file.path()));
        assert!(matches!(
            result,
            Err(ConfigError::InvertedThresholds { .. })
        ));
    }

    #[test]
    fn test_default_directory_blank_is_none() {
        let mut config = Config::default();
        assert!(config.default_directory().is_none());
        config.default_directory = Some("   ".to_string());
        assert!(config.default_directory().is_none());
        config.default_directory = Some(" /tmp/x ".to_string());
        assert_eq!(config.default_directory(), Some("/tmp/x"));
    }

    #[test]
    fn test_folder_for_category() {
        let folders = FolderNames::default();
        assert_eq!(folders.for_category(SizeCategory::Small), None);
        assert_eq!(folders.for_category(SizeCategory::Medium), Some("1MB-1GB"));
        assert_eq!(
            folders.for_category(SizeCategory::Large),
            Some("above 1GB")
        );
    }
}
