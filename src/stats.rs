//! Run statistics.

use crate::size_category::SizeCategory;
use indexmap::IndexMap;
use std::time::Duration;

/// Sentinel histogram key for files without an extension.
pub const NO_EXTENSION: &str = "no_extension";

/// Counters accumulated over a run.
///
/// `large`, `medium` and `small` count files moved into each tier (or that
/// would be moved, in a dry run). Small files never move, so `small` stays
/// at zero; the number of small files found is the length of the small list
/// in `CategorizedFiles`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statistics {
    pub scanned: usize,
    pub large: usize,
    pub medium: usize,
    pub small: usize,
    pub errors: usize,
    pub skipped: usize,
    pub execution_time: Duration,
    /// Extension → occurrence count, in first-seen order.
    extensions: IndexMap<String, usize>,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `extension`.
    pub fn record_extension(&mut self, extension: &str) {
        *self.extensions.entry(extension.to_string()).or_insert(0) += 1;
    }

    /// Bump the moved counter for `category`.
    pub fn record_moved(&mut self, category: SizeCategory) {
        match category {
            SizeCategory::Small => self.small += 1,
            SizeCategory::Medium => self.medium += 1,
            SizeCategory::Large => self.large += 1,
        }
    }

    /// Moved count for `category`.
    pub fn moved(&self, category: SizeCategory) -> usize {
        match category {
            SizeCategory::Small => self.small,
            SizeCategory::Medium => self.medium,
            SizeCategory::Large => self.large,
        }
    }

    pub fn total_moved(&self) -> usize {
        self.large + self.medium + self.small
    }

    /// Occurrence count for one extension.
    pub fn extension_count(&self, extension: &str) -> usize {
        self.extensions.get(extension).copied().unwrap_or(0)
    }

    /// Number of distinct extensions seen.
    pub fn distinct_extensions(&self) -> usize {
        self.extensions.len()
    }

    /// The `n` most common extensions, most common first.
    ///
    /// Ties keep the order in which the extensions were first seen.
    pub fn top_extensions(&self, n: usize) -> Vec<(&str, usize)> {
        let mut entries: Vec<(&str, usize)> = self
            .extensions
            .iter()
            .map(|(ext, count)| (ext.as_str(), *count))
            .collect();
        // Stable sort, so insertion order survives among equal counts.
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.truncate(n);
        entries
    }
}
