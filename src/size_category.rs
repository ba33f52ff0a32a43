/// Size tier classification.
///
/// This module maps a file size in bytes onto one of three tiers using two
/// configured thresholds. Classification is a pure function; nothing here
/// touches the filesystem.
///
/// # Examples
///
/// ```
/// use sizetidy::size_category::{SizeCategory, Thresholds};
///
/// let thresholds = Thresholds::default();
/// assert_eq!(thresholds.classify(500), SizeCategory::Small);
/// assert_eq!(thresholds.classify(5_000_000), SizeCategory::Medium);
/// assert_eq!(thresholds.classify(2_000_000_000), SizeCategory::Large);
/// ```
use serde::{Deserialize, Serialize};
use std::fmt;

/// One mebibyte, the default medium threshold.
pub const MIB: u64 = 1024 * 1024;
/// One gibibyte, the default large threshold.
pub const GIB: u64 = 1024 * MIB;

/// A size tier.
///
/// Only `Medium` and `Large` files are ever moved; `Small` files stay where
/// they were found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeCategory {
    /// Below the medium threshold.
    Small,
    /// At or above the medium threshold, below the large threshold.
    Medium,
    /// At or above the large threshold.
    Large,
}

impl SizeCategory {
    /// All tiers, smallest first.
    pub const ALL: [SizeCategory; 3] = [
        SizeCategory::Small,
        SizeCategory::Medium,
        SizeCategory::Large,
    ];

    /// Tiers that get relocated, in the order they are processed.
    pub const MOVABLE: [SizeCategory; 2] = [SizeCategory::Large, SizeCategory::Medium];

    /// Returns the lowercase name used in manifests and logs.
    ///
    /// # Examples
    ///
    /// ```
    /// use sizetidy::size_category::SizeCategory;
    ///
    /// assert_eq!(SizeCategory::Large.as_str(), "large");
    /// assert_eq!(SizeCategory::Small.as_str(), "small");
    /// ```
    pub fn as_str(&self) -> &'static str {
        match self {
            SizeCategory::Small => "small",
            SizeCategory::Medium => "medium",
            SizeCategory::Large => "large",
        }
    }

    /// Returns true if files in this tier are relocated.
    pub fn is_movable(&self) -> bool {
        !matches!(self, SizeCategory::Small)
    }
}

impl fmt::Display for SizeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two byte thresholds that separate the tiers.
///
/// `large >= medium` is checked by `Config::validate`; with an inverted pair
/// the medium tier would swallow everything the large tier should get.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Files of at least this many bytes are at least `Medium`.
    #[serde(default = "default_medium")]
    pub medium: u64,
    /// Files of at least this many bytes are `Large`.
    #[serde(default = "default_large")]
    pub large: u64,
}

fn default_medium() -> u64 {
    MIB
}

fn default_large() -> u64 {
    GIB
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            medium: default_medium(),
            large: default_large(),
        }
    }
}

impl Thresholds {
    /// Creates a new threshold pair.
    pub fn new(medium: u64, large: u64) -> Self {
        Self { medium, large }
    }

    /// Returns true if the pair is ordered so every tier is reachable.
    pub fn is_ordered(&self) -> bool {
        self.large >= self.medium
    }

    /// Classifies a size. Values exactly at a threshold go to the higher tier.
    pub fn classify(&self, size: u64) -> SizeCategory {
        classify(size, self.medium, self.large)
    }
}

/// Classifies `size` against explicit thresholds.
pub fn classify(size: u64, threshold_medium: u64, threshold_large: u64) -> SizeCategory {
    if size >= threshold_large {
        SizeCategory::Large
    } else if size >= threshold_medium {
        SizeCategory::Medium
    } else {
        SizeCategory::Small
    }
}

/// Formats a byte count as a human-readable string with two decimals.
///
/// ```
/// use sizetidy::size_category::format_size;
///
/// assert_eq!(format_size(512), "512.00 B");
/// assert_eq!(format_size(1024 * 1024), "1.00 MB");
/// ```
pub fn format_size(size_bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = size_bytes as f64;
    for unit in UNITS {
        if size < 1024.0 {
            return format!("{:.2} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.2} PB", size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_boundaries_go_to_higher_tier() {
        let t = Thresholds::new(100, 1000);
        assert_eq!(t.classify(99), SizeCategory::Small);
        assert_eq!(t.classify(100), SizeCategory::Medium);
        assert_eq!(t.classify(999), SizeCategory::Medium);
        assert_eq!(t.classify(1000), SizeCategory::Large);
        assert_eq!(t.classify(u64::MAX), SizeCategory::Large);
    }

    #[test]
    fn test_classify_zero_is_small() {
        assert_eq!(Thresholds::default().classify(0), SizeCategory::Small);
    }

    #[test]
    fn test_classify_with_zero_medium_threshold() {
        // Everything is at least medium.
        assert_eq!(classify(0, 0, 10), SizeCategory::Medium);
        assert_eq!(classify(10, 0, 10), SizeCategory::Large);
    }

    #[test]
    fn test_classify_equal_thresholds_skip_medium() {
        let t = Thresholds::new(50, 50);
        assert!(t.is_ordered());
        assert_eq!(t.classify(49), SizeCategory::Small);
        assert_eq!(t.classify(50), SizeCategory::Large);
    }

    #[test]
    fn test_default_scenario_sizes() {
        let t = Thresholds::default();
        assert_eq!(t.classify(500), SizeCategory::Small);
        assert_eq!(t.classify(5_000_000), SizeCategory::Medium);
        assert_eq!(t.classify(2_000_000_000), SizeCategory::Large);
    }

    #[test]
    fn test_inverted_thresholds_detected() {
        assert!(!Thresholds::new(1000, 10).is_ordered());
    }

    #[test]
    fn test_movable_order_is_large_then_medium() {
        assert_eq!(
            SizeCategory::MOVABLE,
            [SizeCategory::Large, SizeCategory::Medium]
        );
        assert!(!SizeCategory::Small.is_movable());
    }

    #[test]
    fn test_format_size_units() {
        assert_eq!(format_size(0), "0.00 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(GIB), "1.00 GB");
        assert_eq!(format_size(1024 * 1024 * GIB), "1.00 PB");
    }
}
