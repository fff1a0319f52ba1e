//! Scan configuration types.

use std::path::PathBuf;
use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Files strictly larger than this are reported as large (100 MiB).
pub const DEFAULT_LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Files not accessed for longer than this are reported as stale (180 days).
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(180 * 24 * 60 * 60);

/// Number of large files kept in the report.
pub const DEFAULT_MAX_LARGE_FILES: usize = 10;

/// Files smaller than this never take part in duplicate detection.
pub const DEFAULT_MIN_DUPLICATE_SIZE: u64 = 1024;

/// Configuration for a single scan.
///
/// Passed by reference into the engine and never mutated during a scan, so
/// repeated or concurrent scans with different settings do not interfere.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Root path to scan.
    pub root: PathBuf,

    /// Size above which a file is reported as large.
    #[builder(default = "DEFAULT_LARGE_FILE_THRESHOLD")]
    #[serde(default = "default_large_file_threshold")]
    pub large_file_threshold_bytes: u64,

    /// Time since last access after which a file is reported as stale.
    #[builder(default = "DEFAULT_STALE_AFTER")]
    #[serde(default = "default_stale_after")]
    pub stale_after: Duration,

    /// Maximum number of large files in the report.
    #[builder(default = "DEFAULT_MAX_LARGE_FILES")]
    #[serde(default = "default_max_large_files")]
    pub max_large_files_reported: usize,

    /// Follow symbolic links. Directory cycles are pruned by inode.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Cross filesystem boundaries.
    #[builder(default = "false")]
    #[serde(default)]
    pub cross_filesystems: bool,

    /// Maximum depth to traverse (None = unlimited).
    #[builder(default)]
    #[serde(default)]
    pub max_depth: Option<u32>,

    /// Extra file name globs to skip (e.g. `*.iso`, `Downloads`).
    #[builder(default)]
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Files no larger than this are left out of duplicate detection.
    #[builder(default = "DEFAULT_MIN_DUPLICATE_SIZE")]
    #[serde(default = "default_min_duplicate_size")]
    pub min_duplicate_size_bytes: u64,

    /// Confirm digest matches with a full byte comparison.
    #[builder(default = "false")]
    #[serde(default)]
    pub verify_contents: bool,

    /// Number of hashing threads (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub hash_threads: usize,
}

fn default_large_file_threshold() -> u64 {
    DEFAULT_LARGE_FILE_THRESHOLD
}

fn default_stale_after() -> Duration {
    DEFAULT_STALE_AFTER
}

fn default_max_large_files() -> usize {
    DEFAULT_MAX_LARGE_FILES
}

fn default_min_duplicate_size() -> u64 {
    DEFAULT_MIN_DUPLICATE_SIZE
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.root {
            Some(ref root) if root.as_os_str().is_empty() => {
                return Err("Root path cannot be empty".to_string());
            }
            None => return Err("Root path is required".to_string()),
            _ => {}
        }
        if self.stale_after == Some(Duration::ZERO) {
            return Err("Stale threshold must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a config with default thresholds for scanning a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            large_file_threshold_bytes: DEFAULT_LARGE_FILE_THRESHOLD,
            stale_after: DEFAULT_STALE_AFTER,
            max_large_files_reported: DEFAULT_MAX_LARGE_FILES,
            follow_symlinks: false,
            cross_filesystems: false,
            max_depth: None,
            ignore_patterns: Vec::new(),
            min_duplicate_size_bytes: DEFAULT_MIN_DUPLICATE_SIZE,
            verify_contents: false,
            hash_threads: 0,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(".")
    }
}
