//! Core types and configuration for reclaim.
//!
//! This crate provides the data model shared by the scanning and analysis
//! crates: discovered file records, cache directory entries, duplicate
//! groups, the aggregate scan report, the scan configuration and errors.

mod config;
mod ecosystem;
mod error;
mod record;
mod report;

pub use config::{
    DEFAULT_LARGE_FILE_THRESHOLD, DEFAULT_MAX_LARGE_FILES, DEFAULT_MIN_DUPLICATE_SIZE,
    DEFAULT_STALE_AFTER, ScanConfig, ScanConfigBuilder,
};
pub use ecosystem::{CacheDirectoryEntry, EcosystemTag};
pub use error::{ScanError, ScanWarning, WarningKind};
pub use record::{ContentHash, FileRecord, InodeInfo};
pub use report::{DuplicateGroup, ScanReport, ScanStats};
