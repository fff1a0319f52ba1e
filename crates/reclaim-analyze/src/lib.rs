//! Analysis passes for reclaim.
//!
//! This crate turns one traversal into a reclaimable-space report:
//!
//! - **Duplicate detection** - size partitioning, then BLAKE3 hashing of
//!   candidates only
//! - **Large files** - top-N files over a size threshold
//! - **Stale files** - files not accessed within a time threshold
//! - **Aggregation** - a single report whose total counts duplicates and
//!   cache directories, never large or stale files
//!
//! ```rust,no_run
//! use reclaim_analyze::{Engine, ScanConfig};
//!
//! let report = Engine::new().scan(&ScanConfig::new("/path/to/scan")).unwrap();
//!
//! println!("Reclaimable: {} bytes", report.total_reclaimable_bytes);
//! for group in &report.duplicate_groups {
//!     println!("{} copies of {} bytes", group.count(), group.size_bytes);
//! }
//! ```

mod aggregate;
mod duplicates;
mod engine;
mod filters;
pub mod hasher;

pub use aggregate::{ReportParts, aggregate};
pub use duplicates::{DuplicateConfig, DuplicateConfigBuilder, DuplicateGrouper, DuplicateScan};
pub use engine::{Engine, scan};
pub use filters::{LargeFiles, format_age, large_files, stale_files};

// Re-export core types
pub use reclaim_core::{
    CacheDirectoryEntry, ContentHash, DuplicateGroup, EcosystemTag, FileRecord, ScanConfig,
    ScanError, ScanReport, ScanWarning,
};
