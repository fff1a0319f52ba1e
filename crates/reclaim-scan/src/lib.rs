//! Directory traversal and classification for reclaim.
//!
//! This crate walks a directory tree exactly once and splits what it finds
//! into two outputs:
//!
//! - **File records** for every regular file that is not excluded
//! - **Cache roots** for recognized build/cache directories, which are not
//!   descended into
//!
//! Cache roots are sized afterwards by [`size_cache_roots`], which owns its
//! own walk per directory and can run concurrently with file analysis.
//!
//! # Example
//!
//! ```rust,no_run
//! use reclaim_scan::{ScanConfig, TreeWalker};
//! use tokio_util::sync::CancellationToken;
//!
//! let config = ScanConfig::new("/path/to/scan");
//! let walk = TreeWalker::new()
//!     .walk(&config, &CancellationToken::new())
//!     .unwrap();
//!
//! println!("{} files, {} cache dirs", walk.records.len(), walk.cache_roots.len());
//! ```

mod classify;
mod dirsize;
mod inode;
mod progress;
mod scanner;

pub use classify::{
    CACHE_PATTERNS, PathClassifier, SYSTEM_ROOTS, VCS_DIRS, is_system_root, match_cache_dir,
    match_dir_name,
};
pub use dirsize::{DirSize, directory_size, size_cache_roots};
pub use inode::InodeTracker;
pub use progress::ScanProgress;
pub use scanner::{CacheRoot, TreeWalker, Walk, resolve_root};

// Re-export core types for convenience
pub use reclaim_core::{
    CacheDirectoryEntry, EcosystemTag, FileRecord, ScanConfig, ScanError, ScanStats, ScanWarning,
    WarningKind,
};
