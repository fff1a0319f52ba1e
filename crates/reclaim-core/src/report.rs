//! Aggregate scan report and statistics.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ecosystem::CacheDirectoryEntry;
use crate::error::ScanWarning;
use crate::record::{ContentHash, FileRecord};

/// A group of files sharing identical content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Content hash shared by all files in this group.
    pub digest: ContentHash,

    /// Size of each copy in bytes.
    pub size_bytes: u64,

    /// Paths in discovery order. The first one is the copy to keep.
    pub paths: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Get the number of copies.
    pub fn count(&self) -> usize {
        self.paths.len()
    }

    /// Number of copies that can be deleted while keeping one.
    pub fn deletable_count(&self) -> usize {
        self.paths.len().saturating_sub(1)
    }

    /// Bytes freed by keeping a single copy: `size * (count - 1)`.
    pub fn reclaimable_bytes(&self) -> u64 {
        self.size_bytes * self.deletable_count() as u64
    }

    /// The copy conventionally retained.
    pub fn retained_path(&self) -> Option<&Path> {
        self.paths.first().map(PathBuf::as_path)
    }

    /// The copies that may be removed.
    pub fn removable_paths(&self) -> &[PathBuf] {
        self.paths.get(1..).unwrap_or_default()
    }
}

/// Summary statistics for a traversal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Regular files recorded.
    pub files_seen: u64,
    /// Directories visited (cache roots included, their contents not).
    pub dirs_seen: u64,
    /// Symbolic links encountered.
    pub symlinks_seen: u64,
    /// Total bytes of recorded files.
    pub bytes_seen: u64,
    /// Maximum depth reached.
    pub max_depth: u32,
}

impl ScanStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a regular file.
    pub fn record_file(&mut self, size: u64, depth: u32) {
        self.files_seen += 1;
        self.bytes_seen += size;
        self.max_depth = self.max_depth.max(depth);
    }

    /// Record a directory.
    pub fn record_dir(&mut self, depth: u32) {
        self.dirs_seen += 1;
        self.max_depth = self.max_depth.max(depth);
    }

    /// Record a symlink.
    pub fn record_symlink(&mut self) {
        self.symlinks_seen += 1;
    }
}

/// Result of one scan: the four classifications plus reclaimable total.
///
/// Only duplicates and cache directories count toward
/// `total_reclaimable_bytes`. Large and stale files are candidates that need
/// a human decision and are listed without being added to the total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Canonical root that was scanned.
    pub root: PathBuf,

    /// Largest files over the threshold, descending by size, capped.
    pub large_files: Vec<FileRecord>,

    /// Number of files over the threshold before capping.
    pub large_file_count: usize,

    /// Duplicate groups, descending by reclaimable bytes.
    pub duplicate_groups: Vec<DuplicateGroup>,

    /// Matched cache and build-artifact directories.
    pub cache_directories: Vec<CacheDirectoryEntry>,

    /// Files not accessed within the stale threshold.
    pub stale_files: Vec<FileRecord>,

    /// Traversal statistics.
    pub stats: ScanStats,

    /// Paths skipped because they could not be read.
    pub inaccessible_count: u64,

    /// Entries dropped because of transient I/O errors.
    pub transient_error_count: u64,

    /// Warnings encountered during the scan.
    pub warnings: Vec<ScanWarning>,

    /// Duplicate and cache bytes that can be freed.
    pub total_reclaimable_bytes: u64,
}

impl ScanReport {
    /// Bytes freed by removing redundant duplicate copies.
    pub fn duplicate_reclaimable_bytes(&self) -> u64 {
        self.duplicate_groups
            .iter()
            .map(DuplicateGroup::reclaimable_bytes)
            .sum()
    }

    /// Bytes held by cache directories.
    pub fn cache_reclaimable_bytes(&self) -> u64 {
        self.cache_directories
            .iter()
            .map(|c| c.total_size_bytes)
            .sum()
    }

    /// Number of stale files.
    pub fn stale_count(&self) -> usize {
        self.stale_files.len()
    }

    /// Bytes held by stale files (informational).
    pub fn stale_bytes(&self) -> u64 {
        self.stale_files.iter().map(|f| f.size_bytes).sum()
    }

    /// Check if there were any warnings during scanning.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Whether the scan found nothing to act on.
    pub fn is_empty(&self) -> bool {
        self.large_files.is_empty()
            && self.duplicate_groups.is_empty()
            && self.cache_directories.is_empty()
            && self.stale_files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(size: u64, copies: usize) -> DuplicateGroup {
        DuplicateGroup {
            digest: ContentHash::new([0xaa; 32]),
            size_bytes: size,
            paths: (0..copies)
                .map(|i| PathBuf::from(format!("/dup/{i}")))
                .collect(),
        }
    }

    #[test]
    fn test_duplicate_group_reclaimable() {
        let g = group(10 * 1024, 3);
        assert_eq!(g.count(), 3);
        assert_eq!(g.deletable_count(), 2);
        assert_eq!(g.reclaimable_bytes(), 20 * 1024);
        assert_eq!(g.retained_path(), Some(Path::new("/dup/0")));
        assert_eq!(g.removable_paths().len(), 2);
    }

    #[test]
    fn test_empty_group_is_safe() {
        let g = group(4096, 0);
        assert_eq!(g.reclaimable_bytes(), 0);
        assert!(g.retained_path().is_none());
        assert!(g.removable_paths().is_empty());
    }

    #[test]
    fn test_stats_record() {
        let mut stats = ScanStats::new();
        stats.record_file(1024, 2);
        stats.record_dir(3);
        stats.record_symlink();

        assert_eq!(stats.files_seen, 1);
        assert_eq!(stats.bytes_seen, 1024);
        assert_eq!(stats.dirs_seen, 1);
        assert_eq!(stats.symlinks_seen, 1);
        assert_eq!(stats.max_depth, 3);
    }
}
