//! Report aggregation.
//!
//! Only duplicates and cache directories are added to the reclaimable total.
//! Large and stale files are listed for review and never counted, since
//! neither is guaranteed safe to delete.

use std::path::PathBuf;

use reclaim_core::{
    CacheDirectoryEntry, DuplicateGroup, FileRecord, ScanReport, ScanStats, ScanWarning,
};

use crate::filters::LargeFiles;

/// The classification outputs a report is built from.
#[derive(Debug, Clone, Default)]
pub struct ReportParts {
    pub root: PathBuf,
    pub stats: ScanStats,
    pub large: LargeFiles,
    pub duplicates: Vec<DuplicateGroup>,
    pub caches: Vec<CacheDirectoryEntry>,
    pub stale: Vec<FileRecord>,
    pub warnings: Vec<ScanWarning>,
}

/// Merge the four classifications into one report.
pub fn aggregate(parts: ReportParts) -> ScanReport {
    let cache_bytes: u64 = parts.caches.iter().map(|c| c.total_size_bytes).sum();
    let duplicate_bytes: u64 = parts
        .duplicates
        .iter()
        .map(DuplicateGroup::reclaimable_bytes)
        .sum();

    let inaccessible_count = parts
        .warnings
        .iter()
        .filter(|w| w.kind.is_inaccessible())
        .count() as u64;
    let transient_error_count = parts
        .warnings
        .iter()
        .filter(|w| w.kind.is_transient())
        .count() as u64;

    ScanReport {
        root: parts.root,
        large_files: parts.large.files,
        large_file_count: parts.large.total_count,
        duplicate_groups: parts.duplicates,
        cache_directories: parts.caches,
        stale_files: parts.stale,
        stats: parts.stats,
        inaccessible_count,
        transient_error_count,
        warnings: parts.warnings,
        total_reclaimable_bytes: cache_bytes + duplicate_bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reclaim_core::{ContentHash, EcosystemTag, WarningKind};
    use std::time::SystemTime;

    #[test]
    fn test_total_counts_only_caches_and_duplicates() {
        let now = SystemTime::now();
        let huge = FileRecord::new("/big.iso", 150 * 1024 * 1024, now);
        let parts = ReportParts {
            root: PathBuf::from("/"),
            large: LargeFiles {
                files: vec![huge.clone()],
                total_count: 1,
            },
            duplicates: vec![DuplicateGroup {
                digest: ContentHash::new([1; 32]),
                size_bytes: 10 * 1024,
                paths: vec!["/a".into(), "/b".into(), "/c".into()],
            }],
            caches: vec![CacheDirectoryEntry::new("/p/node_modules", EcosystemTag::Npm, 5000)],
            stale: vec![huge],
            ..Default::default()
        };

        let report = aggregate(parts);
        assert_eq!(report.total_reclaimable_bytes, 5000 + 20 * 1024);
        assert_eq!(report.large_file_count, 1);
        assert_eq!(report.stale_count(), 1);
    }

    #[test]
    fn test_warning_tallies() {
        let parts = ReportParts {
            warnings: vec![
                ScanWarning::permission_denied("/locked"),
                ScanWarning::new("/gone", "vanished", WarningKind::MetadataError),
                ScanWarning::new("/bad", "read failed", WarningKind::HashError),
                ScanWarning::broken_symlink("/link", "/nowhere"),
            ],
            ..Default::default()
        };

        let report = aggregate(parts);
        assert_eq!(report.inaccessible_count, 1);
        assert_eq!(report.transient_error_count, 2);
        assert_eq!(report.warnings.len(), 4);
        assert_eq!(report.total_reclaimable_bytes, 0);
    }
}
