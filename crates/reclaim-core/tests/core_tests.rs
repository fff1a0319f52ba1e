use reclaim_core::{
    CacheDirectoryEntry, ContentHash, DuplicateGroup, EcosystemTag, FileRecord, InodeInfo,
    ScanConfig, ScanReport, ScanStats, ScanWarning, WarningKind,
};
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

fn sample_report() -> ScanReport {
    let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
    ScanReport {
        root: PathBuf::from("/home/user"),
        large_files: vec![FileRecord::new("/home/user/disk.img", 150 * 1024 * 1024, now)],
        large_file_count: 1,
        duplicate_groups: vec![DuplicateGroup {
            digest: ContentHash::new([0x11; 32]),
            size_bytes: 10 * 1024,
            paths: vec![
                PathBuf::from("/home/user/a/doc.pdf"),
                PathBuf::from("/home/user/b/doc.pdf"),
            ],
        }],
        cache_directories: vec![CacheDirectoryEntry::new(
            "/home/user/app/node_modules",
            EcosystemTag::Npm,
            4096,
        )],
        stale_files: vec![
            FileRecord::new("/home/user/old.txt", 12, now - Duration::from_secs(86_400))
                .with_inode(InodeInfo::new(1, 2)),
        ],
        stats: ScanStats::default(),
        inaccessible_count: 1,
        transient_error_count: 0,
        warnings: vec![ScanWarning::permission_denied("/home/user/locked")],
        total_reclaimable_bytes: 4096 + 10 * 1024,
    }
}

#[test]
fn test_report_json_shape() {
    let report = sample_report();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["cache_directories"][0]["ecosystem_tag"], "npm");
    assert_eq!(json["warnings"][0]["kind"], "PermissionDenied");
    assert_eq!(json["total_reclaimable_bytes"], 4096 + 10 * 1024);

    let back: ScanReport = serde_json::from_value(json).unwrap();
    assert_eq!(back, report);
}

#[test]
fn test_report_breakdown_matches_total() {
    let report = sample_report();
    assert_eq!(
        report.cache_reclaimable_bytes() + report.duplicate_reclaimable_bytes(),
        report.total_reclaimable_bytes
    );
    assert_eq!(report.stale_count(), 1);
    assert_eq!(report.stale_bytes(), 12);
    assert!(report.has_warnings());
    assert!(!report.is_empty());
}

#[test]
fn test_config_deserialize_fills_defaults() {
    let config: ScanConfig = serde_json::from_str(r#"{ "root": "/srv" }"#).unwrap();
    assert_eq!(config.root, PathBuf::from("/srv"));
    assert_eq!(config.large_file_threshold_bytes, 100 * 1024 * 1024);
    assert_eq!(config.stale_after, Duration::from_secs(180 * 86_400));
    assert_eq!(config.max_large_files_reported, 10);
    assert_eq!(config.min_duplicate_size_bytes, 1024);
    assert!(!config.follow_symlinks);
}

#[test]
fn test_warning_kinds_partition_tallies() {
    let kinds = [
        WarningKind::PermissionDenied,
        WarningKind::BrokenSymlink,
        WarningKind::ReadError,
        WarningKind::MetadataError,
        WarningKind::HashError,
    ];
    for kind in kinds {
        assert!(!(kind.is_inaccessible() && kind.is_transient()));
    }
}
