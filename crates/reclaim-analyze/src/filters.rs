//! Large and stale file filters.
//!
//! Both are single passes over the record snapshot and only read it, so they
//! can run alongside duplicate detection.

use std::time::{Duration, SystemTime};

use reclaim_core::FileRecord;

/// Files above the size threshold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LargeFiles {
    /// The largest files, descending by size (ties by path), capped.
    pub files: Vec<FileRecord>,
    /// Number of files over the threshold before capping.
    pub total_count: usize,
}

/// Select files strictly larger than `threshold`, keeping the top `limit`.
pub fn large_files(records: &[FileRecord], threshold: u64, limit: usize) -> LargeFiles {
    let mut files: Vec<FileRecord> = records
        .iter()
        .filter(|r| r.size_bytes > threshold)
        .cloned()
        .collect();
    let total_count = files.len();

    files.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes).then_with(|| a.path.cmp(&b.path)));
    files.truncate(limit);

    LargeFiles { files, total_count }
}

/// Select files whose last access is more than `stale_after` before `now`,
/// in discovery order.
pub fn stale_files(records: &[FileRecord], stale_after: Duration, now: SystemTime) -> Vec<FileRecord> {
    records
        .iter()
        .filter(|r| r.idle_for(now) > stale_after)
        .cloned()
        .collect()
}

/// Format a duration as a human-readable string.
pub fn format_age(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs} seconds")
    } else if secs < 3600 {
        format!("{} minutes", secs / 60)
    } else if secs < 86400 {
        format!("{} hours", secs / 3600)
    } else if secs < 2592000 {
        format!("{} days", secs / 86400)
    } else if secs < 31536000 {
        format!("{} months", secs / 2592000)
    } else {
        format!("{:.1} years", secs as f64 / 31536000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: u64 = 86_400;
    const MIB: u64 = 1024 * 1024;

    #[test]
    fn test_large_files_threshold_is_strict() {
        let now = SystemTime::now();
        let records = vec![
            FileRecord::new("/a", 100 * MIB, now),
            FileRecord::new("/b", 100 * MIB + 1, now),
        ];

        let large = large_files(&records, 100 * MIB, 10);
        assert_eq!(large.total_count, 1);
        assert_eq!(large.files[0].path.to_str(), Some("/b"));
    }

    #[test]
    fn test_large_files_ordering_and_cap() {
        let now = SystemTime::now();
        let records = vec![
            FileRecord::new("/small", 10, now),
            FileRecord::new("/y", 300, now),
            FileRecord::new("/x", 300, now),
            FileRecord::new("/big", 900, now),
        ];

        let large = large_files(&records, 50, 2);
        assert_eq!(large.total_count, 3);
        let paths: Vec<_> = large.files.iter().map(|f| f.path.to_str().unwrap()).collect();
        assert_eq!(paths, vec!["/big", "/x"]);
    }

    #[test]
    fn test_stale_files() {
        let now = SystemTime::now();
        let records = vec![
            FileRecord::new("/old", 1, now - Duration::from_secs(200 * DAY)),
            FileRecord::new("/recent", 1, now - Duration::from_secs(10 * DAY)),
            FileRecord::new("/older", 1, now - Duration::from_secs(400 * DAY)),
        ];

        let stale = stale_files(&records, Duration::from_secs(180 * DAY), now);
        let paths: Vec<_> = stale.iter().map(|f| f.path.to_str().unwrap()).collect();
        assert_eq!(paths, vec!["/old", "/older"]);
    }

    #[test]
    fn test_stale_boundary_is_exclusive() {
        let now = SystemTime::now();
        let threshold = Duration::from_secs(180 * DAY);
        let records = vec![FileRecord::new("/edge", 1, now - threshold)];
        assert!(stale_files(&records, threshold, now).is_empty());
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(Duration::from_secs(30)), "30 seconds");
        assert_eq!(format_age(Duration::from_secs(120)), "2 minutes");
        assert_eq!(format_age(Duration::from_secs(7200)), "2 hours");
        assert_eq!(format_age(Duration::from_secs(172800)), "2 days");
    }
}
