//! Text rendering of scan reports.

use std::io::{self, Write};
use std::time::SystemTime;

use reclaim_analyze::{ScanReport, format_age};

use crate::units::format_size;

const RULE_WIDTH: usize = 70;

fn rule<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", "─".repeat(RULE_WIDTH))
}

fn heading<W: Write>(out: &mut W, title: &str) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, " {title}")?;
    rule(out)
}

/// Print a report. At most `limit` entries are listed per section.
pub fn write_report<W: Write>(out: &mut W, report: &ScanReport, now: SystemTime, limit: usize) -> io::Result<()> {
    rule(out)?;
    writeln!(out, " {}", report.root.display())?;
    writeln!(
        out,
        " {} files, {} directories, {} scanned",
        report.stats.files_seen,
        report.stats.dirs_seen,
        format_size(report.stats.bytes_seen)
    )?;
    rule(out)?;

    heading(out, "Build and cache directories")?;
    if report.cache_directories.is_empty() {
        writeln!(out, "   none found")?;
    }
    for cache in report.cache_directories.iter().take(limit) {
        writeln!(
            out,
            "   {:>10}  {:<14} {}",
            format_size(cache.total_size_bytes),
            cache.ecosystem_tag.label(),
            cache.path.display()
        )?;
    }
    more(out, report.cache_directories.len(), limit)?;

    heading(out, "Duplicate files")?;
    if report.duplicate_groups.is_empty() {
        writeln!(out, "   none found")?;
    }
    for (i, group) in report.duplicate_groups.iter().take(limit).enumerate() {
        writeln!(
            out,
            "   Group {} ({} files, {} each, {} reclaimable)",
            i + 1,
            group.count(),
            format_size(group.size_bytes),
            format_size(group.reclaimable_bytes())
        )?;
        for path in &group.paths {
            writeln!(out, "     {}", path.display())?;
        }
    }
    more(out, report.duplicate_groups.len(), limit)?;

    heading(out, "Large files (review before deleting)")?;
    if report.large_files.is_empty() {
        writeln!(out, "   none found")?;
    }
    for file in &report.large_files {
        writeln!(out, "   {:>10}  {}", format_size(file.size_bytes), file.path.display())?;
    }
    more(out, report.large_file_count, report.large_files.len())?;

    heading(out, "Stale files (review before deleting)")?;
    if report.stale_files.is_empty() {
        writeln!(out, "   none found")?;
    }
    for file in report.stale_files.iter().take(limit) {
        writeln!(
            out,
            "   {:>10}  {:>12} ago  {}",
            format_size(file.size_bytes),
            format_age(file.idle_for(now)),
            file.path.display()
        )?;
    }
    more(out, report.stale_count(), limit)?;

    writeln!(out)?;
    rule(out)?;
    writeln!(
        out,
        " Reclaimable: {} ({} caches, {} duplicates)",
        format_size(report.total_reclaimable_bytes),
        format_size(report.cache_reclaimable_bytes()),
        format_size(report.duplicate_reclaimable_bytes())
    )?;
    if report.stale_count() > 0 {
        writeln!(
            out,
            " Stale, not counted: {} in {} files",
            format_size(report.stale_bytes()),
            report.stale_count()
        )?;
    }
    if report.has_warnings() {
        writeln!(
            out,
            " {} inaccessible, {} other errors (run with RECLAIM_LOG=warn for details)",
            report.inaccessible_count, report.transient_error_count
        )?;
    }
    rule(out)
}

fn more<W: Write>(out: &mut W, total: usize, shown: usize) -> io::Result<()> {
    if total > shown {
        writeln!(out, "   ... and {} more", total - shown)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reclaim_analyze::{CacheDirectoryEntry, ContentHash, DuplicateGroup, EcosystemTag, ScanConfig};
    use std::fs;
    use tempfile::TempDir;

    fn render(report: &ScanReport, limit: usize) -> String {
        let mut out = Vec::new();
        write_report(&mut out, report, SystemTime::now(), limit).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_empty_report() {
        let temp = TempDir::new().unwrap();
        let report = reclaim_analyze::scan(&ScanConfig::new(temp.path())).unwrap();
        let text = render(&report, 10);
        assert!(text.contains("none found"));
        assert!(text.contains("Reclaimable: 0 B"));
        assert!(!text.contains("Stale, not counted"));
    }

    #[test]
    fn test_sections_and_truncation() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("x"), "1").unwrap();
        let mut report = reclaim_analyze::scan(&ScanConfig::new(temp.path())).unwrap();
        report.cache_directories = (0..3)
            .map(|i| CacheDirectoryEntry::new(format!("/p{i}/node_modules"), EcosystemTag::Npm, 2048))
            .collect();
        report.duplicate_groups = vec![DuplicateGroup {
            digest: ContentHash::new([0; 32]),
            size_bytes: 1024,
            paths: vec!["/a".into(), "/b".into()],
        }];
        report.total_reclaimable_bytes = 3 * 2048 + 1024;

        let text = render(&report, 2);
        assert!(text.contains("npm/yarn"));
        assert!(text.contains("... and 1 more"));
        assert!(text.contains("Group 1 (2 files, 1 KiB each, 1 KiB reclaimable)"));
        assert!(text.contains("Reclaimable: 7 KiB"));
    }
}
