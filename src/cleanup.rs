//! Confirmed removal of reported paths.
//!
//! Every candidate is shown and confirmed individually before anything is
//! touched. Duplicate groups always keep their first path.

use std::collections::HashSet;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use reclaim_analyze::{ScanReport, format_age};
use tokio_util::sync::CancellationToken;

use crate::units::format_size;

/// Ask a yes/no question. Anything but `y`/`yes` (including EOF) is no.
pub fn confirm<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> io::Result<bool> {
    write!(output, "{question} (y/N): ")?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// How confirmed paths are removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalMode {
    /// Print what would be removed and leave it in place.
    DryRun,
    /// Delete outright; directories are removed with their contents.
    Permanent,
    /// Move to the system trash.
    Trash,
}

/// Remove a file or directory tree.
pub fn remove_path(path: &Path, mode: RemovalMode) -> io::Result<()> {
    match mode {
        RemovalMode::DryRun => Ok(()),
        RemovalMode::Trash => trash::delete(path).map_err(|e| io::Error::other(e.to_string())),
        RemovalMode::Permanent => {
            if fs::symlink_metadata(path)?.is_dir() {
                fs::remove_dir_all(path)
            } else {
                fs::remove_file(path)
            }
        }
    }
}

/// Why a path is offered for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum CandidateKind {
    #[strum(to_string = "cache")]
    Cache,
    #[strum(to_string = "duplicate")]
    Duplicate,
    #[strum(to_string = "large file")]
    Large,
    #[strum(to_string = "stale file")]
    Stale,
}

/// One confirmation unit: a cache directory, the extra copies in a duplicate
/// group, or a single large or stale file.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub kind: CandidateKind,
    pub summary: String,
    /// Paths to remove with the bytes each frees.
    pub paths: Vec<(PathBuf, u64)>,
}

impl Candidate {
    pub fn bytes(&self) -> u64 {
        self.paths.iter().map(|(_, size)| size).sum()
    }
}

/// Build the confirmation list from a report.
///
/// Caches come first, then duplicates, then large and stale files for
/// review.
pub fn candidates(report: &ScanReport, now: SystemTime) -> Vec<Candidate> {
    let mut out = Vec::new();

    for cache in &report.cache_directories {
        out.push(Candidate {
            kind: CandidateKind::Cache,
            summary: format!(
                "{} cache, {}",
                cache.ecosystem_tag,
                format_size(cache.total_size_bytes)
            ),
            paths: vec![(cache.path.clone(), cache.total_size_bytes)],
        });
    }

    for group in &report.duplicate_groups {
        let Some(kept) = group.retained_path() else {
            continue;
        };
        out.push(Candidate {
            kind: CandidateKind::Duplicate,
            summary: format!(
                "{} copies of {} each, keeping {}",
                group.count(),
                format_size(group.size_bytes),
                kept.display()
            ),
            paths: group
                .removable_paths()
                .iter()
                .map(|p| (p.clone(), group.size_bytes))
                .collect(),
        });
    }

    for file in &report.large_files {
        out.push(Candidate {
            kind: CandidateKind::Large,
            summary: format_size(file.size_bytes),
            paths: vec![(file.path.clone(), file.size_bytes)],
        });
    }

    for file in &report.stale_files {
        out.push(Candidate {
            kind: CandidateKind::Stale,
            summary: format!(
                "{}, last accessed {} ago",
                format_size(file.size_bytes),
                format_age(file.idle_for(now))
            ),
            paths: vec![(file.path.clone(), file.size_bytes)],
        });
    }

    out
}

/// Totals from a cleanup session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcome {
    pub removed: usize,
    pub failed: usize,
    pub declined: usize,
    pub bytes_freed: u64,
}

/// Walks the user through the candidates one at a time.
pub struct Cleaner<R, W> {
    input: R,
    output: W,
    mode: RemovalMode,
    cancel: CancellationToken,
}

impl<R: BufRead, W: Write> Cleaner<R, W> {
    pub fn new(input: R, output: W, mode: RemovalMode, cancel: CancellationToken) -> Self {
        Self {
            input,
            output,
            mode,
            cancel,
        }
    }

    /// Confirm and remove each candidate. Stops early on cancellation.
    pub fn run(&mut self, candidates: &[Candidate]) -> io::Result<Outcome> {
        let mut outcome = Outcome::default();
        // A file can be both large and stale; ask about it once.
        let mut handled: HashSet<PathBuf> = HashSet::new();

        for candidate in candidates {
            if self.cancel.is_cancelled() {
                writeln!(self.output, "Interrupted.")?;
                break;
            }

            let live: Vec<&(PathBuf, u64)> = candidate
                .paths
                .iter()
                .filter(|(p, _)| !handled.contains(p) && fs::symlink_metadata(p).is_ok())
                .collect();
            if live.is_empty() {
                continue;
            }

            writeln!(self.output)?;
            writeln!(self.output, "[{}] {}", candidate.kind, candidate.summary)?;
            for (path, _) in &live {
                writeln!(self.output, "    {}", path.display())?;
            }

            let bytes: u64 = live.iter().map(|(_, size)| size).sum();
            let question = format!("Remove {} path(s), freeing {}?", live.len(), format_size(bytes));
            if !confirm(&mut self.input, &mut self.output, &question)? {
                outcome.declined += 1;
                handled.extend(live.iter().map(|(p, _)| p.clone()));
                continue;
            }

            for (path, size) in live {
                handled.insert(path.clone());
                match remove_path(path, self.mode) {
                    Ok(()) => {
                        if self.mode == RemovalMode::DryRun {
                            writeln!(self.output, "    would remove {}", path.display())?;
                        }
                        tracing::info!(path = %path.display(), bytes = size, "removed");
                        outcome.removed += 1;
                        outcome.bytes_freed += size;
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "removal failed");
                        writeln!(self.output, "    failed to remove {}: {e}", path.display())?;
                        outcome.failed += 1;
                    }
                }
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reclaim_analyze::{CacheDirectoryEntry, ContentHash, DuplicateGroup, EcosystemTag, FileRecord};
    use std::io::Cursor;
    use std::time::Duration;
    use tempfile::TempDir;

    fn cleaner(answers: &str, mode: RemovalMode) -> Cleaner<Cursor<Vec<u8>>, Vec<u8>> {
        Cleaner::new(
            Cursor::new(answers.as_bytes().to_vec()),
            Vec::new(),
            mode,
            CancellationToken::new(),
        )
    }

    fn report_for(dir: &Path) -> ScanReport {
        let now = SystemTime::now();
        let old = FileRecord::new(dir.join("old.bin"), 300, now - Duration::from_secs(400 * 86_400));
        ScanReport {
            root: dir.to_path_buf(),
            large_files: vec![old.clone()],
            large_file_count: 1,
            duplicate_groups: vec![DuplicateGroup {
                digest: ContentHash::new([2; 32]),
                size_bytes: 4,
                paths: vec![dir.join("a.txt"), dir.join("b.txt"), dir.join("c.txt")],
            }],
            cache_directories: vec![CacheDirectoryEntry::new(
                dir.join("node_modules"),
                EcosystemTag::Npm,
                10,
            )],
            stale_files: vec![old],
            stats: Default::default(),
            inaccessible_count: 0,
            transient_error_count: 0,
            warnings: Vec::new(),
            total_reclaimable_bytes: 18,
        }
    }

    fn populate(dir: &Path) {
        for name in ["a.txt", "b.txt", "c.txt"] {
            fs::write(dir.join(name), "same").unwrap();
        }
        fs::create_dir_all(dir.join("node_modules/pkg")).unwrap();
        fs::write(dir.join("node_modules/pkg/index.js"), "0123456789").unwrap();
        fs::write(dir.join("old.bin"), vec![0u8; 300]).unwrap();
    }

    #[test]
    fn test_confirm_answers() {
        let mut out = Vec::new();
        assert!(confirm(&mut Cursor::new("y\n"), &mut out, "Go?").unwrap());
        assert!(confirm(&mut Cursor::new("YES\n"), &mut out, "Go?").unwrap());
        assert!(!confirm(&mut Cursor::new("n\n"), &mut out, "Go?").unwrap());
        assert!(!confirm(&mut Cursor::new("\n"), &mut out, "Go?").unwrap());
        assert!(!confirm(&mut Cursor::new(""), &mut out, "Go?").unwrap());
        assert!(String::from_utf8(out).unwrap().starts_with("Go? (y/N): "));
    }

    #[test]
    fn test_candidates_order_and_kept_copy() {
        let temp = TempDir::new().unwrap();
        let report = report_for(temp.path());
        let list = candidates(&report, SystemTime::now());

        let kinds: Vec<_> = list.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                CandidateKind::Cache,
                CandidateKind::Duplicate,
                CandidateKind::Large,
                CandidateKind::Stale
            ]
        );
        let dup = &list[1];
        assert_eq!(dup.paths.len(), 2);
        assert!(dup.paths.iter().all(|(p, _)| !p.ends_with("a.txt")));
        assert_eq!(dup.bytes(), 8);
    }

    #[test]
    fn test_permanent_removal_follows_answers() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        populate(dir);
        let list = candidates(&report_for(dir), SystemTime::now());

        // Remove the cache, keep duplicates, remove the large file. The
        // stale entry is the same file and is not asked again.
        let mut cleaner = cleaner("y\nn\ny\ny\n", RemovalMode::Permanent);
        let outcome = cleaner.run(&list).unwrap();

        assert_eq!(outcome.removed, 2);
        assert_eq!(outcome.declined, 1);
        assert_eq!(outcome.failed, 0);
        assert_eq!(outcome.bytes_freed, 310);
        assert!(!dir.join("node_modules").exists());
        assert!(!dir.join("old.bin").exists());
        assert!(dir.join("a.txt").exists() && dir.join("b.txt").exists());
    }

    #[test]
    fn test_duplicates_keep_first_copy() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        populate(dir);
        let list = candidates(&report_for(dir), SystemTime::now());

        let mut cleaner = cleaner("n\ny\nn\n", RemovalMode::Permanent);
        let outcome = cleaner.run(&list).unwrap();

        assert_eq!(outcome.removed, 2);
        assert_eq!(outcome.bytes_freed, 8);
        assert!(dir.join("a.txt").exists());
        assert!(!dir.join("b.txt").exists());
        assert!(!dir.join("c.txt").exists());
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        populate(dir);
        let list = candidates(&report_for(dir), SystemTime::now());

        let mut cleaner = cleaner("y\ny\ny\ny\n", RemovalMode::DryRun);
        let outcome = cleaner.run(&list).unwrap();

        assert_eq!(outcome.removed, 4);
        assert!(dir.join("node_modules/pkg/index.js").exists());
        assert!(dir.join("b.txt").exists());
        assert!(dir.join("old.bin").exists());
        let printed = String::from_utf8(cleaner.output).unwrap();
        assert!(printed.contains("would remove"));
    }

    #[test]
    fn test_missing_paths_are_not_offered() {
        let temp = TempDir::new().unwrap();
        let list = candidates(&report_for(temp.path()), SystemTime::now());

        let mut cleaner = cleaner("", RemovalMode::Permanent);
        let outcome = cleaner.run(&list).unwrap();
        assert_eq!(outcome, Outcome::default());
    }

    #[test]
    fn test_cancel_stops_session() {
        let temp = TempDir::new().unwrap();
        populate(temp.path());
        let list = candidates(&report_for(temp.path()), SystemTime::now());

        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut cleaner = Cleaner::new(Cursor::new(b"y\n".to_vec()), Vec::new(), RemovalMode::Permanent, cancel);
        let outcome = cleaner.run(&list).unwrap();

        assert_eq!(outcome.removed, 0);
        assert!(temp.path().join("node_modules").exists());
    }
}
