//! Single-pass directory walker built on jwalk.
//!
//! The walk runs serially with children sorted by name, so a fixed
//! filesystem snapshot always yields records in the same order. Skipped
//! entries and cache directories are pruned inside jwalk's `process_read_dir`
//! hook, before their children are ever read.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Instant, UNIX_EPOCH};

use jwalk::{Parallelism, WalkDirGeneric};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use reclaim_core::{
    EcosystemTag, FileRecord, ScanConfig, ScanError, ScanStats, ScanWarning, WarningKind,
};

use crate::classify::{PathClassifier, is_system_root, match_cache_dir};
use crate::inode::{InodeTracker, device_of, inode_of};
use crate::progress::ScanProgress;

/// Per-entry client state: the ecosystem tag of a matched cache directory.
type WalkState = ((), Option<EcosystemTag>);

/// Send a progress update every this many files.
const PROGRESS_INTERVAL: u64 = 1000;

/// A cache directory found during the walk, not yet sized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRoot {
    /// Path to the directory.
    pub path: PathBuf,
    /// Matched ecosystem.
    pub ecosystem_tag: EcosystemTag,
}

/// Everything a walk produces.
#[derive(Debug, Clone)]
pub struct Walk {
    /// Canonical root path.
    pub root: PathBuf,
    /// Regular files outside cache directories, in discovery order.
    pub records: Vec<FileRecord>,
    /// Cache directories, in discovery order.
    pub cache_roots: Vec<CacheRoot>,
    /// Traversal statistics.
    pub stats: ScanStats,
    /// Recovered problems.
    pub warnings: Vec<ScanWarning>,
}

/// Resolve and validate a scan root.
///
/// Fails before any traversal when the root is missing, unreadable, not a
/// directory, or one of the deny-listed system roots.
pub fn resolve_root(root: &Path) -> Result<PathBuf, ScanError> {
    let root_path = root.canonicalize().map_err(|e| ScanError::io(root, e))?;

    if !root_path.is_dir() {
        return Err(ScanError::NotADirectory { path: root_path });
    }
    if is_system_root(&root_path) {
        return Err(ScanError::invalid_config(format!(
            "refusing to scan system directory {}",
            root_path.display()
        )));
    }
    std::fs::read_dir(&root_path).map_err(|e| ScanError::io(&root_path, e))?;

    Ok(root_path)
}

/// Directory walker producing file records and cache roots.
pub struct TreeWalker {
    progress_tx: broadcast::Sender<ScanProgress>,
}

impl TreeWalker {
    /// Create a new walker.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self { progress_tx }
    }

    /// Subscribe to walk progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Walk the configured root once.
    ///
    /// Returns [`ScanError::Cancelled`] if `cancel` fires; the partially
    /// collected records are dropped.
    pub fn walk(&self, config: &ScanConfig, cancel: &CancellationToken) -> Result<Walk, ScanError> {
        let start = Instant::now();
        let root_path = resolve_root(&config.root)?;
        let classifier = PathClassifier::new(&config.ignore_patterns)?;

        let root_metadata =
            std::fs::metadata(&root_path).map_err(|e| ScanError::io(&root_path, e))?;
        let root_device = device_of(&root_metadata);

        let visited = Arc::new(InodeTracker::new());
        if let Some(inode) = inode_of(&root_metadata) {
            visited.track(inode);
        }

        let follow_symlinks = config.follow_symlinks;
        let cross_filesystems = config.cross_filesystems;
        let walker = WalkDirGeneric::<WalkState>::new(&root_path)
            .parallelism(Parallelism::Serial)
            .sort(true)
            .skip_hidden(false)
            .follow_links(follow_symlinks)
            .min_depth(0)
            .max_depth(config.max_depth.map(|d| d as usize).unwrap_or(usize::MAX))
            .process_read_dir(move |depth, _dir, _state, children| {
                // The root itself arrives with no depth and is never classified.
                if depth.is_none() {
                    return;
                }

                children.retain(|result| {
                    let Ok(entry) = result else {
                        return true;
                    };
                    let is_dir = entry.file_type.is_dir();
                    let path = entry.path();
                    if classifier.should_skip(&path, is_dir) {
                        tracing::debug!(path = %path.display(), "skipping excluded entry");
                        return false;
                    }
                    if is_dir && !cross_filesystems {
                        if let Ok(metadata) = entry.metadata() {
                            return device_of(&metadata) == root_device;
                        }
                    }
                    true
                });

                for entry in children.iter_mut().flatten() {
                    if !entry.file_type.is_dir() {
                        continue;
                    }
                    if let Some(tag) = match_cache_dir(&entry.path()) {
                        entry.client_state = Some(tag);
                        entry.read_children_path = None;
                        continue;
                    }
                    if follow_symlinks {
                        let first_visit = entry
                            .metadata()
                            .ok()
                            .and_then(|m| inode_of(&m))
                            .is_none_or(|inode| visited.track(inode));
                        if !first_visit {
                            tracing::debug!(path = %entry.path().display(), "directory already visited, not descending");
                            entry.read_children_path = None;
                        }
                    }
                }
            });

        let mut records = Vec::new();
        let mut cache_roots = Vec::new();
        let mut stats = ScanStats::new();
        let mut warnings = Vec::new();

        for entry_result in walker {
            if cancel.is_cancelled() {
                tracing::info!(root = %root_path.display(), "walk cancelled");
                return Err(ScanError::Cancelled);
            }

            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let warning = walk_warning(&err, WarningKind::ReadError);
                    tracing::warn!(path = %warning.path.display(), "{}", warning.message);
                    warnings.push(warning);
                    continue;
                }
            };

            // jwalk yields a directory it could not list as `Ok`, with the
            // listing error attached.
            if let Some(err) = &entry.read_children_error {
                let warning = walk_warning(err, WarningKind::ReadError);
                tracing::warn!(path = %warning.path.display(), "{}", warning.message);
                warnings.push(warning);
            }

            let depth = entry.depth as u32;
            if depth == 0 {
                continue;
            }

            let path = entry.path();
            let file_type = entry.file_type;

            if let Some(ecosystem_tag) = entry.client_state {
                stats.record_dir(depth);
                tracing::debug!(path = %path.display(), %ecosystem_tag, "cache directory");
                cache_roots.push(CacheRoot {
                    path,
                    ecosystem_tag,
                });
            } else if file_type.is_dir() {
                stats.record_dir(depth);
            } else if file_type.is_symlink() {
                stats.record_symlink();
                if !path.exists() {
                    let target = std::fs::read_link(&path)
                        .map(|p| p.to_string_lossy().to_string())
                        .unwrap_or_default();
                    warnings.push(ScanWarning::broken_symlink(&path, &target));
                }
            } else if file_type.is_file() {
                let metadata = match entry.metadata() {
                    Ok(m) => m,
                    Err(err) => {
                        // Usually the file vanished between readdir and stat.
                        let warning = walk_warning(&err, WarningKind::MetadataError);
                        tracing::warn!(path = %path.display(), "{}", warning.message);
                        warnings.push(warning);
                        continue;
                    }
                };

                let size = metadata.len();
                let last_accessed = metadata
                    .accessed()
                    .or_else(|_| metadata.modified())
                    .unwrap_or(UNIX_EPOCH);

                let mut record = FileRecord::new(path, size, last_accessed);
                if let Some(inode) = inode_of(&metadata) {
                    record = record.with_inode(inode);
                }
                stats.record_file(size, depth);

                if stats.files_seen % PROGRESS_INTERVAL == 0 {
                    let _ = self.progress_tx.send(ScanProgress {
                        files_scanned: stats.files_seen,
                        dirs_scanned: stats.dirs_seen,
                        bytes_scanned: stats.bytes_seen,
                        cache_dirs_found: cache_roots.len() as u64,
                        current_path: record.path.clone(),
                        errors_count: warnings.len() as u64,
                        elapsed: start.elapsed(),
                    });
                }

                records.push(record);
            }
        }

        tracing::info!(
            root = %root_path.display(),
            files = stats.files_seen,
            dirs = stats.dirs_seen,
            cache_dirs = cache_roots.len(),
            warnings = warnings.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "walk complete"
        );

        Ok(Walk {
            root: root_path,
            records,
            cache_roots,
            stats,
            warnings,
        })
    }
}

impl Default for TreeWalker {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert a jwalk error into a warning, keeping permission problems distinct.
pub(crate) fn walk_warning(err: &jwalk::Error, kind: WarningKind) -> ScanWarning {
    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
    match err.io_error() {
        Some(io) => ScanWarning::from_io(path, io, kind),
        None => ScanWarning::new(path, err.to_string(), kind),
    }
}
