//! Scan entry point: walk once, classify concurrently, aggregate.

use std::time::{Instant, SystemTime};

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use reclaim_core::{ScanConfig, ScanError, ScanReport};
use reclaim_scan::{ScanProgress, TreeWalker, size_cache_roots};

use crate::aggregate::{ReportParts, aggregate};
use crate::duplicates::{DuplicateConfig, DuplicateGrouper};
use crate::filters::{large_files, stale_files};

/// Filesystem analysis engine.
///
/// The walk is sequential. Once it completes, the large-file filter, the
/// stale filter, duplicate grouping and cache sizing run as independent
/// rayon tasks over the same record snapshot and are joined before the
/// report is built.
pub struct Engine {
    walker: TreeWalker,
}

impl Engine {
    /// Create a new engine.
    pub fn new() -> Self {
        Self {
            walker: TreeWalker::new(),
        }
    }

    /// Subscribe to walk progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.walker.subscribe()
    }

    /// Scan the configured root.
    pub fn scan(&self, config: &ScanConfig) -> Result<ScanReport, ScanError> {
        self.scan_with_cancel(config, &CancellationToken::new())
    }

    /// Scan the configured root, stopping early if `cancel` fires.
    ///
    /// A cancelled scan returns [`ScanError::Cancelled`] and never a partial
    /// report.
    pub fn scan_with_cancel(
        &self,
        config: &ScanConfig,
        cancel: &CancellationToken,
    ) -> Result<ScanReport, ScanError> {
        let start = Instant::now();
        let now = SystemTime::now();
        let walk = self.walker.walk(config, cancel)?;

        let records = &walk.records;
        let grouper = DuplicateGrouper::with_config(DuplicateConfig::from_scan_config(config));

        let ((large, stale), (duplicates, caches)) = rayon::join(
            || {
                rayon::join(
                    || {
                        large_files(
                            records,
                            config.large_file_threshold_bytes,
                            config.max_large_files_reported,
                        )
                    },
                    || stale_files(records, config.stale_after, now),
                )
            },
            || {
                rayon::join(
                    || grouper.find(records, cancel),
                    || size_cache_roots(&walk.cache_roots, cancel),
                )
            },
        );

        let duplicates = duplicates?;
        let (caches, cache_warnings) = caches?;
        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        let mut warnings = walk.warnings;
        warnings.extend(cache_warnings);
        warnings.extend(duplicates.warnings);

        let report = aggregate(ReportParts {
            root: walk.root,
            stats: walk.stats,
            large,
            duplicates: duplicates.groups,
            caches,
            stale,
            warnings,
        });

        tracing::info!(
            root = %report.root.display(),
            reclaimable = report.total_reclaimable_bytes,
            duplicate_groups = report.duplicate_groups.len(),
            cache_dirs = report.cache_directories.len(),
            large = report.large_file_count,
            stale = report.stale_count(),
            hashed = duplicates.candidates_hashed,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "scan complete"
        );

        Ok(report)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Scan `config.root` with a fresh engine.
pub fn scan(config: &ScanConfig) -> Result<ScanReport, ScanError> {
    Engine::new().scan(config)
}
