//! Duplicate file detection using content hashing.
//!
//! Two phases keep disk I/O low:
//! 1. Partition files by size; a file with a unique size has no duplicate
//! 2. Hash only the remaining candidates (in parallel) and group by
//!    `(size, digest)`
//!
//! Paths inside a group keep their discovery order, so the first path is a
//! stable choice for the copy to keep.

use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use derive_builder::Builder;
use indexmap::IndexMap;
use rayon::prelude::*;
use tokio_util::sync::CancellationToken;

use reclaim_core::{
    ContentHash, DEFAULT_MIN_DUPLICATE_SIZE, DuplicateGroup, FileRecord, ScanConfig, ScanError,
    ScanWarning,
};

use crate::hasher::{contents_equal, digest};

/// Configuration for duplicate detection.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct DuplicateConfig {
    /// Files no larger than this are skipped.
    #[builder(default = "DEFAULT_MIN_DUPLICATE_SIZE")]
    pub min_size: u64,

    /// Confirm digest matches with a full byte comparison.
    #[builder(default = "false")]
    pub verify_contents: bool,

    /// Hashing threads (0 = rayon's global pool).
    #[builder(default = "0")]
    pub threads: usize,
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            min_size: DEFAULT_MIN_DUPLICATE_SIZE,
            verify_contents: false,
            threads: 0,
        }
    }
}

impl DuplicateConfig {
    /// Create a new config builder.
    pub fn builder() -> DuplicateConfigBuilder {
        DuplicateConfigBuilder::default()
    }

    /// Take the duplicate-related settings from a scan config.
    pub fn from_scan_config(config: &ScanConfig) -> Self {
        Self {
            min_size: config.min_duplicate_size_bytes,
            verify_contents: config.verify_contents,
            threads: config.hash_threads,
        }
    }
}

/// Results from duplicate analysis.
#[derive(Debug, Clone, Default)]
pub struct DuplicateScan {
    /// Groups sorted by reclaimable bytes descending, then digest.
    pub groups: Vec<DuplicateGroup>,
    /// Files that shared a size with another file and were hashed.
    pub candidates_hashed: u64,
    /// Files dropped because they could not be read.
    pub warnings: Vec<ScanWarning>,
}

impl DuplicateScan {
    /// Total bytes that removing redundant copies would free.
    pub fn reclaimable_bytes(&self) -> u64 {
        self.groups.iter().map(DuplicateGroup::reclaimable_bytes).sum()
    }
}

/// Duplicate file finder.
pub struct DuplicateGrouper {
    config: DuplicateConfig,
}

impl DuplicateGrouper {
    /// Create a new grouper with default config.
    pub fn new() -> Self {
        Self {
            config: DuplicateConfig::default(),
        }
    }

    /// Create a new grouper with custom config.
    pub fn with_config(config: DuplicateConfig) -> Self {
        Self { config }
    }

    /// Group records by content, ignoring files that could not be hashed.
    ///
    /// Fails only when the dedicated hashing pool cannot be built.
    pub fn group(&self, records: &[FileRecord]) -> Result<Vec<DuplicateGroup>, ScanError> {
        Ok(self.find(records, &CancellationToken::new())?.groups)
    }

    /// Find duplicate groups among `records`.
    ///
    /// Cancellation is checked before each file is hashed.
    pub fn find(
        &self,
        records: &[FileRecord],
        cancel: &CancellationToken,
    ) -> Result<DuplicateScan, ScanError> {
        let candidates = self.size_candidates(records);
        if candidates.is_empty() {
            return Ok(DuplicateScan::default());
        }

        let candidates_hashed = candidates.len() as u64;
        tracing::debug!(candidates = candidates_hashed, "hashing duplicate candidates");

        let hashed = self.hash_candidates(&candidates, cancel)?;

        let mut warnings = Vec::new();
        let mut by_content: IndexMap<(u64, ContentHash), Vec<PathBuf>> = IndexMap::new();
        for result in hashed {
            match result {
                Ok(record) => {
                    if let Some(hash) = record.digest {
                        by_content
                            .entry((record.size_bytes, hash))
                            .or_default()
                            .push(record.path);
                    }
                }
                Err(warning) => warnings.push(warning),
            }
        }

        let mut groups: Vec<DuplicateGroup> = by_content
            .into_iter()
            .filter(|(_, paths)| paths.len() >= 2)
            .map(|((size_bytes, digest), paths)| DuplicateGroup {
                digest,
                size_bytes,
                paths,
            })
            .collect();

        if self.config.verify_contents {
            groups = self.verify_groups(groups, cancel, &mut warnings)?;
        }

        groups.sort_by(|a, b| {
            b.reclaimable_bytes()
                .cmp(&a.reclaimable_bytes())
                .then_with(|| a.digest.cmp(&b.digest))
                .then_with(|| a.paths.cmp(&b.paths))
        });

        Ok(DuplicateScan {
            groups,
            candidates_hashed,
            warnings,
        })
    }

    /// Phase 1: keep files whose size is shared with at least one other file.
    ///
    /// Empty files never qualify, whatever the minimum.
    ///
    /// Hard links to one inode collapse to the first discovered path, since
    /// removing the others frees nothing.
    fn size_candidates<'a>(&self, records: &'a [FileRecord]) -> Vec<&'a FileRecord> {
        let mut seen_inodes = HashSet::new();
        let eligible: Vec<&FileRecord> = records
            .iter()
            .filter(|r| r.size_bytes > self.config.min_size)
            .filter(|r| r.inode.is_none_or(|inode| seen_inodes.insert(inode)))
            .collect();

        let mut size_counts: IndexMap<u64, usize> = IndexMap::new();
        for record in &eligible {
            *size_counts.entry(record.size_bytes).or_default() += 1;
        }

        eligible
            .into_iter()
            .filter(|r| size_counts.get(&r.size_bytes).is_some_and(|&n| n > 1))
            .collect()
    }

    /// Phase 2: hash every candidate, preserving input order.
    fn hash_candidates(
        &self,
        candidates: &[&FileRecord],
        cancel: &CancellationToken,
    ) -> Result<Vec<Result<FileRecord, ScanWarning>>, ScanError> {
        let hash_all = || {
            candidates
                .par_iter()
                .map(|record| {
                    if cancel.is_cancelled() {
                        return Err(ScanError::Cancelled);
                    }
                    Ok(match digest(&record.path) {
                        Ok(hash) => Ok((*record).clone().with_digest(hash)),
                        Err(err) => {
                            tracing::warn!(path = %record.path.display(), error = %err, "failed to hash file");
                            Err(ScanWarning::hash_error(&record.path, &err))
                        }
                    })
                })
                .collect::<Result<Vec<_>, ScanError>>()
        };

        if self.config.threads == 0 {
            return hash_all();
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()
            .map_err(|e| ScanError::Other {
                message: format!("failed to build hashing pool: {e}"),
            })?;
        pool.install(hash_all)
    }

    /// Split groups whose members do not match byte for byte.
    ///
    /// The first readable path anchors each comparison round. A path that
    /// cannot be read is dropped with a warning and the rest of its group
    /// is still compared.
    fn verify_groups(
        &self,
        groups: Vec<DuplicateGroup>,
        cancel: &CancellationToken,
        warnings: &mut Vec<ScanWarning>,
    ) -> Result<Vec<DuplicateGroup>, ScanError> {
        let mut verified = Vec::with_capacity(groups.len());

        for group in groups {
            let mut remaining = group.paths;
            'round: while remaining.len() >= 2 {
                if cancel.is_cancelled() {
                    return Err(ScanError::Cancelled);
                }

                let anchor = remaining.remove(0);
                if let Err(err) = File::open(&anchor) {
                    warnings.push(unreadable(&anchor, &err));
                    continue;
                }

                let mut matching = vec![anchor.clone()];
                let mut rest = Vec::new();
                let mut failed = Vec::new();
                for path in &remaining {
                    match contents_equal(&anchor, path) {
                        Ok(true) => matching.push(path.clone()),
                        Ok(false) => {
                            tracing::warn!(
                                digest = %group.digest.to_hex(),
                                path = %path.display(),
                                "digest collision, contents differ"
                            );
                            rest.push(path.clone());
                        }
                        Err(err) => {
                            // Blame the anchor if it went away mid-round and
                            // start over with the other paths.
                            if let Err(anchor_err) = File::open(&anchor) {
                                warnings.push(unreadable(&anchor, &anchor_err));
                                continue 'round;
                            }
                            failed.push((path, err));
                        }
                    }
                }
                warnings.extend(failed.into_iter().map(|(path, err)| unreadable(path, &err)));

                if matching.len() >= 2 {
                    verified.push(DuplicateGroup {
                        digest: group.digest,
                        size_bytes: group.size_bytes,
                        paths: matching,
                    });
                }
                remaining = rest;
            }
        }

        Ok(verified)
    }
}

fn unreadable(path: &Path, err: &std::io::Error) -> ScanWarning {
    tracing::warn!(path = %path.display(), error = %err, "failed to verify file");
    ScanWarning::hash_error(path, err)
}

impl Default for DuplicateGrouper {
    fn default() -> Self {
        Self::new()
    }
}
