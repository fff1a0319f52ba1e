//! Subtree size summation for cache directories.
//!
//! Each call owns its walk and its hardlink set and never feeds the
//! classification pipeline, so cache contents are only ever counted here.

use std::path::Path;

use jwalk::{Parallelism, WalkDir};
use rayon::prelude::*;
use tokio_util::sync::CancellationToken;

use reclaim_core::{CacheDirectoryEntry, ScanError, ScanWarning, WarningKind};

use crate::inode::{InodeTracker, inode_of, link_count};
use crate::scanner::{CacheRoot, walk_warning};

/// Result of sizing one directory.
#[derive(Debug, Clone, Default)]
pub struct DirSize {
    /// Sum of regular file sizes, hardlinks counted once.
    pub bytes: u64,
    /// Files counted.
    pub files: u64,
    /// Problems encountered while sizing.
    pub warnings: Vec<ScanWarning>,
}

/// Sum the bytes of every regular file beneath `path`. Symlinks are not followed.
pub fn directory_size(path: &Path, cancel: &CancellationToken) -> Result<DirSize, ScanError> {
    let hardlinks = InodeTracker::new();
    let mut size = DirSize::default();

    let walker = WalkDir::new(path)
        .parallelism(Parallelism::Serial)
        .skip_hidden(false)
        .follow_links(false);

    for entry_result in walker {
        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        let entry = match entry_result {
            Ok(e) => e,
            Err(err) => {
                size.warnings.push(walk_warning(&err, WarningKind::ReadError));
                continue;
            }
        };
        if let Some(err) = &entry.read_children_error {
            size.warnings.push(walk_warning(err, WarningKind::ReadError));
        }
        if !entry.file_type().is_file() {
            continue;
        }

        match entry.metadata() {
            Ok(metadata) => {
                let counted = link_count(&metadata) <= 1
                    || inode_of(&metadata).is_none_or(|inode| hardlinks.track(inode));
                if counted {
                    size.bytes += metadata.len();
                    size.files += 1;
                }
            }
            Err(err) => size
                .warnings
                .push(walk_warning(&err, WarningKind::MetadataError)),
        }
    }

    Ok(size)
}

/// Size every cache root in parallel, preserving discovery order.
pub fn size_cache_roots(
    roots: &[CacheRoot],
    cancel: &CancellationToken,
) -> Result<(Vec<CacheDirectoryEntry>, Vec<ScanWarning>), ScanError> {
    let sized: Vec<(CacheDirectoryEntry, Vec<ScanWarning>)> = roots
        .par_iter()
        .map(|root| -> Result<_, ScanError> {
            let size = directory_size(&root.path, cancel)?;
            tracing::debug!(
                path = %root.path.display(),
                bytes = size.bytes,
                files = size.files,
                "sized cache directory"
            );
            Ok((
                CacheDirectoryEntry::new(root.path.clone(), root.ecosystem_tag, size.bytes),
                size.warnings,
            ))
        })
        .collect::<Result<_, ScanError>>()?;

    let mut entries = Vec::with_capacity(sized.len());
    let mut warnings = Vec::new();
    for (entry, entry_warnings) in sized {
        entries.push(entry);
        warnings.extend(entry_warnings);
    }
    Ok((entries, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_directory_size_sums_nested_files() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("a/b/c")).unwrap();
        fs::write(root.join("a/one"), vec![0u8; 100]).unwrap();
        fs::write(root.join("a/b/two"), vec![0u8; 200]).unwrap();
        fs::write(root.join("a/b/c/.three"), vec![0u8; 300]).unwrap();

        let size = directory_size(root, &CancellationToken::new()).unwrap();
        assert_eq!(size.bytes, 600);
        assert_eq!(size.files, 3);
        assert!(size.warnings.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_directory_size_counts_hardlinks_once() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("original"), vec![1u8; 500]).unwrap();
        fs::hard_link(root.join("original"), root.join("link")).unwrap();

        let size = directory_size(root, &CancellationToken::new()).unwrap();
        assert_eq!(size.bytes, 500);
    }

    #[test]
    fn test_size_cache_roots_keeps_order() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("x/node_modules")).unwrap();
        fs::create_dir_all(root.join("y/target")).unwrap();
        fs::write(root.join("x/node_modules/m.js"), vec![0u8; 10]).unwrap();
        fs::write(root.join("y/target/out.o"), vec![0u8; 20]).unwrap();

        let roots = vec![
            CacheRoot {
                path: root.join("x/node_modules"),
                ecosystem_tag: reclaim_core::EcosystemTag::Npm,
            },
            CacheRoot {
                path: root.join("y/target"),
                ecosystem_tag: reclaim_core::EcosystemTag::Cargo,
            },
        ];
        let (entries, warnings) = size_cache_roots(&roots, &CancellationToken::new()).unwrap();

        assert!(warnings.is_empty());
        assert_eq!(entries[0].total_size_bytes, 10);
        assert_eq!(entries[1].total_size_bytes, 20);
        assert_eq!(entries[1].ecosystem_tag, reclaim_core::EcosystemTag::Cargo);
    }
}
