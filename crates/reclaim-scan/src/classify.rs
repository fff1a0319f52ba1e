//! Entry classification: what to skip and what is a cache directory.

use std::path::{Component, Path};

use globset::{Glob, GlobSet, GlobSetBuilder};

use reclaim_core::{EcosystemTag, ScanError};

/// Version-control metadata directories, skipped at any depth.
pub const VCS_DIRS: &[&str] = &[".git", ".hg", ".svn", ".bzr", "_darcs", "CVS"];

/// Trash directory names, skipped at any depth. Names starting with
/// `.Trash-` (per-user trash on removable volumes) are skipped too.
pub const TRASH_DIRS: &[&str] = &[".Trash", ".Trashes"];

/// Freedesktop trash location under a home directory.
const FREEDESKTOP_TRASH: &str = ".local/share/Trash";

/// Directories whose children are skipped unless they are known caches.
const SYSTEM_CACHE_PARENTS: &[&str] = &["Library/Caches"];

/// Operating-system roots that are never scanned.
pub const SYSTEM_ROOTS: &[&str] = &[
    "/proc",
    "/sys",
    "/dev",
    "/run",
    "/System",
    "/Volumes",
    "/private/var/vm",
];

/// Known cache and build-artifact directories.
///
/// Patterns containing `/` match the trailing components of a path, the
/// rest match a directory name exactly.
pub const CACHE_PATTERNS: &[(&str, EcosystemTag)] = &[
    ("node_modules", EcosystemTag::Npm),
    (".npm", EcosystemTag::NpmGlobal),
    ("target", EcosystemTag::Cargo),
    (".cargo/registry", EcosystemTag::CargoRegistry),
    ("__pycache__", EcosystemTag::PythonCache),
    ("Caches/pip", EcosystemTag::Pip),
    (".pytest_cache", EcosystemTag::Pytest),
    (".mypy_cache", EcosystemTag::Mypy),
    (".cache", EcosystemTag::GenericCache),
    ("build", EcosystemTag::BuildOutput),
    ("dist", EcosystemTag::Distribution),
];

/// Check whether a path is one of the deny-listed system roots.
pub fn is_system_root(path: &Path) -> bool {
    SYSTEM_ROOTS.iter().any(|root| path == Path::new(root))
}

/// Decides which entries are skipped outright.
#[derive(Debug, Clone)]
pub struct PathClassifier {
    ignore: GlobSet,
}

impl PathClassifier {
    /// Build a classifier with extra file name globs to ignore.
    pub fn new(ignore_patterns: &[String]) -> Result<Self, ScanError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in ignore_patterns {
            let glob = Glob::new(pattern).map_err(|e| {
                ScanError::invalid_config(format!("bad ignore pattern {pattern:?}: {e}"))
            })?;
            builder.add(glob);
        }
        let ignore = builder
            .build()
            .map_err(|e| ScanError::invalid_config(e.to_string()))?;
        Ok(Self { ignore })
    }

    /// Whether an entry (and, for directories, everything beneath it) is skipped.
    pub fn should_skip(&self, path: &Path, is_dir: bool) -> bool {
        if is_system_root(path) {
            return true;
        }
        let Some(name) = path.file_name() else {
            return false;
        };
        if is_dir && VCS_DIRS.iter().any(|vcs| name == *vcs) {
            return true;
        }
        if is_dir && is_trash_dir(path) {
            return true;
        }
        if in_system_cache(path) && !(is_dir && match_cache_dir(path).is_some()) {
            return true;
        }
        self.ignore.is_match(name)
    }
}

impl Default for PathClassifier {
    fn default() -> Self {
        Self {
            ignore: GlobSet::empty(),
        }
    }
}

/// Look up a directory name in the cache table.
pub fn match_dir_name(dir_name: &str) -> Option<EcosystemTag> {
    CACHE_PATTERNS
        .iter()
        .find(|(pattern, _)| !pattern.contains('/') && *pattern == dir_name)
        .map(|(_, tag)| *tag)
}

/// Look up a directory path in the cache table, including multi-component
/// patterns such as `.cargo/registry`.
pub fn match_cache_dir(path: &Path) -> Option<EcosystemTag> {
    let suffix_match = CACHE_PATTERNS
        .iter()
        .filter(|(pattern, _)| pattern.contains('/'))
        .find(|(pattern, _)| ends_with_components(path, pattern))
        .map(|(_, tag)| *tag);

    suffix_match.or_else(|| {
        path.file_name()
            .and_then(|n| n.to_str())
            .and_then(match_dir_name)
    })
}

fn is_trash_dir(path: &Path) -> bool {
    let named_trash = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| TRASH_DIRS.contains(&name) || name.starts_with(".Trash-"));
    named_trash || ends_with_components(path, FREEDESKTOP_TRASH)
}

fn in_system_cache(path: &Path) -> bool {
    path.parent().is_some_and(|parent| {
        SYSTEM_CACHE_PARENTS
            .iter()
            .any(|pattern| ends_with_components(parent, pattern))
    })
}

fn ends_with_components(path: &Path, pattern: &str) -> bool {
    let mut tail = path.components().rev().filter_map(|c| match c {
        Component::Normal(name) => Some(name),
        _ => None,
    });
    pattern
        .rsplit('/')
        .all(|part| tail.next().is_some_and(|name| name == part))
}
