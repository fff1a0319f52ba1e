//! Cache and build-artifact directory types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr};

/// Ecosystem a regenerable cache or build directory belongs to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
pub enum EcosystemTag {
    /// Project `node_modules`.
    #[strum(serialize = "npm/yarn")]
    Npm,
    /// User-level npm cache (`~/.npm`).
    #[strum(serialize = "npm global cache")]
    NpmGlobal,
    /// Cargo `target` directory.
    #[strum(serialize = "Rust/Cargo")]
    Cargo,
    /// Cargo registry cache (`~/.cargo/registry`).
    #[strum(serialize = "Cargo registry")]
    CargoRegistry,
    /// Python bytecode cache.
    #[strum(serialize = "Python")]
    PythonCache,
    /// pip download cache.
    #[strum(serialize = "pip")]
    Pip,
    /// pytest cache.
    #[strum(serialize = "pytest")]
    Pytest,
    /// mypy cache.
    #[strum(serialize = "mypy")]
    Mypy,
    /// Generic `.cache` directory.
    #[strum(serialize = "Generic cache")]
    GenericCache,
    /// Build output.
    #[strum(serialize = "Build output")]
    BuildOutput,
    /// Distribution output.
    #[strum(serialize = "Distribution")]
    Distribution,
}

impl EcosystemTag {
    /// Human-readable label.
    pub fn label(self) -> &'static str {
        self.into()
    }
}

/// A matched cache or build-artifact directory, reclaimable as a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheDirectoryEntry {
    /// Path to the directory.
    pub path: PathBuf,
    /// Ecosystem the directory belongs to.
    pub ecosystem_tag: EcosystemTag,
    /// Sum of all file bytes beneath the directory.
    pub total_size_bytes: u64,
}

impl CacheDirectoryEntry {
    /// Create a new cache directory entry.
    pub fn new(path: impl Into<PathBuf>, ecosystem_tag: EcosystemTag, total_size_bytes: u64) -> Self {
        Self {
            path: path.into(),
            ecosystem_tag,
            total_size_bytes,
        }
    }
}
