//! Inode tracking for link cycles and hardlinks.

use dashmap::DashSet;
use reclaim_core::InodeInfo;

/// Set of seen `(inode, device)` pairs.
///
/// The walker uses one to refuse re-entering a directory reached through a
/// followed symlink, and the directory sizer uses one to count hardlinked
/// bytes once. Each walk owns its own tracker.
#[derive(Debug, Default)]
pub struct InodeTracker {
    seen: DashSet<InodeInfo>,
}

impl InodeTracker {
    /// Create a new inode tracker.
    pub fn new() -> Self {
        Self {
            seen: DashSet::new(),
        }
    }

    /// Track an inode. Returns `true` if this is the first time seeing it.
    pub fn track(&self, info: InodeInfo) -> bool {
        self.seen.insert(info)
    }
}

/// Read the inode identity from metadata (Unix only).
#[cfg(unix)]
pub(crate) fn inode_of(metadata: &std::fs::Metadata) -> Option<InodeInfo> {
    use std::os::unix::fs::MetadataExt;
    Some(InodeInfo::new(metadata.ino(), metadata.dev()))
}

#[cfg(not(unix))]
pub(crate) fn inode_of(_metadata: &std::fs::Metadata) -> Option<InodeInfo> {
    None
}

/// Get the device ID from metadata.
#[cfg(unix)]
pub(crate) fn device_of(metadata: &std::fs::Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    metadata.dev()
}

#[cfg(not(unix))]
pub(crate) fn device_of(_metadata: &std::fs::Metadata) -> u64 {
    0
}

/// Get the number of hard links from metadata.
#[cfg(unix)]
pub(crate) fn link_count(metadata: &std::fs::Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    metadata.nlink()
}

#[cfg(not(unix))]
pub(crate) fn link_count(_metadata: &std::fs::Metadata) -> u64 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_new_inode() {
        let tracker = InodeTracker::new();
        let info = InodeInfo::new(12345, 1);

        assert!(tracker.track(info));
        assert!(!tracker.track(info));
    }

    #[test]
    fn test_different_devices() {
        let tracker = InodeTracker::new();
        assert!(tracker.track(InodeInfo::new(12345, 1)));
        assert!(tracker.track(InodeInfo::new(12345, 2)));
    }
}
