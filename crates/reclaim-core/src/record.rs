//! Discovered file records.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

/// BLAKE3 content hash for duplicate detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the hash as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// Inode information for hardlink and cycle detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InodeInfo {
    /// Inode number.
    pub inode: u64,
    /// Device ID.
    pub device: u64,
}

impl InodeInfo {
    /// Create new inode info.
    pub fn new(inode: u64, device: u64) -> Self {
        Self { inode, device }
    }
}

/// One regular file discovered during traversal.
///
/// Records are created once by the traversal and only read afterwards. The
/// duplicate grouper attaches a digest to its own copies via
/// [`FileRecord::with_digest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Absolute path.
    pub path: PathBuf,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Last access time, or modification time where access time is unavailable.
    pub last_accessed: SystemTime,
    /// Inode identity, used to collapse hard links.
    pub inode: Option<InodeInfo>,
    /// Content digest, present only once hashed.
    pub digest: Option<ContentHash>,
}

impl FileRecord {
    /// Create a record without a digest.
    pub fn new(path: impl Into<PathBuf>, size_bytes: u64, last_accessed: SystemTime) -> Self {
        Self {
            path: path.into(),
            size_bytes,
            last_accessed,
            inode: None,
            digest: None,
        }
    }

    /// Attach inode identity.
    pub fn with_inode(mut self, inode: InodeInfo) -> Self {
        self.inode = Some(inode);
        self
    }

    /// Attach a content digest.
    pub fn with_digest(mut self, digest: ContentHash) -> Self {
        self.digest = Some(digest);
        self
    }

    /// Time since last access as seen from `now`. Future timestamps count as zero.
    pub fn idle_for(&self, now: SystemTime) -> Duration {
        now.duration_since(self.last_accessed)
            .unwrap_or(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_hex() {
        let hash = ContentHash::new([0xab; 32]);
        assert_eq!(hash.to_hex().len(), 64);
        assert!(hash.to_hex().starts_with("abab"));
    }

    #[test]
    fn test_content_hash_ordering() {
        assert!(ContentHash::new([0x01; 32]) < ContentHash::new([0x02; 32]));
    }

    #[test]
    fn test_idle_for() {
        let now = SystemTime::now();
        let record = FileRecord::new("/a", 1, now - Duration::from_secs(60));
        assert_eq!(record.idle_for(now), Duration::from_secs(60));

        let future = FileRecord::new("/b", 1, now + Duration::from_secs(60));
        assert_eq!(future.idle_for(now), Duration::ZERO);
    }

    #[test]
    fn test_with_digest_keeps_metadata() {
        let now = SystemTime::now();
        let record = FileRecord::new("/a", 42, now).with_inode(InodeInfo::new(7, 1));
        let hashed = record.clone().with_digest(ContentHash::new([0; 32]));

        assert!(record.digest.is_none());
        assert_eq!(hashed.size_bytes, 42);
        assert_eq!(hashed.inode, Some(InodeInfo::new(7, 1)));
        assert!(hashed.digest.is_some());
    }
}
