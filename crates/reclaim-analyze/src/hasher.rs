//! Streaming content hashing.
//!
//! Files are read in fixed-size chunks, so memory use does not depend on
//! file size. Two files with equal size and equal BLAKE3 digest are treated
//! as identical unless byte verification is requested.
//!
//! Reading a file moves its access time forward on most mounts. Every file
//! opened here gets its previous access time back once reading ends, so a
//! scan leaves staleness untouched.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use blake3::Hasher;
use filetime::FileTime;

use reclaim_core::ContentHash;

/// Read buffer size for hashing and comparison.
pub const HASH_CHUNK_SIZE: usize = 64 * 1024;

/// A read-only file that restores its access time when dropped.
struct QuietFile {
    file: File,
    path: PathBuf,
    accessed: FileTime,
}

impl QuietFile {
    fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let metadata = file.metadata()?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
            accessed: FileTime::from_last_access_time(&metadata),
        })
    }

    fn len(&self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }
}

impl Read for QuietFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Drop for QuietFile {
    fn drop(&mut self) {
        // Fails for files owned by someone else; the scan still succeeds.
        if let Err(e) = filetime::set_file_handle_times(&self.file, Some(self.accessed), None) {
            tracing::debug!(path = %self.path.display(), error = %e, "could not restore access time");
        }
    }
}

/// Compute the BLAKE3 digest of a file's contents.
pub fn digest(path: &Path) -> io::Result<ContentHash> {
    let mut file = QuietFile::open(path)?;
    let mut hasher = Hasher::new();
    let mut buffer = vec![0u8; HASH_CHUNK_SIZE];

    loop {
        let bytes_read = read_chunk(&mut file, &mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(ContentHash::new(*hasher.finalize().as_bytes()))
}

/// Compare two files byte for byte.
pub fn contents_equal(a: &Path, b: &Path) -> io::Result<bool> {
    let mut file_a = QuietFile::open(a)?;
    let mut file_b = QuietFile::open(b)?;
    if file_a.len()? != file_b.len()? {
        return Ok(false);
    }

    let mut buf_a = vec![0u8; HASH_CHUNK_SIZE];
    let mut buf_b = vec![0u8; HASH_CHUNK_SIZE];
    loop {
        let read_a = read_chunk(&mut file_a, &mut buf_a)?;
        let read_b = read_chunk(&mut file_b, &mut buf_b)?;
        if read_a != read_b || buf_a[..read_a] != buf_b[..read_b] {
            return Ok(false);
        }
        if read_a == 0 {
            return Ok(true);
        }
    }
}

/// Fill `buf` as far as possible; returns fewer bytes only at end of file.
fn read_chunk(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_files() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::write(root.join("file1.txt"), "duplicate content here").unwrap();
        fs::write(root.join("file2.txt"), "duplicate content here").unwrap();
        fs::write(root.join("file3.txt"), "unique content").unwrap();
        fs::write(root.join("file4.txt"), "duplicate content HERE").unwrap();

        temp
    }

    #[test]
    fn test_digest_equal_content() {
        let temp = create_test_files();

        let hash1 = digest(&temp.path().join("file1.txt")).unwrap();
        let hash2 = digest(&temp.path().join("file2.txt")).unwrap();
        let hash3 = digest(&temp.path().join("file3.txt")).unwrap();

        assert_eq!(hash1, hash2);
        assert_ne!(hash1, hash3);
    }

    #[test]
    fn test_digest_matches_one_shot_blake3() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("big.bin");
        let data: Vec<u8> = (0..(HASH_CHUNK_SIZE * 3 + 17)).map(|i| (i % 251) as u8).collect();
        fs::write(&path, &data).unwrap();

        let streamed = digest(&path).unwrap();
        assert_eq!(streamed.0, *blake3::hash(&data).as_bytes());
    }

    #[test]
    fn test_digest_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = digest(&temp.path().join("gone")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    fn backdate(path: &Path, days: u64) -> FileTime {
        let when = std::time::SystemTime::now() - std::time::Duration::from_secs(days * 86_400);
        let atime = FileTime::from_system_time(when);
        filetime::set_file_atime(path, atime).unwrap();
        FileTime::from_last_access_time(&fs::metadata(path).unwrap())
    }

    fn accessed(path: &Path) -> FileTime {
        FileTime::from_last_access_time(&fs::metadata(path).unwrap())
    }

    #[test]
    fn test_reading_keeps_access_time() {
        let temp = create_test_files();
        let a = temp.path().join("file1.txt");
        let b = temp.path().join("file2.txt");
        let before_a = backdate(&a, 200);
        let before_b = backdate(&b, 300);

        digest(&a).unwrap();
        assert!(contents_equal(&a, &b).unwrap());

        assert_eq!(accessed(&a), before_a);
        assert_eq!(accessed(&b), before_b);
    }

    #[test]
    fn test_contents_equal() {
        let temp = create_test_files();
        let root = temp.path();

        assert!(contents_equal(&root.join("file1.txt"), &root.join("file2.txt")).unwrap());
        // Same length, different bytes.
        assert!(!contents_equal(&root.join("file1.txt"), &root.join("file4.txt")).unwrap());
        assert!(!contents_equal(&root.join("file1.txt"), &root.join("file3.txt")).unwrap());
    }
}
