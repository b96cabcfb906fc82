// src/hash.rs

//! SHA-256 hashing for source archive integrity
//!
//! Both recipe formats declare the content hash of the package's source
//! tarball. Hashes are computed once per archive per run and memoized by
//! the archive cache, so this module only provides the raw digest helpers.

use crate::error::{Error, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Buffer size for streaming hash computation (8 KB)
const HASH_BUFFER_SIZE: usize = 8192;

/// Compute the SHA-256 digest of a byte slice as a lowercase hex string
pub fn sha256_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Compute the SHA-256 digest of all data from a reader
///
/// Streams in fixed-size chunks, never buffering the whole input in memory.
pub fn sha256_reader<R: Read>(reader: &mut R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; HASH_BUFFER_SIZE];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Compute the SHA-256 digest of a file on disk
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .map_err(|e| Error::IoError(format!("Failed to open {}: {e}", path.display())))?;
    sha256_reader(&mut file)
        .map_err(|e| Error::IoError(format!("Failed to hash {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_empty() {
        assert_eq!(
            sha256_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            sha256_bytes(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_sha256_reader_matches_bytes() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(1000);
        let mut cursor = std::io::Cursor::new(data.clone());
        assert_eq!(sha256_reader(&mut cursor).unwrap(), sha256_bytes(&data));
    }

    #[test]
    fn test_sha256_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, b"abc").unwrap();
        assert_eq!(
            sha256_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
