// src/archive.rs

//! Local cache of package source archives
//!
//! Archives are expensive to fetch and a full distribution has hundreds of
//! them, so the cache is idempotent across runs: a file already on disk is
//! reused without a second download. Content hashes are memoized per path
//! within a run; the memo is append-only, a hash is never recomputed once
//! stored. A freshly downloaded archive always hashes fresh, which keeps a
//! resumed run from trusting a stale memo seeded before the download.

use crate::error::{Error, Result};
use crate::fetch::HttpFetcher;
use crate::hash;
use flate2::read::GzDecoder;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// Archive cache: download-once storage plus per-run hash memoization
pub struct ArchiveCache {
    tar_dir: PathBuf,
    hashes: HashMap<PathBuf, String>,
}

impl ArchiveCache {
    /// Create a cache rooted at `tar_dir`, creating the directory if needed
    pub fn new(tar_dir: impl Into<PathBuf>) -> Result<Self> {
        let tar_dir = tar_dir.into();
        std::fs::create_dir_all(&tar_dir).map_err(|e| {
            Error::InitError(format!(
                "Failed to create archive cache directory {}: {e}",
                tar_dir.display()
            ))
        })?;
        Ok(Self {
            tar_dir,
            hashes: HashMap::new(),
        })
    }

    /// Cache directory root
    pub fn tar_dir(&self) -> &Path {
        &self.tar_dir
    }

    /// Cache path for a package archive
    ///
    /// Keyed by normalized name, rendered version, and distribution name so
    /// archives from different distros never collide.
    pub fn archive_path(&self, normalized_name: &str, version: &str, distro: &str) -> PathBuf {
        self.tar_dir
            .join(format!("{normalized_name}-{version}-{distro}.tar.gz"))
    }

    /// Ensure the archive exists locally, downloading it if absent
    ///
    /// Returns true when a download happened, false on a cache hit. A
    /// download failure after retries is an error for this package only.
    pub fn ensure(&self, fetcher: &HttpFetcher, url: &str, path: &Path) -> Result<bool> {
        if path.exists() {
            info!("using cached archive {}", path.display());
            return Ok(false);
        }

        fetcher.download_file(url, path)?;
        Ok(true)
    }

    /// Content hash of a cached archive, memoized per path
    ///
    /// `just_downloaded` forces a fresh computation; a cache hit only hashes
    /// when no memo entry exists yet.
    pub fn sha256_of(&mut self, path: &Path, just_downloaded: bool) -> Result<String> {
        if just_downloaded || !self.hashes.contains_key(path) {
            debug!("hashing archive {}", path.display());
            let digest = hash::sha256_file(path)?;
            self.hashes.insert(path.to_path_buf(), digest);
        }
        Ok(self.hashes[path].clone())
    }
}

/// Extract the package manifest from a cached archive
///
/// Release tarballs unpack to a single top-level directory with the manifest
/// directly below it; any member matching `<dir>/package.xml` is taken. This
/// fast path avoids a second network round-trip per package. `None` means
/// the archive layout holds no manifest at the expected depth and the caller
/// should fall back to fetching it.
pub fn read_manifest(path: &Path) -> Result<Option<Vec<u8>>> {
    let file = File::open(path)
        .map_err(|e| Error::IoError(format!("Failed to open {}: {e}", path.display())))?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));

    let entries = archive
        .entries()
        .map_err(|e| Error::ParseError(format!("Failed to read {}: {e}", path.display())))?;

    for entry in entries {
        let mut entry = entry
            .map_err(|e| Error::ParseError(format!("Corrupt archive {}: {e}", path.display())))?;
        let member_path = entry
            .path()
            .map_err(|e| Error::ParseError(format!("Bad archive member path: {e}")))?
            .into_owned();

        if is_toplevel_manifest(&member_path) {
            let mut buf = Vec::new();
            entry.read_to_end(&mut buf).map_err(|e| {
                Error::IoError(format!("Failed to read manifest from archive: {e}"))
            })?;
            return Ok(Some(buf));
        }
    }

    Ok(None)
}

/// True for paths of exactly the form `<dir>/package.xml`
fn is_toplevel_manifest(path: &Path) -> bool {
    let mut components = path.components();
    match (components.next(), components.next(), components.next()) {
        (Some(Component::Normal(_)), Some(Component::Normal(name)), None) => {
            name == std::ffi::OsStr::new("package.xml")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use tempfile::TempDir;

    fn write_tarball(path: &Path, members: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, data) in members {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_archive_path_keying() {
        let temp = TempDir::new().unwrap();
        let cache = ArchiveCache::new(temp.path()).unwrap();
        let path = cache.archive_path("big-bot", "1.2.3-r1", "humble");
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "big-bot-1.2.3-r1-humble.tar.gz"
        );
    }

    #[test]
    fn test_ensure_reuses_existing_file() {
        let temp = TempDir::new().unwrap();
        let cache = ArchiveCache::new(temp.path()).unwrap();
        let path = temp.path().join("cached.tar.gz");
        std::fs::write(&path, b"archive bytes").unwrap();

        let fetcher = HttpFetcher::new().unwrap();
        // An unroutable URL proves no download is attempted on a cache hit
        let downloaded = cache
            .ensure(&fetcher, "http://invalid.invalid/a.tar.gz", &path)
            .unwrap();
        assert!(!downloaded);
    }

    #[test]
    fn test_hash_memoized() {
        let temp = TempDir::new().unwrap();
        let mut cache = ArchiveCache::new(temp.path()).unwrap();
        let path = temp.path().join("a.tar.gz");
        std::fs::write(&path, b"abc").unwrap();

        let first = cache.sha256_of(&path, false).unwrap();
        // Mutate the file; the memo must still answer with the original hash
        std::fs::write(&path, b"different").unwrap();
        let second = cache.sha256_of(&path, false).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_fresh_download_rehashes() {
        let temp = TempDir::new().unwrap();
        let mut cache = ArchiveCache::new(temp.path()).unwrap();
        let path = temp.path().join("a.tar.gz");

        std::fs::write(&path, b"abc").unwrap();
        let stale = cache.sha256_of(&path, false).unwrap();

        std::fs::write(&path, b"fresh contents").unwrap();
        let fresh = cache.sha256_of(&path, true).unwrap();
        assert_ne!(stale, fresh);
    }

    #[test]
    fn test_read_manifest_fast_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pkg.tar.gz");
        write_tarball(
            &path,
            &[
                ("pkg-1.0.0/CMakeLists.txt", b"project(pkg)".as_slice()),
                ("pkg-1.0.0/package.xml", b"<package/>".as_slice()),
            ],
        );

        let manifest = read_manifest(&path).unwrap();
        assert_eq!(manifest.as_deref(), Some(b"<package/>".as_slice()));
    }

    #[test]
    fn test_read_manifest_wrong_depth() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pkg.tar.gz");
        write_tarball(
            &path,
            &[("pkg-1.0.0/sub/package.xml", b"<package/>".as_slice())],
        );

        assert!(read_manifest(&path).unwrap().is_none());
    }
}
