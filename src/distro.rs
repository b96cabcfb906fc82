// src/distro.rs

//! Distribution snapshot: the per-run, read-only view of a ROS distribution
//!
//! A snapshot is loaded once from the distribution index (a YAML file
//! mapping release repositories to package lists, versions, and tags) and
//! consulted for the remainder of the run. It answers three questions per
//! package: which repository releases it, at what version, and where its
//! source archive and manifest can be fetched.

use crate::error::{Error, Result};
use crate::fetch::HttpFetcher;
use crate::version::ReleaseVersion;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// Default URL template for the distribution index
pub const DEFAULT_INDEX_URL: &str =
    "https://raw.githubusercontent.com/ros/rosdistro/master/{distro}/distribution.yaml";

/// Release tag template used when a repository does not declare its own
const DEFAULT_RELEASE_TAG: &str = "release/{distro}/{package}/{version}";

/// Raw distribution index as parsed from YAML
#[derive(Debug, Deserialize)]
struct DistributionFile {
    #[serde(default)]
    repositories: BTreeMap<String, RepositoryEntry>,
}

#[derive(Debug, Deserialize)]
struct RepositoryEntry {
    release: Option<ReleaseRepository>,
}

/// Release section of a repository entry in the distribution index
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseRepository {
    /// Release repository URL (usually a `-release` GitHub repository)
    pub url: String,
    /// Release version in `major.minor.patch-increment` form
    #[serde(default)]
    pub version: Option<String>,
    /// Packages released from this repository; defaults to the repository name
    #[serde(default)]
    pub packages: Vec<String>,
    /// Tag templates, keyed by tag kind (`release` is the one we expand)
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

/// Immutable per-run view of a distribution
pub struct Snapshot {
    name: String,
    repositories: BTreeMap<String, ReleaseRepository>,
    /// package name → repository key
    packages: BTreeMap<String, String>,
}

impl Snapshot {
    /// Fetch and parse the distribution index for the named distro
    pub fn fetch(distro: &str, fetcher: &HttpFetcher, index_url: Option<&str>) -> Result<Self> {
        let url = index_url
            .unwrap_or(DEFAULT_INDEX_URL)
            .replace("{distro}", distro);
        info!("Fetching distribution index from {}", url);
        let body = fetcher.fetch_string(&url)?;
        Self::from_yaml(distro, &body)
    }

    /// Build a snapshot from index YAML
    pub fn from_yaml(distro: &str, yaml: &str) -> Result<Self> {
        let file: DistributionFile = serde_yaml::from_str(yaml)
            .map_err(|e| Error::ParseError(format!("Invalid distribution index: {e}")))?;

        let mut repositories = BTreeMap::new();
        let mut packages = BTreeMap::new();

        for (repo_name, entry) in file.repositories {
            let Some(release) = entry.release else {
                continue;
            };
            // A repository without a released version has nothing to generate
            if release.version.is_none() {
                continue;
            }

            if release.packages.is_empty() {
                packages.insert(repo_name.clone(), repo_name.clone());
            } else {
                for pkg in &release.packages {
                    packages.insert(pkg.clone(), repo_name.clone());
                }
            }
            repositories.insert(repo_name, release);
        }

        info!(
            "Loaded distribution '{}' with {} release packages",
            distro,
            packages.len()
        );

        Ok(Self {
            name: distro.to_string(),
            repositories,
            packages,
        })
    }

    /// Distribution name (e.g. "humble")
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The full set of package names released by this distribution
    pub fn package_names(&self) -> BTreeSet<String> {
        self.packages.keys().cloned().collect()
    }

    /// Release repository for a package
    pub fn release_repository(&self, pkg: &str) -> Result<&ReleaseRepository> {
        self.packages
            .get(pkg)
            .and_then(|repo| self.repositories.get(repo))
            .ok_or_else(|| Error::PackageNotFound(pkg.to_string()))
    }

    /// Parsed release version for a package
    pub fn version_of(&self, pkg: &str) -> Result<ReleaseVersion> {
        let repo = self.release_repository(pkg)?;
        let raw = repo
            .version
            .as_deref()
            .ok_or_else(|| Error::PackageNotFound(pkg.to_string()))?;
        ReleaseVersion::parse(raw)
    }

    /// Expanded release tag for a package (e.g. `release/humble/rclcpp/1.2.3-1`)
    pub fn release_tag(&self, pkg: &str) -> Result<String> {
        let repo = self.release_repository(pkg)?;
        let template = repo
            .tags
            .get("release")
            .map(String::as_str)
            .unwrap_or(DEFAULT_RELEASE_TAG);
        let version = repo
            .version
            .as_deref()
            .ok_or_else(|| Error::PackageNotFound(pkg.to_string()))?;

        Ok(template
            .replace("{distro}", &self.name)
            .replace("{package}", pkg)
            .replace("{version}", version))
    }

    /// Source archive URL for a package at its release tag
    ///
    /// Uses the GitHub tarball convention: `<repo>/archive/<tag>.tar.gz`.
    pub fn source_archive_url(&self, pkg: &str) -> Result<String> {
        let repo = self.release_repository(pkg)?;
        let tag = self.release_tag(pkg)?;
        let base = repo.url.trim_end_matches(".git");
        Ok(format!("{base}/archive/{tag}.tar.gz"))
    }

    /// Raw manifest URL for a package at its release tag
    ///
    /// Network fallback for when the cached archive does not contain the
    /// manifest at the expected path.
    pub fn manifest_url(&self, pkg: &str) -> Result<String> {
        let repo = self.release_repository(pkg)?;
        let tag = self.release_tag(pkg)?;
        let base = repo.url.trim_end_matches(".git");

        if let Some(rest) = base.strip_prefix("https://github.com/") {
            return Ok(format!(
                "https://raw.githubusercontent.com/{rest}/{tag}/package.xml"
            ));
        }

        Err(Error::DownloadError(format!(
            "no raw manifest URL scheme for repository {}",
            repo.url
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = r#"
repositories:
  big_bot:
    release:
      packages:
        - big_bot
        - big_bot_msgs
      tags:
        release: release/{distro}/{package}/{version}
      url: https://github.com/ros-gbp/big_bot-release.git
      version: 1.2.3-1
  unreleased:
    release:
      url: https://github.com/ros-gbp/unreleased-release.git
  small_bot:
    release:
      tags:
        release: release/{distro}/{package}/{version}
      url: https://github.com/ros-gbp/small_bot-release.git
      version: 0.4.0-0
"#;

    #[test]
    fn test_package_names() {
        let snap = Snapshot::from_yaml("humble", INDEX).unwrap();
        let names = snap.package_names();
        assert!(names.contains("big_bot"));
        assert!(names.contains("big_bot_msgs"));
        assert!(names.contains("small_bot"));
        assert!(!names.contains("unreleased"));
    }

    #[test]
    fn test_version_of() {
        let snap = Snapshot::from_yaml("humble", INDEX).unwrap();
        assert_eq!(snap.version_of("big_bot").unwrap().to_string(), "1.2.3-r1");
        assert_eq!(snap.version_of("small_bot").unwrap().to_string(), "0.4.0");
    }

    #[test]
    fn test_release_tag_expansion() {
        let snap = Snapshot::from_yaml("humble", INDEX).unwrap();
        assert_eq!(
            snap.release_tag("big_bot_msgs").unwrap(),
            "release/humble/big_bot_msgs/1.2.3-1"
        );
    }

    #[test]
    fn test_source_archive_url() {
        let snap = Snapshot::from_yaml("humble", INDEX).unwrap();
        assert_eq!(
            snap.source_archive_url("big_bot").unwrap(),
            "https://github.com/ros-gbp/big_bot-release/archive/release/humble/big_bot/1.2.3-1.tar.gz"
        );
    }

    #[test]
    fn test_manifest_url() {
        let snap = Snapshot::from_yaml("humble", INDEX).unwrap();
        assert_eq!(
            snap.manifest_url("small_bot").unwrap(),
            "https://raw.githubusercontent.com/ros-gbp/small_bot-release/release/humble/small_bot/0.4.0-0/package.xml"
        );
    }

    #[test]
    fn test_unknown_package() {
        let snap = Snapshot::from_yaml("humble", INDEX).unwrap();
        assert!(matches!(
            snap.release_repository("nope"),
            Err(Error::PackageNotFound(_))
        ));
    }
}
