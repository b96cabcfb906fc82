// src/generator.rs

//! Batch driver: iterates a distribution snapshot and generates recipes
//!
//! Packages are processed sequentially in sorted name order. Every failure
//! is contained at the package boundary: the batch records a classified
//! outcome and moves on, and a recipe with unresolved dependencies or
//! missing metadata is discarded, never partially written.

use crate::archive::{self, ArchiveCache};
use crate::distro::Snapshot;
use crate::error::{Error, Result};
use crate::fetch::HttpFetcher;
use crate::manifest::Manifest;
use crate::recipe::ebuild::DEFAULT_KEYWORDS;
use crate::recipe::{DependencyKind, Ebuild, MetadataXml, NixDerivation, ResolvedDeps};
use crate::resolver::{CrossrefTable, DepResolver, TargetEcosystem, normalize_name};
use crate::version::ReleaseVersion;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Default organization credited in recipe headers
pub const ORGANIZATION: &str = "Open Source Robotics Foundation";

/// Default license of the generated recipe files themselves
pub const ORGANIZATION_LICENSE: &str = "BSD";

/// Recipe formats the batch driver can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFormat {
    Ebuild,
    Nix,
}

impl TargetFormat {
    /// Recipe file extension
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Ebuild => "ebuild",
            Self::Nix => "nix",
        }
    }

    /// The ecosystem whose naming and cross-reference table apply
    pub const fn ecosystem(&self) -> TargetEcosystem {
        match self {
            Self::Ebuild => TargetEcosystem::Gentoo,
            Self::Nix => TargetEcosystem::Nix,
        }
    }
}

/// Configuration for one batch run
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    /// Directory that receives one subdirectory per package
    pub output_dir: PathBuf,
    pub format: TargetFormat,
    /// Keep recipe files that already exist instead of regenerating them
    pub preserve_existing: bool,
    /// Target-platform keywords attached to every ebuild in the run
    pub keywords: Vec<String>,
    pub organization: String,
    pub organization_license: String,
}

impl GenerateConfig {
    pub fn new(output_dir: impl Into<PathBuf>, format: TargetFormat) -> Self {
        Self {
            output_dir: output_dir.into(),
            format,
            preserve_existing: true,
            keywords: DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            organization: ORGANIZATION.to_string(),
            organization_license: ORGANIZATION_LICENSE.to_string(),
        }
    }
}

/// Aggregate outcome of a batch run
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Packages whose recipes were withheld, with the exact identifiers
    /// that could not be mapped
    pub unresolved: BTreeMap<String, Vec<String>>,
    /// Packages that failed for any other reason, with the error message
    pub failures: BTreeMap<String, String>,
    /// Version-change descriptions for changelog use
    pub changes: Vec<String>,
}

impl RunSummary {
    /// Packages actually processed (not skipped)
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Human-readable summary block
    pub fn render(&self, distro: &str) -> String {
        let mut out = format!(
            "------ Generated {} / {} recipes for distro \"{}\" ------\n",
            self.succeeded,
            self.attempted(),
            distro
        );
        out.push_str(&format!(
            "({} up to date, {} failed)\n",
            self.skipped, self.failed
        ));
        if !self.unresolved.is_empty() {
            out.push_str("Unresolved dependencies:\n");
            for (pkg, deps) in &self.unresolved {
                out.push_str(&format!("  {pkg}:\n"));
                for dep in deps {
                    out.push_str(&format!("    {dep}\n"));
                }
            }
        }
        out
    }
}

/// Terminal state for one package
enum PackageOutcome {
    Skipped,
    Succeeded { change: String },
    Failed(FailureKind),
}

enum FailureKind {
    UnresolvedDeps(Vec<String>),
    Assembly(String),
    Write(String),
}

/// An assembled recipe awaiting finalization
enum RecipeOutput {
    Ebuild { ebuild: Ebuild, sidecar: MetadataXml },
    Nix(Box<NixDerivation>),
}

impl RecipeOutput {
    /// The patches flag is the one field set after assembly, once the
    /// driver has inspected the package's output directory
    fn set_has_patches(&mut self, has_patches: bool) {
        match self {
            Self::Ebuild { ebuild, .. } => ebuild.has_patches = has_patches,
            Self::Nix(derivation) => derivation.has_patches = has_patches,
        }
    }

    fn unresolved(&self) -> &BTreeSet<String> {
        match self {
            Self::Ebuild { ebuild, .. } => &ebuild.unresolved,
            Self::Nix(derivation) => &derivation.unresolved,
        }
    }

    fn render(&self, config: &GenerateConfig) -> Result<String> {
        match self {
            Self::Ebuild { ebuild, .. } => {
                ebuild.render(&config.organization, &config.organization_license)
            }
            Self::Nix(derivation) => {
                derivation.render(&config.organization, &config.organization_license)
            }
        }
    }
}

/// Batch recipe generator for one snapshot and target format
pub struct Generator<'a> {
    snapshot: &'a Snapshot,
    fetcher: &'a HttpFetcher,
    crossref: &'a CrossrefTable,
    config: GenerateConfig,
}

impl<'a> Generator<'a> {
    pub fn new(
        snapshot: &'a Snapshot,
        fetcher: &'a HttpFetcher,
        crossref: &'a CrossrefTable,
        config: GenerateConfig,
    ) -> Self {
        Self {
            snapshot,
            fetcher,
            crossref,
            config,
        }
    }

    /// Generate recipes for every package in the snapshot
    pub fn run(&self, cache: &mut ArchiveCache) -> Result<RunSummary> {
        fs::create_dir_all(&self.config.output_dir).map_err(|e| {
            Error::InitError(format!(
                "Failed to create output directory {}: {e}",
                self.config.output_dir.display()
            ))
        })?;

        let known_packages = self.snapshot.package_names();
        let resolver = DepResolver::new(
            self.config.format.ecosystem(),
            &known_packages,
            self.crossref,
        );

        let total = known_packages.len();
        let progress = ProgressBar::new(total as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("#>-"),
        );

        let mut summary = RunSummary::default();
        for (index, pkg) in known_packages.iter().enumerate() {
            let percent = 100.0 * index as f64 / total as f64;
            progress.set_message(pkg.clone());

            match self.process_package(pkg, percent, &resolver, cache) {
                PackageOutcome::Skipped => summary.skipped += 1,
                PackageOutcome::Succeeded { change } => {
                    summary.succeeded += 1;
                    summary.changes.push(change);
                }
                PackageOutcome::Failed(kind) => {
                    summary.failed += 1;
                    match kind {
                        FailureKind::UnresolvedDeps(deps) => {
                            summary.unresolved.insert(pkg.clone(), deps);
                        }
                        FailureKind::Assembly(msg) | FailureKind::Write(msg) => {
                            summary.failures.insert(pkg.clone(), msg);
                        }
                    }
                }
            }
            progress.inc(1);
        }
        progress.finish_with_message(format!(
            "{} succeeded, {} failed, {} skipped",
            summary.succeeded, summary.failed, summary.skipped
        ));

        if !summary.unresolved.is_empty() {
            warn!("Packages with unresolved dependencies:");
            for (pkg, deps) in &summary.unresolved {
                warn!("  {}: {:?}", pkg, deps);
            }
        }

        Ok(summary)
    }

    /// Drive one package through the generation state machine
    fn process_package(
        &self,
        pkg: &str,
        percent: f64,
        resolver: &DepResolver<'_>,
        cache: &mut ArchiveCache,
    ) -> PackageOutcome {
        let pkg_dir = self.config.output_dir.join(pkg);
        let version = match self.snapshot.version_of(pkg) {
            Ok(v) => v,
            Err(e) => {
                error!("[{percent:.1}%] failed to read release version for '{pkg}': {e}");
                return PackageOutcome::Failed(FailureKind::Assembly(e.to_string()));
            }
        };
        let extension = self.config.format.extension();
        let recipe_path = pkg_dir.join(format!("{pkg}-{version}.{extension}"));

        if self.config.preserve_existing && recipe_path.exists() {
            info!("[{percent:.1}%] recipe for package '{pkg}' up to date, skipping");
            return PackageOutcome::Skipped;
        }

        // Each package keeps exactly one recipe file per run
        if let Err(e) = remove_existing_recipes(&pkg_dir, extension) {
            error!("[{percent:.1}%] failed to clear stale recipes for '{pkg}': {e}");
            return PackageOutcome::Failed(FailureKind::Write(e.to_string()));
        }

        let mut recipe = match self.assemble(pkg, &version, resolver, cache) {
            Ok(recipe) => recipe,
            Err(e) => {
                error!("[{percent:.1}%] failed to generate recipe for package '{pkg}': {e}");
                return PackageOutcome::Failed(FailureKind::Assembly(e.to_string()));
            }
        };

        recipe.set_has_patches(pkg_dir.join("files").is_dir());

        let unresolved = recipe.unresolved();
        if !unresolved.is_empty() {
            error!("[{percent:.1}%] failed to resolve required dependencies for package '{pkg}'");
            for dep in unresolved {
                error!("  unresolved: \"{dep}\"");
            }
            // discard the partial recipe, never write it
            return PackageOutcome::Failed(FailureKind::UnresolvedDeps(
                unresolved.iter().cloned().collect(),
            ));
        }

        let text = match recipe.render(&self.config) {
            Ok(text) => text,
            Err(e) => {
                error!("[{percent:.1}%] failed to finalize recipe for package '{pkg}': {e}");
                return PackageOutcome::Failed(FailureKind::Assembly(e.to_string()));
            }
        };

        if let Err(e) = self.write_recipe(&pkg_dir, &recipe_path, &text, &recipe) {
            error!("[{percent:.1}%] failed to write recipe for package '{pkg}': {e}");
            return PackageOutcome::Failed(FailureKind::Write(e.to_string()));
        }

        info!("[{percent:.1}%] successfully generated recipe for package '{pkg}'");
        PackageOutcome::Succeeded {
            change: format!("*{pkg} --> {version}*"),
        }
    }

    /// Assemble a recipe object for one package
    fn assemble(
        &self,
        pkg: &str,
        version: &ReleaseVersion,
        resolver: &DepResolver<'_>,
        cache: &mut ArchiveCache,
    ) -> Result<RecipeOutput> {
        let ecosystem = self.config.format.ecosystem();
        let normalized = normalize_name(pkg, ecosystem);
        let repo_url = self.snapshot.release_repository(pkg)?.url.clone();
        let src_uri = self.snapshot.source_archive_url(pkg)?;

        let archive_path =
            cache.archive_path(&normalized, &version.to_string(), self.snapshot.name());
        let downloaded = cache.ensure(self.fetcher, &src_uri, &archive_path)?;
        let src_sha256 = cache.sha256_of(&archive_path, downloaded)?;

        let manifest = self.load_manifest(pkg, &archive_path);

        let mut unresolved = BTreeSet::new();
        let buildtool =
            resolver.resolve_all(manifest.depends(DependencyKind::Buildtool), &mut unresolved);
        let buildtool_export = resolver.resolve_all(
            manifest.depends(DependencyKind::BuildtoolExport),
            &mut unresolved,
        );
        let build = resolver.resolve_all(manifest.depends(DependencyKind::Build), &mut unresolved);
        let build_export = resolver.resolve_all(
            manifest.depends(DependencyKind::BuildExport),
            &mut unresolved,
        );
        let exec = resolver.resolve_all(manifest.depends(DependencyKind::Exec), &mut unresolved);
        let test = resolver.resolve_all(manifest.depends(DependencyKind::Test), &mut unresolved);
        let deps = ResolvedDeps {
            buildtool,
            buildtool_export,
            build,
            build_export,
            exec,
            test,
            unresolved,
        };

        Ok(match self.config.format {
            TargetFormat::Ebuild => RecipeOutput::Ebuild {
                ebuild: Ebuild::assemble(
                    &normalized,
                    self.snapshot.name(),
                    version,
                    &src_uri,
                    &src_sha256,
                    &manifest,
                    &deps,
                    &self.config.keywords,
                ),
                sidecar: MetadataXml::new(manifest.maintainer.as_ref(), &repo_url),
            },
            TargetFormat::Nix => RecipeOutput::Nix(Box::new(NixDerivation::assemble(
                &normalized,
                self.snapshot.name(),
                version,
                &src_uri,
                &src_sha256,
                &manifest,
                &deps,
            ))),
        })
    }

    /// Load the package manifest, preferring the cached archive
    ///
    /// Degrades to an empty manifest on fetch or parse failure so assembly
    /// can still proceed with partial information; the assembler rejects
    /// the recipe later if required fields are missing.
    fn load_manifest(&self, pkg: &str, archive_path: &Path) -> Manifest {
        match archive::read_manifest(archive_path) {
            Ok(Some(bytes)) => match Manifest::parse(&bytes) {
                Ok(manifest) => return manifest,
                Err(e) => {
                    warn!("malformed package.xml in archive for '{pkg}': {e}");
                    return Manifest::default();
                }
            },
            Ok(None) => warn!("failed to extract package.xml from archive for '{pkg}'"),
            Err(e) => warn!("cannot read cached archive for '{pkg}': {e}"),
        }

        // Fall back to fetching the manifest from the release repository
        let fetched = self
            .snapshot
            .manifest_url(pkg)
            .and_then(|url| self.fetcher.fetch_bytes(&url));
        match fetched.and_then(|bytes| Manifest::parse(&bytes)) {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!("cannot fetch metadata for package '{pkg}': {e}");
                Manifest::default()
            }
        }
    }

    /// Persist the rendered recipe and any sidecar file
    fn write_recipe(
        &self,
        pkg_dir: &Path,
        recipe_path: &Path,
        text: &str,
        recipe: &RecipeOutput,
    ) -> Result<()> {
        fs::create_dir_all(pkg_dir).map_err(|e| {
            Error::WriteError(format!(
                "Failed to create directory {}: {e}",
                pkg_dir.display()
            ))
        })?;
        fs::write(recipe_path, text).map_err(|e| {
            Error::WriteError(format!("Failed to write {}: {e}", recipe_path.display()))
        })?;

        if let RecipeOutput::Ebuild { sidecar, .. } = recipe {
            let sidecar_path = pkg_dir.join("metadata.xml");
            fs::write(&sidecar_path, sidecar.render()).map_err(|e| {
                Error::WriteError(format!("Failed to write {}: {e}", sidecar_path.display()))
            })?;
        }
        Ok(())
    }
}

/// Remove any recipe files left over from a previous run
fn remove_existing_recipes(pkg_dir: &Path, extension: &str) -> Result<()> {
    let entries = match fs::read_dir(pkg_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(Error::IoError(format!(
                "Failed to read {}: {e}",
                pkg_dir.display()
            )));
        }
    };

    for entry in entries {
        let entry =
            entry.map_err(|e| Error::IoError(format!("Failed to read directory entry: {e}")))?;
        let path = entry.path();
        if path.extension().and_then(OsStr::to_str) == Some(extension) {
            info!("removing stale recipe {}", path.display());
            fs::remove_file(&path).map_err(|e| {
                Error::IoError(format!("Failed to remove {}: {e}", path.display()))
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_render() {
        let mut summary = RunSummary {
            succeeded: 3,
            failed: 1,
            skipped: 2,
            ..Default::default()
        };
        summary
            .unresolved
            .insert("big_bot".to_string(), vec!["mystery_dep".to_string()]);

        let text = summary.render("humble");
        assert!(text.contains("Generated 3 / 4 recipes for distro \"humble\""));
        assert!(text.contains("2 up to date"));
        assert!(text.contains("mystery_dep"));
    }

    #[test]
    fn test_remove_existing_recipes() {
        let temp = tempfile::tempdir().unwrap();
        let pkg_dir = temp.path().join("big_bot");
        fs::create_dir_all(&pkg_dir).unwrap();
        fs::write(pkg_dir.join("big_bot-1.0.0.ebuild"), "old").unwrap();
        fs::write(pkg_dir.join("metadata.xml"), "keep").unwrap();

        remove_existing_recipes(&pkg_dir, "ebuild").unwrap();
        assert!(!pkg_dir.join("big_bot-1.0.0.ebuild").exists());
        assert!(pkg_dir.join("metadata.xml").exists());
    }

    #[test]
    fn test_remove_existing_recipes_missing_dir() {
        let temp = tempfile::tempdir().unwrap();
        remove_existing_recipes(&temp.path().join("absent"), "ebuild").unwrap();
    }

    #[test]
    fn test_target_format_vocabulary() {
        assert_eq!(TargetFormat::Ebuild.extension(), "ebuild");
        assert_eq!(TargetFormat::Nix.extension(), "nix");
        assert_eq!(TargetFormat::Ebuild.ecosystem(), TargetEcosystem::Gentoo);
        assert_eq!(TargetFormat::Nix.ecosystem(), TargetEcosystem::Nix);
    }
}
