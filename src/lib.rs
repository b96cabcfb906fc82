// src/lib.rs

//! rosforge
//!
//! Converts a ROS distribution index into installable recipes for target
//! package managers: Gentoo ebuilds and Nix derivations.
//!
//! # Architecture
//!
//! - Snapshot-first: the distribution index is loaded once per run and
//!   read-only thereafter
//! - Per-recipe resolution: unresolved dependency identifiers accumulate on
//!   the owning recipe, and a recipe is never written while any remain
//! - Idempotent archive cache: source tarballs download once and their
//!   content hashes are memoized for the run
//! - Contained failures: every error is classified and counted at the
//!   package boundary; a batch never aborts for one package

pub mod archive;
pub mod distro;
mod error;
pub mod fetch;
pub mod generator;
pub mod hash;
pub mod manifest;
pub mod recipe;
pub mod resolver;
pub mod version;

pub use error::{Error, Result};
pub use generator::{GenerateConfig, Generator, RunSummary, TargetFormat};
pub use manifest::{Maintainer, Manifest};
pub use recipe::{DependencyKind, Ebuild, MetadataXml, NixDerivation, NixLicense, ResolvedDeps};
pub use resolver::{CrossrefTable, DepResolver, Resolution, TargetEcosystem, normalize_name};
pub use version::ReleaseVersion;
