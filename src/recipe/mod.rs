// src/recipe/mod.rs

//! Recipe assembly for the supported target formats
//!
//! A recipe combines resolved dependencies, the archive content hash, and
//! extracted manifest metadata into a structured object that renders to
//! text. The shared pieces live here: the upstream dependency taxonomy,
//! description sanitation, and the resolved-dependency carrier the batch
//! driver hands to each assembler.

pub mod ebuild;
pub mod metadata;
pub mod nix;

pub use ebuild::Ebuild;
pub use metadata::MetadataXml;
pub use nix::{NixDerivation, NixLicense};

use std::collections::BTreeSet;

/// Upstream dependency categories from the package manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DependencyKind {
    Buildtool,
    BuildtoolExport,
    Build,
    BuildExport,
    Exec,
    Test,
}

impl DependencyKind {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Buildtool => "buildtool",
            Self::BuildtoolExport => "buildtool_export",
            Self::Build => "build",
            Self::BuildExport => "build_export",
            Self::Exec => "exec",
            Self::Test => "test",
        }
    }
}

/// Hard cap on rendered description length
pub const MAX_DESCRIPTION_LEN: usize = 80;

/// Sanitize a description for inclusion in a recipe
///
/// Strips backticks and control characters, then truncates to
/// [`MAX_DESCRIPTION_LEN`] characters.
pub fn sanitize_description(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '`' && !c.is_control())
        .take(MAX_DESCRIPTION_LEN)
        .collect()
}

/// Resolved dependency sets, one per upstream category, plus the
/// identifiers that could not be mapped for this recipe
#[derive(Debug, Clone, Default)]
pub struct ResolvedDeps {
    pub buildtool: BTreeSet<String>,
    pub buildtool_export: BTreeSet<String>,
    pub build: BTreeSet<String>,
    pub build_export: BTreeSet<String>,
    pub exec: BTreeSet<String>,
    pub test: BTreeSet<String>,
    pub unresolved: BTreeSet<String>,
}

impl ResolvedDeps {
    /// Dependencies visible to downstream consumers of the package:
    /// exec plus both export categories
    pub fn runtime_exported(&self) -> BTreeSet<String> {
        let mut out = self.exec.clone();
        out.extend(self.build_export.iter().cloned());
        out.extend(self.buildtool_export.iter().cloned());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_truncated_to_cap() {
        let input = "x".repeat(120);
        let out = sanitize_description(&input);
        assert_eq!(out.len(), MAX_DESCRIPTION_LEN);
        assert_eq!(out, "x".repeat(80));
    }

    #[test]
    fn test_backticks_stripped_before_truncation() {
        let input = format!("a`b{}", "c".repeat(120));
        let out = sanitize_description(&input);
        assert!(!out.contains('`'));
        assert_eq!(out.chars().count(), MAX_DESCRIPTION_LEN);
        assert!(out.starts_with("ab"));
    }

    #[test]
    fn test_control_characters_stripped() {
        assert_eq!(sanitize_description("a\nb\tc"), "abc");
    }

    #[test]
    fn test_runtime_exported_union() {
        let deps = ResolvedDeps {
            exec: ["a".to_string()].into(),
            build_export: ["b".to_string()].into(),
            buildtool_export: ["c".to_string()].into(),
            ..Default::default()
        };
        assert_eq!(
            deps.runtime_exported(),
            ["a".to_string(), "b".to_string(), "c".to_string()].into()
        );
    }
}
