// src/resolver/mod.rs

//! Dependency resolution from upstream identifiers to target-ecosystem names
//!
//! Resolution has two paths: packages built by the same run resolve by name
//! normalization alone, everything else goes through the static
//! cross-reference table. The outcome is a value, not an exception; callers
//! accumulate unresolved identifiers on the owning recipe and decide at
//! finalize time whether the recipe may be written.

mod crossref;

pub use crossref::CrossrefTable;

use std::collections::BTreeSet;

/// Target package ecosystems we generate recipes for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetEcosystem {
    Gentoo,
    Nix,
}

impl TargetEcosystem {
    /// Ecosystem name, used to pick the cross-reference table
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Gentoo => "gentoo",
            Self::Nix => "nix",
        }
    }

    /// Conventional word separator in package names
    pub const fn separator(&self) -> char {
        match self {
            Self::Gentoo => '-',
            Self::Nix => '-',
        }
    }
}

/// Convert an upstream package name to the target ecosystem's convention
///
/// Underscores become the ecosystem separator: `my_ros_pkg` → `my-ros-pkg`.
pub fn normalize_name(name: &str, ecosystem: TargetEcosystem) -> String {
    name.replace('_', &ecosystem.separator().to_string())
}

/// Outcome of resolving one upstream identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Mapped to one or more target-ecosystem identifiers
    Resolved(BTreeSet<String>),
    /// No mapping known; carries the upstream identifier for reporting
    Unresolved(String),
}

/// Per-run dependency resolver
///
/// Holds the run's known-package set and cross-reference table by reference;
/// both are read-only after snapshot load, so one resolver serves the whole
/// batch while unresolved identifiers accumulate per recipe.
pub struct DepResolver<'a> {
    ecosystem: TargetEcosystem,
    known_packages: &'a BTreeSet<String>,
    table: &'a CrossrefTable,
}

impl<'a> DepResolver<'a> {
    pub fn new(
        ecosystem: TargetEcosystem,
        known_packages: &'a BTreeSet<String>,
        table: &'a CrossrefTable,
    ) -> Self {
        Self {
            ecosystem,
            known_packages,
            table,
        }
    }

    /// Resolve a single upstream identifier
    ///
    /// A cross-reference entry mapping to an empty list means "not packaged,
    /// assumed satisfied" upstream; it still reports as unresolved so the
    /// omission is visible rather than silently dropped.
    pub fn resolve(&self, dep: &str) -> Resolution {
        if self.known_packages.contains(dep) {
            let mut targets = BTreeSet::new();
            targets.insert(normalize_name(dep, self.ecosystem));
            return Resolution::Resolved(targets);
        }

        match self.table.lookup(dep) {
            Some(targets) if !targets.is_empty() => {
                Resolution::Resolved(targets.iter().cloned().collect())
            }
            _ => Resolution::Unresolved(dep.to_string()),
        }
    }

    /// Resolve a whole dependency set, accumulating failures
    ///
    /// Returns the union of all target identifiers; unresolved upstream
    /// identifiers are added to `unresolved` and omitted from the result.
    pub fn resolve_all<I>(&self, deps: I, unresolved: &mut BTreeSet<String>) -> BTreeSet<String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut resolved = BTreeSet::new();
        for dep in deps {
            match self.resolve(&dep) {
                Resolution::Resolved(targets) => resolved.extend(targets),
                Resolution::Unresolved(name) => {
                    unresolved.insert(name);
                }
            }
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> CrossrefTable {
        CrossrefTable::from_yaml(
            "boost: [dev-libs/boost]\n\
             qt5: [dev-qt/qtcore, dev-qt/qtgui]\n\
             libc-dev: []\n",
        )
        .unwrap()
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(
            normalize_name("my_ros_pkg", TargetEcosystem::Nix),
            "my-ros-pkg"
        );
        assert_eq!(
            normalize_name("my_ros_pkg", TargetEcosystem::Gentoo),
            "my-ros-pkg"
        );
    }

    #[test]
    fn test_known_package_fast_path() {
        let known: BTreeSet<String> = ["my_ros_pkg".to_string()].into();
        let table = table();
        let resolver = DepResolver::new(TargetEcosystem::Nix, &known, &table);

        let Resolution::Resolved(targets) = resolver.resolve("my_ros_pkg") else {
            panic!("expected resolution");
        };
        assert_eq!(targets, ["my-ros-pkg".to_string()].into());
    }

    #[test]
    fn test_crossref_multi_target() {
        let known = BTreeSet::new();
        let table = table();
        let resolver = DepResolver::new(TargetEcosystem::Gentoo, &known, &table);

        let Resolution::Resolved(targets) = resolver.resolve("qt5") else {
            panic!("expected resolution");
        };
        assert_eq!(targets.len(), 2);
        assert!(targets.contains("dev-qt/qtcore"));
    }

    #[test]
    fn test_empty_mapping_reports_unresolved() {
        let known = BTreeSet::new();
        let table = table();
        let resolver = DepResolver::new(TargetEcosystem::Gentoo, &known, &table);

        assert_eq!(
            resolver.resolve("libc-dev"),
            Resolution::Unresolved("libc-dev".to_string())
        );
    }

    #[test]
    fn test_resolve_all_accumulates() {
        let known: BTreeSet<String> = ["sibling_pkg".to_string()].into();
        let table = table();
        let resolver = DepResolver::new(TargetEcosystem::Gentoo, &known, &table);

        let deps = vec![
            "sibling_pkg".to_string(),
            "boost".to_string(),
            "no_such_dep".to_string(),
            "libc-dev".to_string(),
        ];
        let mut unresolved = BTreeSet::new();
        let resolved = resolver.resolve_all(deps, &mut unresolved);

        assert_eq!(
            resolved,
            ["sibling-pkg".to_string(), "dev-libs/boost".to_string()].into()
        );
        assert_eq!(
            unresolved,
            ["no_such_dep".to_string(), "libc-dev".to_string()].into()
        );
    }
}
