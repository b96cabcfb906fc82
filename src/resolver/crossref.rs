// src/resolver/crossref.rs

//! Static cross-reference tables mapping upstream identifiers to target names
//!
//! One table per target ecosystem, bundled as YAML. An upstream identifier
//! maps to zero or more target identifiers; an empty list records that the
//! dependency is known upstream but not packaged for the target.

use crate::error::{Error, Result};
use crate::resolver::TargetEcosystem;
use std::collections::BTreeMap;

const GENTOO_TABLE: &str = include_str!("gentoo.yaml");
const NIX_TABLE: &str = include_str!("nix.yaml");

/// Cross-reference table for one target ecosystem
#[derive(Debug, Clone)]
pub struct CrossrefTable {
    entries: BTreeMap<String, Vec<String>>,
}

impl CrossrefTable {
    /// Load the table bundled with the binary for the given ecosystem
    pub fn builtin(ecosystem: TargetEcosystem) -> Result<Self> {
        let yaml = match ecosystem {
            TargetEcosystem::Gentoo => GENTOO_TABLE,
            TargetEcosystem::Nix => NIX_TABLE,
        };
        Self::from_yaml(yaml).map_err(|e| {
            Error::InitError(format!(
                "bundled {} cross-reference table is invalid: {e}",
                ecosystem.name()
            ))
        })
    }

    /// Parse a table from YAML (`upstream: [target, ...]` per line)
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let entries: BTreeMap<String, Vec<String>> = serde_yaml::from_str(yaml)
            .map_err(|e| Error::ParseError(format!("Invalid cross-reference table: {e}")))?;
        Ok(Self { entries })
    }

    /// Look up the target identifiers for an upstream identifier
    ///
    /// `None` means the identifier is entirely unknown; `Some(&[])` means it
    /// is known but has no target package.
    pub fn lookup(&self, upstream: &str) -> Option<&[String]> {
        self.entries.get(upstream).map(Vec::as_slice)
    }

    /// Number of entries in the table
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tables_parse() {
        let gentoo = CrossrefTable::builtin(TargetEcosystem::Gentoo).unwrap();
        let nix = CrossrefTable::builtin(TargetEcosystem::Nix).unwrap();
        assert!(!gentoo.is_empty());
        assert!(!nix.is_empty());
    }

    #[test]
    fn test_builtin_lookup() {
        let gentoo = CrossrefTable::builtin(TargetEcosystem::Gentoo).unwrap();
        assert_eq!(
            gentoo.lookup("boost"),
            Some(["dev-libs/boost".to_string()].as_slice())
        );
        assert_eq!(gentoo.lookup("definitely-not-a-dep"), None);
    }

    #[test]
    fn test_unknown_vs_empty() {
        let table = CrossrefTable::from_yaml("known-empty: []\n").unwrap();
        assert_eq!(table.lookup("known-empty").map(<[String]>::len), Some(0));
        assert_eq!(table.lookup("unknown"), None);
    }
}
