// src/version.rs

//! Release version parsing and formatting
//!
//! Release repositories carry versions in `major.minor.patch-increment`
//! form, where the increment counts rebuilds of the same upstream version.
//! Rendered recipe versions keep the upstream triple and append `-r<n>`
//! only when the increment is non-zero.

use crate::error::{Error, Result};
use semver::Version;
use std::fmt;

/// A parsed release version: upstream triple plus rebuild increment
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReleaseVersion {
    pub upstream: Version,
    pub increment: u64,
}

impl ReleaseVersion {
    /// Parse a release version string
    ///
    /// Examples:
    /// - "1.2.3-0" → upstream=1.2.3, increment=0
    /// - "1.2.3-4" → upstream=1.2.3, increment=4
    /// - "1.2.3" → upstream=1.2.3, increment=0
    pub fn parse(s: &str) -> Result<Self> {
        let (upstream_str, increment_str) = match s.split_once('-') {
            Some((v, inc)) => (v, inc),
            None => (s, "0"),
        };

        let upstream = Version::parse(upstream_str)
            .map_err(|e| Error::ParseError(format!("Invalid release version '{s}': {e}")))?;

        let increment = increment_str.parse::<u64>().map_err(|e| {
            Error::ParseError(format!("Invalid release increment in '{s}': {e}"))
        })?;

        Ok(Self { upstream, increment })
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.upstream)?;
        if self.increment != 0 {
            write!(f, "-r{}", self.increment)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_increment_elided() {
        let v = ReleaseVersion::parse("1.2.3-0").unwrap();
        assert_eq!(v.to_string(), "1.2.3");
    }

    #[test]
    fn test_nonzero_increment_rendered() {
        let v = ReleaseVersion::parse("1.2.3-4").unwrap();
        assert_eq!(v.to_string(), "1.2.3-r4");
    }

    #[test]
    fn test_missing_increment_defaults_to_zero() {
        let v = ReleaseVersion::parse("0.10.1").unwrap();
        assert_eq!(v.increment, 0);
        assert_eq!(v.to_string(), "0.10.1");
    }

    #[test]
    fn test_invalid_triple_rejected() {
        assert!(ReleaseVersion::parse("1.2-0").is_err());
        assert!(ReleaseVersion::parse("not-a-version").is_err());
    }

    #[test]
    fn test_invalid_increment_rejected() {
        assert!(ReleaseVersion::parse("1.2.3-x").is_err());
    }
}
