// src/recipe/nix.rs

//! Nix derivation assembly and rendering
//!
//! Nix separates propagated build inputs (visible to downstream consumers)
//! from private build inputs, so the upstream taxonomy maps to four
//! buckets: exec and both export categories propagate, build stays
//! private, test becomes checkInputs, buildtool becomes native.
//! Upstream license strings are classified into a closed enum of nixpkgs
//! license attributes with an unfree fallback for unknown strings.

use crate::error::{Error, Result};
use crate::manifest::Manifest;
use crate::recipe::{ResolvedDeps, sanitize_description};
use crate::version::ReleaseVersion;
use std::collections::BTreeSet;
use std::fmt;
use tracing::warn;

/// nixpkgs license attributes we know how to classify
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NixLicense {
    Asl20,
    Boost,
    Bsd2,
    Bsd3,
    BsdOriginal,
    Eclipse10,
    Gpl2,
    Gpl3,
    Lgpl2,
    Lgpl21,
    Lgpl3,
    Mit,
    Mpl20,
    PublicDomain,
    Zlib,
    /// Marker for license strings with no known mapping
    Unfree,
}

impl NixLicense {
    /// Classify a free-form upstream license string
    pub fn classify(license: &str) -> Self {
        match license.trim() {
            "Apache-2.0" | "Apache 2.0" | "Apache License 2.0" | "ASL 2.0" => Self::Asl20,
            "BSL-1.0" | "Boost Software License" => Self::Boost,
            "BSD-2-Clause" | "BSD-2" => Self::Bsd2,
            "BSD-3-Clause" | "BSD-3" => Self::Bsd3,
            "BSD" => Self::BsdOriginal,
            "EPL-1.0" | "Eclipse Public License 1.0" => Self::Eclipse10,
            "GPL-2.0" | "GPL-2" | "GPLv2" => Self::Gpl2,
            "GPL-3.0" | "GPL-3" | "GPLv3" => Self::Gpl3,
            "LGPL-2.0" | "LGPL-2" | "LGPLv2" => Self::Lgpl2,
            "LGPL-2.1" | "LGPLv2.1" => Self::Lgpl21,
            "LGPL-3.0" | "LGPL-3" | "LGPLv3" => Self::Lgpl3,
            "MIT" => Self::Mit,
            "MPL-2.0" | "Mozilla Public License Version 2.0" => Self::Mpl20,
            "Public Domain" | "CC0" => Self::PublicDomain,
            "Zlib" | "zlib" => Self::Zlib,
            other => {
                warn!("unknown license string '{}', marking as unfree", other);
                Self::Unfree
            }
        }
    }

    /// The `lib.licenses` attribute name
    pub const fn attr(&self) -> &'static str {
        match self {
            Self::Asl20 => "asl20",
            Self::Boost => "boost",
            Self::Bsd2 => "bsd2",
            Self::Bsd3 => "bsd3",
            Self::BsdOriginal => "bsdOriginal",
            Self::Eclipse10 => "epl10",
            Self::Gpl2 => "gpl2",
            Self::Gpl3 => "gpl3",
            Self::Lgpl2 => "lgpl2",
            Self::Lgpl21 => "lgpl21",
            Self::Lgpl3 => "lgpl3",
            Self::Mit => "mit",
            Self::Mpl20 => "mpl20",
            Self::PublicDomain => "publicDomain",
            Self::Zlib => "zlib",
            Self::Unfree => "unfree",
        }
    }
}

impl fmt::Display for NixLicense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.attr())
    }
}

/// A structured Nix derivation, immutable once assembled except for the
/// patches flag set by the batch driver
#[derive(Debug, Clone)]
pub struct NixDerivation {
    pub name: String,
    pub version: String,
    pub distro: String,
    pub src_url: String,
    pub src_sha256: String,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub licenses: Vec<NixLicense>,
    pub build_type: String,
    pub build_inputs: BTreeSet<String>,
    pub propagated_build_inputs: BTreeSet<String>,
    pub check_inputs: BTreeSet<String>,
    pub native_build_inputs: BTreeSet<String>,
    pub has_patches: bool,
    pub unresolved: BTreeSet<String>,
}

impl NixDerivation {
    /// Assemble a derivation from resolved dependencies and metadata
    pub fn assemble(
        name: &str,
        distro: &str,
        version: &ReleaseVersion,
        src_url: &str,
        src_sha256: &str,
        manifest: &Manifest,
        deps: &ResolvedDeps,
    ) -> Self {
        let propagated_build_inputs = deps.runtime_exported();
        let build_inputs: BTreeSet<String> = deps
            .build
            .difference(&propagated_build_inputs)
            .cloned()
            .collect();
        let check_inputs: BTreeSet<String> =
            deps.test.difference(&build_inputs).cloned().collect();
        let native_build_inputs = deps.buildtool.clone();

        Self {
            name: name.to_string(),
            version: version.to_string(),
            distro: distro.to_string(),
            src_url: src_url.to_string(),
            src_sha256: src_sha256.to_string(),
            description: manifest.description.as_deref().map(sanitize_description),
            homepage: manifest.homepage.clone(),
            licenses: manifest
                .licenses
                .iter()
                .map(|l| NixLicense::classify(l))
                .collect(),
            build_type: manifest.build_type.clone(),
            build_inputs,
            propagated_build_inputs,
            check_inputs,
            native_build_inputs,
            has_patches: false,
            unresolved: deps.unresolved.clone(),
        }
    }

    /// All dependency identifiers, for the derivation's argument list
    fn all_inputs(&self) -> BTreeSet<String> {
        let mut all = self.build_inputs.clone();
        all.extend(self.propagated_build_inputs.iter().cloned());
        all.extend(self.check_inputs.iter().cloned());
        all.extend(self.native_build_inputs.iter().cloned());
        all
    }

    /// Render the derivation to text
    ///
    /// Fails closed while any dependency remains unresolved, and when a
    /// required metadata field is missing.
    pub fn render(&self, organization: &str, organization_license: &str) -> Result<String> {
        if !self.unresolved.is_empty() {
            return Err(Error::UnresolvedDependencies {
                package: self.name.clone(),
                deps: self.unresolved.iter().cloned().collect(),
            });
        }
        let description = self.description.as_deref().ok_or_else(|| {
            Error::MissingMetadata {
                package: self.name.clone(),
                field: "description",
            }
        })?;
        if self.licenses.is_empty() {
            return Err(Error::MissingMetadata {
                package: self.name.clone(),
                field: "license",
            });
        }

        let mut args: Vec<String> =
            vec!["lib".to_string(), "buildRosPackage".to_string(), "fetchurl".to_string()];
        args.extend(self.all_inputs());

        let mut out = String::new();
        out.push_str(&format!("# Copyright {organization}\n"));
        out.push_str(&format!(
            "# Distributed under the terms of the {organization_license} license\n\n"
        ));
        out.push_str(&format!("{{ {} }}:\n", args.join(", ")));
        out.push_str("buildRosPackage {\n");
        out.push_str(&format!(
            "  pname = \"ros-{}-{}\";\n",
            self.distro, self.name
        ));
        out.push_str(&format!("  version = \"{}\";\n\n", self.version));
        out.push_str("  src = fetchurl {\n");
        out.push_str(&format!("    url = \"{}\";\n", self.src_url));
        out.push_str(&format!("    sha256 = \"{}\";\n", self.src_sha256));
        out.push_str("  };\n\n");
        out.push_str(&format!("  buildType = \"{}\";\n", self.build_type));
        push_input_list(&mut out, "buildInputs", &self.build_inputs);
        push_input_list(&mut out, "checkInputs", &self.check_inputs);
        push_input_list(
            &mut out,
            "propagatedBuildInputs",
            &self.propagated_build_inputs,
        );
        push_input_list(&mut out, "nativeBuildInputs", &self.native_build_inputs);
        out.push('\n');
        out.push_str("  meta = {\n");
        out.push_str(&format!("    description = \"{description}\";\n"));
        if let Some(homepage) = &self.homepage {
            out.push_str(&format!("    homepage = \"{homepage}\";\n"));
        }
        let license_attrs: Vec<&str> = self.licenses.iter().map(|l| l.attr()).collect();
        out.push_str(&format!(
            "    license = with lib.licenses; [ {} ];\n",
            license_attrs.join(" ")
        ));
        out.push_str("  };\n");
        out.push_str("}\n");

        Ok(out)
    }
}

fn push_input_list(out: &mut String, label: &str, inputs: &BTreeSet<String>) {
    if inputs.is_empty() {
        return;
    }
    let items: Vec<&str> = inputs.iter().map(String::as_str).collect();
    out.push_str(&format!("  {label} = [ {} ];\n", items.join(" ")));
}
