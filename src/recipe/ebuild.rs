// src/recipe/ebuild.rs

//! Ebuild recipe assembly and rendering
//!
//! Translates the upstream dependency taxonomy into Gentoo's vocabulary:
//! runtime-exported dependencies (exec, build-export, buildtool-export)
//! become RDEPEND, private build and buildtool dependencies become DEPEND,
//! and test dependencies render behind a `test` USE conditional after
//! de-duplication against the build set.

use crate::error::{Error, Result};
use crate::manifest::Manifest;
use crate::recipe::{ResolvedDeps, sanitize_description};
use crate::version::ReleaseVersion;
use std::collections::BTreeSet;

/// Target-platform keywords attached uniformly to every recipe in a run
pub const DEFAULT_KEYWORDS: [&str; 4] = ["x86", "amd64", "arm", "~arm64"];

/// A structured ebuild, immutable once assembled except for the patches
/// flag, which the batch driver sets after inspecting the output directory
#[derive(Debug, Clone)]
pub struct Ebuild {
    pub name: String,
    pub version: String,
    pub distro: String,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub licenses: Vec<String>,
    pub src_uri: String,
    pub src_sha256: String,
    pub rdepend: BTreeSet<String>,
    pub depend: BTreeSet<String>,
    pub test_depend: BTreeSet<String>,
    pub keywords: Vec<String>,
    pub has_patches: bool,
    pub unresolved: BTreeSet<String>,
}

impl Ebuild {
    /// Assemble an ebuild from resolved dependencies and manifest metadata
    #[allow(clippy::too_many_arguments)]
    pub fn assemble(
        name: &str,
        distro: &str,
        version: &ReleaseVersion,
        src_uri: &str,
        src_sha256: &str,
        manifest: &Manifest,
        deps: &ResolvedDeps,
        keywords: &[String],
    ) -> Self {
        let rdepend = deps.runtime_exported();
        let mut depend: BTreeSet<String> = deps.build.union(&deps.buildtool).cloned().collect();
        let test_depend: BTreeSet<String> = deps.test.difference(&depend).cloned().collect();
        // RDEPEND is spliced into DEPEND at render time; drop the overlap
        depend = depend.difference(&rdepend).cloned().collect();

        Self {
            name: name.to_string(),
            version: version.to_string(),
            distro: distro.to_string(),
            description: manifest.description.as_deref().map(sanitize_description),
            homepage: manifest.homepage.clone(),
            licenses: manifest.licenses.clone(),
            src_uri: src_uri.to_string(),
            src_sha256: src_sha256.to_string(),
            rdepend,
            depend,
            test_depend,
            keywords: keywords.to_vec(),
            has_patches: false,
            unresolved: deps.unresolved.clone(),
        }
    }

    /// Render the ebuild to text
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

        let mut out = String::new();
        out.push_str(&format!("# Copyright {organization}\n"));
        out.push_str(&format!(
            "# Distributed under the terms of the {organization_license} license\n\n"
        ));
        out.push_str("EAPI=8\n\n");
        out.push_str(&format!("ROS_DISTRO=\"{}\"\n\n", self.distro));
        out.push_str(&format!("DESCRIPTION=\"{description}\"\n"));
        if let Some(homepage) = &self.homepage {
            out.push_str(&format!("HOMEPAGE=\"{homepage}\"\n"));
        }
        out.push_str(&format!(
            "SRC_URI=\"{} -> {}-{}-{}.tar.gz\"\n",
            self.src_uri, self.name, self.version, self.distro
        ));
        out.push_str(&format!("SRC_SHA256=\"{}\"\n\n", self.src_sha256));
        out.push_str(&format!("LICENSE=\"{}\"\n", self.licenses.join(" ")));
        out.push_str("SLOT=\"0\"\n");
        out.push_str(&format!("KEYWORDS=\"{}\"\n", self.keywords.join(" ")));
        if !self.test_depend.is_empty() {
            out.push_str("IUSE=\"test\"\n");
        }
        out.push('\n');

        out.push_str("RDEPEND=\"\n");
        for dep in &self.rdepend {
            out.push_str(&format!("\t{dep}\n"));
        }
        out.push_str("\"\n");

        out.push_str("DEPEND=\"${RDEPEND}\n");
        for dep in &self.depend {
            out.push_str(&format!("\t{dep}\n"));
        }
        if !self.test_depend.is_empty() {
            out.push_str("\ttest? (\n");
            for dep in &self.test_depend {
                out.push_str(&format!("\t\t{dep}\n"));
            }
            out.push_str("\t)\n");
        }
        out.push_str("\"\n");

        if self.has_patches {
            out.push('\n');
            out.push_str("src_prepare() {\n");
            out.push_str("\tdefault\n");
            out.push_str("\teapply \"${FILESDIR}\"/*.patch\n");
            out.push_str("}\n");
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Manifest;

    fn sample_manifest() -> Manifest {
        Manifest::parse(
            br#"<package>
                  <description>Drives the big bot</description>
                  <license>BSD</license>
                  <url>https://example.com</url>
                </package>"#,
        )
        .unwrap()
    }

    fn sample_deps() -> ResolvedDeps {
        ResolvedDeps {
            buildtool: ["dev-build/cmake".to_string()].into(),
            build: ["dev-libs/boost".to_string()].into(),
            exec: ["small-bot".to_string()].into(),
            test: ["dev-cpp/gtest".to_string(), "dev-libs/boost".to_string()].into(),
            ..Default::default()
        }
    }

    fn assemble_sample(deps: &ResolvedDeps) -> Ebuild {
        let keywords: Vec<String> = DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect();
        Ebuild::assemble(
            "big-bot",
            "humble",
            &ReleaseVersion::parse("1.2.3-1").unwrap(),
            "https://example.com/big_bot.tar.gz",
            "deadbeef",
            &sample_manifest(),
            deps,
            &keywords,
        )
    }

    #[test]
    fn test_bucket_translation() {
        let ebuild = assemble_sample(&sample_deps());
        assert!(ebuild.rdepend.contains("small-bot"));
        assert!(ebuild.depend.contains("dev-libs/boost"));
        assert!(ebuild.depend.contains("dev-build/cmake"));
        // already required to build, so not re-listed as test-only
        assert_eq!(ebuild.test_depend, ["dev-cpp/gtest".to_string()].into());
    }

    #[test]
    fn test_render_contains_declarations() {
        let ebuild = assemble_sample(&sample_deps());
        let text = ebuild.render("Open Source Robotics Foundation", "BSD").unwrap();
        assert!(text.contains("DESCRIPTION=\"Drives the big bot\""));
        assert!(text.contains("HOMEPAGE=\"https://example.com\""));
        assert!(text.contains("KEYWORDS=\"x86 amd64 arm ~arm64\""));
        assert!(text.contains("SRC_SHA256=\"deadbeef\""));
        assert!(text.contains("\tdev-libs/boost\n"));
        assert!(text.contains("test? (\n\t\tdev-cpp/gtest"));
    }

    #[test]
    fn test_render_fails_on_unresolved() {
        let deps = ResolvedDeps {
            unresolved: ["mystery_dep".to_string()].into(),
            ..sample_deps()
        };
        let ebuild = assemble_sample(&deps);
        assert!(matches!(
            ebuild.render("org", "BSD"),
            Err(Error::UnresolvedDependencies { .. })
        ));
    }

    #[test]
    fn test_render_fails_on_missing_description() {
        let mut ebuild = assemble_sample(&sample_deps());
        ebuild.description = None;
        assert!(matches!(
            ebuild.render("org", "BSD"),
            Err(Error::MissingMetadata {
                field: "description",
                ..
            })
        ));
    }

    #[test]
    fn test_patches_hook_rendered() {
        let mut ebuild = assemble_sample(&sample_deps());
        ebuild.has_patches = true;
        let text = ebuild.render("org", "BSD").unwrap();
        assert!(text.contains("src_prepare()"));
        assert!(text.contains("eapply \"${FILESDIR}\"/*.patch"));
    }
}
