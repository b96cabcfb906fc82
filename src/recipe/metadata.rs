// src/recipe/metadata.rs

//! metadata.xml sidecar generated next to each ebuild
//!
//! Carries the upstream maintainer and an issue-tracker URL derived from
//! the release repository URL by string substitution.

use crate::manifest::{Maintainer, UNKNOWN_MAINTAINER};

/// Sidecar metadata for one generated ebuild
#[derive(Debug, Clone)]
pub struct MetadataXml {
    pub upstream_name: String,
    pub upstream_email: Option<String>,
    pub bug_url: String,
}

impl MetadataXml {
    /// Build sidecar metadata from the manifest maintainer and repo URL
    pub fn new(maintainer: Option<&Maintainer>, repo_url: &str) -> Self {
        Self {
            upstream_name: maintainer
                .map(|m| m.name.clone())
                .unwrap_or_else(|| UNKNOWN_MAINTAINER.to_string()),
            upstream_email: maintainer.and_then(|m| m.email.clone()),
            bug_url: derive_bug_url(repo_url),
        }
    }

    /// Render the sidecar to XML text
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        out.push_str(
            "<!DOCTYPE pkgmetadata SYSTEM \"http://www.gentoo.org/dtd/metadata.dtd\">\n",
        );
        out.push_str("<pkgmetadata>\n");
        out.push_str("  <upstream>\n");
        out.push_str("    <maintainer>\n");
        out.push_str(&format!(
            "      <name>{}</name>\n",
            xml_escape(&self.upstream_name)
        ));
        if let Some(email) = &self.upstream_email {
            out.push_str(&format!("      <email>{}</email>\n", xml_escape(email)));
        }
        out.push_str("    </maintainer>\n");
        out.push_str(&format!(
            "    <bugs-to>{}</bugs-to>\n",
            xml_escape(&self.bug_url)
        ));
        out.push_str("  </upstream>\n");
        out.push_str("</pkgmetadata>\n");
        out
    }
}

/// Issue-tracker URL from a release repository URL: the `-release` suffix
/// is dropped and `.git` becomes `/issues`
pub fn derive_bug_url(repo_url: &str) -> String {
    repo_url.replace("-release", "").replace(".git", "/issues")
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_bug_url() {
        assert_eq!(
            derive_bug_url("https://github.com/ros-gbp/big_bot-release.git"),
            "https://github.com/ros-gbp/big_bot/issues"
        );
    }

    #[test]
    fn test_render_with_maintainer() {
        let maintainer = Maintainer {
            name: "Maintainer One".to_string(),
            email: Some("maint@example.com".to_string()),
        };
        let sidecar = MetadataXml::new(
            Some(&maintainer),
            "https://github.com/ros-gbp/big_bot-release.git",
        );
        let text = sidecar.render();
        assert!(text.contains("<name>Maintainer One</name>"));
        assert!(text.contains("<email>maint@example.com</email>"));
        assert!(text.contains("<bugs-to>https://github.com/ros-gbp/big_bot/issues</bugs-to>"));
    }

    #[test]
    fn test_render_without_maintainer() {
        let sidecar = MetadataXml::new(None, "https://example.com/repo.git");
        let text = sidecar.render();
        assert!(text.contains("<name>UNKNOWN</name>"));
        assert!(!text.contains("<email>"));
    }

    #[test]
    fn test_xml_escaping() {
        let maintainer = Maintainer {
            name: "A & B <robots>".to_string(),
            email: None,
        };
        let sidecar = MetadataXml::new(Some(&maintainer), "https://example.com/r.git");
        assert!(sidecar.render().contains("<name>A &amp; B &lt;robots&gt;</name>"));
    }
}
