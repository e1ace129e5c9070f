//! Dependency manifest parsing
//!
//! The manifest declares `name/version` pairs, one per line, under a
//! `requirements:` section:
//!
//! ```text
//! requirements:
//!   - "loki/0.0.8"
//!   - "nauty/2.8.8"
//! ```
//!
//! Malformed entries are skipped with a warning; only a missing file or a
//! missing `requirements:` section is an error.

use crate::error::{NativepackError, NativepackResult};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

const SECTION: &str = "requirements:";

/// A declared dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyRequirement {
    pub name: String,
    pub version: String,
}

impl DependencyRequirement {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for DependencyRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)
    }
}

/// Requirements read from one manifest
#[derive(Debug, Clone, Default, Serialize)]
pub struct Manifest {
    /// Requirements in declaration order, unique by name
    pub requirements: Vec<DependencyRequirement>,

    /// Entries that were skipped as malformed
    pub malformed: Vec<String>,
}

impl Manifest {
    /// Read and parse a manifest file
    pub async fn load(path: &Path) -> NativepackResult<Self> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(NativepackError::ManifestNotFound(path.to_path_buf()));
            }
            Err(e) => {
                return Err(NativepackError::io(
                    format!("reading manifest {}", path.display()),
                    e,
                ))
            }
        };
        Self::parse(&content).map_err(|reason| NativepackError::ManifestInvalid {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Parse manifest text
    ///
    /// The section ends at the first blank line or the next top-level key.
    pub fn parse(content: &str) -> Result<Self, String> {
        let mut lines = content.lines();
        if !lines.by_ref().any(|l| l.trim() == SECTION) {
            return Err(format!("no '{}' section found", SECTION));
        }

        let mut manifest = Manifest::default();
        for line in lines {
            if line.trim().is_empty() || is_top_level_key(line) {
                break;
            }
            match parse_entry(line) {
                Some(requirement) => manifest.insert(requirement),
                None => {
                    warn!("Skipping malformed requirement line: {}", line.trim());
                    manifest.malformed.push(line.trim().to_string());
                }
            }
        }

        debug!(
            "Parsed {} requirement(s), skipped {}",
            manifest.requirements.len(),
            manifest.malformed.len()
        );
        Ok(manifest)
    }

    /// Version declared for `name`
    pub fn version_of(&self, name: &str) -> Option<&str> {
        self.requirements
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.version.as_str())
    }

    fn insert(&mut self, requirement: DependencyRequirement) {
        match self
            .requirements
            .iter_mut()
            .find(|r| r.name == requirement.name)
        {
            Some(existing) => {
                warn!(
                    "Duplicate requirement {}: {} replaces {}",
                    requirement.name, requirement.version, existing.version
                );
                existing.version = requirement.version;
            }
            None => self.requirements.push(requirement),
        }
    }
}

fn is_top_level_key(line: &str) -> bool {
    !line.starts_with(char::is_whitespace) && !line.starts_with('-') && line.trim_end().ends_with(':')
}

fn parse_entry(line: &str) -> Option<DependencyRequirement> {
    let entry = line.trim();
    let entry = entry.strip_prefix('-').unwrap_or(entry).trim();
    let entry = entry.trim_matches(|c| c == '"' || c == '\'');

    let (name, version) = entry.split_once('/')?;
    let (name, version) = (name.trim(), version.trim());
    if name.is_empty() || version.is_empty() || version.contains('/') {
        return None;
    }
    Some(DependencyRequirement::new(name, version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"sources:
  "1.0": {}
requirements:
  - "loki/0.0.8"
  - "nauty/2.8.8"
  - badline
  - "cista/0.15"

unrelated:
  - "zlib/1.3"
"#;

    #[test]
    fn parses_requirements_and_skips_malformed() {
        let manifest = Manifest::parse(MANIFEST).unwrap();
        assert_eq!(
            manifest.requirements,
            vec![
                DependencyRequirement::new("loki", "0.0.8"),
                DependencyRequirement::new("nauty", "2.8.8"),
                DependencyRequirement::new("cista", "0.15"),
            ]
        );
        assert_eq!(manifest.malformed, vec!["- badline"]);
    }

    #[test]
    fn bare_malformed_line_does_not_stop_parsing() {
        let manifest =
            Manifest::parse("requirements:\n  loki/0.0.8\n  nauty/2.8.8\n  badline\n").unwrap();
        assert_eq!(manifest.requirements.len(), 2);
        assert_eq!(manifest.malformed.len(), 1);
    }

    #[test]
    fn malformed_first_line_keeps_later_entries() {
        let manifest =
            Manifest::parse("requirements:\n  - badline\n  - \"loki/0.0.8\"\n").unwrap();
        assert_eq!(manifest.version_of("loki"), Some("0.0.8"));
    }

    #[test]
    fn section_ends_at_next_key() {
        let manifest = Manifest::parse("requirements:\n  - a/1\noptions:\n  - b/2\n").unwrap();
        assert_eq!(manifest.requirements, vec![DependencyRequirement::new("a", "1")]);
        assert!(manifest.malformed.is_empty());
    }

    #[test]
    fn missing_section_is_an_error() {
        assert!(Manifest::parse("sources:\n  - a/1\n").is_err());
    }

    #[test]
    fn duplicate_name_keeps_position_and_takes_later_version() {
        let manifest = Manifest::parse("requirements:\n  - a/1\n  - b/2\n  - a/3\n").unwrap();
        assert_eq!(
            manifest.requirements,
            vec![
                DependencyRequirement::new("a", "3"),
                DependencyRequirement::new("b", "2"),
            ]
        );
    }

    #[test]
    fn rejects_entries_with_extra_separators() {
        let manifest =
            Manifest::parse("requirements:\n  - \"fmt/10.2@user/channel\"\n  - /1.0\n").unwrap();
        assert!(manifest.requirements.is_empty());
        assert_eq!(manifest.malformed.len(), 2);
    }

    #[tokio::test]
    async fn load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = Manifest::load(&dir.path().join("conandata.yml"))
            .await
            .unwrap_err();
        assert!(matches!(err, NativepackError::ManifestNotFound(_)));
    }

    #[tokio::test]
    async fn load_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conandata.yml");
        std::fs::write(&path, MANIFEST).unwrap();

        let manifest = Manifest::load(&path).await.unwrap();
        assert_eq!(manifest.requirements.len(), 3);
    }

    #[test]
    fn requirement_display() {
        assert_eq!(
            DependencyRequirement::new("nauty", "2.8.8").to_string(),
            "nauty/2.8.8"
        );
    }
}
