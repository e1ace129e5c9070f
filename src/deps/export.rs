//! Export local dependency recipes into the dependency cache

use super::manifest::{DependencyRequirement, Manifest};
use super::DependencyManager;
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

/// Outcome of an export pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportSummary {
    pub exported: Vec<DependencyRequirement>,
    /// Names skipped because no version or no recipe directory was found
    pub skipped: Vec<String>,
    pub failed: Vec<DependencyRequirement>,
}

impl ExportSummary {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Export the selected requirements from `recipes_dir/<name>`
///
/// An empty `selection` exports every requirement of the manifest. Failures
/// are logged and collected; the pass always runs to the end.
pub async fn export_requirements<M>(
    manager: &M,
    manifest: &Manifest,
    recipes_dir: &Path,
    selection: &[String],
) -> ExportSummary
where
    M: DependencyManager + ?Sized,
{
    let names: Vec<&str> = if selection.is_empty() {
        manifest.requirements.iter().map(|r| r.name.as_str()).collect()
    } else {
        selection.iter().map(String::as_str).collect()
    };

    let mut summary = ExportSummary::default();
    for name in names {
        let Some(version) = manifest.version_of(name) else {
            warn!("No version for dependency {} in the manifest, skipping", name);
            summary.skipped.push(name.to_string());
            continue;
        };
        let recipe_dir = recipes_dir.join(name);
        if !recipe_dir.is_dir() {
            warn!(
                "No recipe for {} at {}, skipping",
                name,
                recipe_dir.display()
            );
            summary.skipped.push(name.to_string());
            continue;
        }

        let requirement = DependencyRequirement::new(name, version);
        match manager.export(&recipe_dir, &requirement).await {
            Ok(()) => {
                info!("Exported {}", requirement);
                summary.exported.push(requirement);
            }
            Err(e) => {
                warn!("Failed to export {}: {}", requirement, e);
                summary.failed.push(requirement);
            }
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDependencyManager;
    use tempfile::TempDir;

    fn manifest() -> Manifest {
        Manifest::parse("requirements:\n  - loki/0.0.8\n  - nauty/2.8.8\n  - cista/0.15\n").unwrap()
    }

    fn recipes(names: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in names {
            std::fs::create_dir_all(dir.path().join(name)).unwrap();
        }
        dir
    }

    #[tokio::test]
    async fn exports_every_requirement_with_a_recipe() {
        let dir = recipes(&["loki", "nauty", "cista"]);
        let manager = FakeDependencyManager::default();

        let summary = export_requirements(&manager, &manifest(), dir.path(), &[]).await;

        assert_eq!(summary.exported.len(), 3);
        assert!(summary.is_clean());
        assert_eq!(
            manager.exports(),
            vec!["loki/0.0.8", "nauty/2.8.8", "cista/0.15"]
        );
    }

    #[tokio::test]
    async fn selection_limits_and_skips_unknown_names() {
        let dir = recipes(&["loki", "nauty"]);
        let manager = FakeDependencyManager::default();
        let selection = vec![
            "nauty".to_string(),
            "unordered_dense".to_string(),
            "cista".to_string(),
        ];

        let summary = export_requirements(&manager, &manifest(), dir.path(), &selection).await;

        assert_eq!(manager.exports(), vec!["nauty/2.8.8"]);
        assert_eq!(summary.skipped, vec!["unordered_dense", "cista"]);
    }

    #[tokio::test]
    async fn failures_do_not_stop_the_pass() {
        let dir = recipes(&["loki", "nauty", "cista"]);
        let manager = FakeDependencyManager::default().failing_export("loki");

        let summary = export_requirements(&manager, &manifest(), dir.path(), &[]).await;

        assert_eq!(summary.failed, vec![DependencyRequirement::new("loki", "0.0.8")]);
        assert_eq!(summary.exported.len(), 2);
        assert!(!summary.is_clean());
    }
}
