//! Dependency manager integration
//!
//! The dependency manager is an external service. The orchestrator only needs
//! it to purge its package cache, manage named remote sources, detect a
//! default profile, and export local recipes; those capabilities are the
//! traits below, with [`Conan`] as the real backend.

pub mod conan;
pub mod export;
pub mod manifest;
pub mod remote;

pub use conan::Conan;
pub use export::{export_requirements, ExportSummary};
pub use manifest::{DependencyRequirement, Manifest};
pub use remote::{RemoteAction, RemoteConfigurator, RemoteKind, RemoteRegistry, RemoteSource};

use crate::error::NativepackResult;
use async_trait::async_trait;
use std::path::Path;

/// Removes every cached dependency artifact and build-cache metadata
#[async_trait]
pub trait CachePurger: Send + Sync {
    async fn purge(&self) -> NativepackResult<()>;
}

/// Full set of dependency manager capabilities the pipeline drives
#[async_trait]
pub trait DependencyManager: RemoteRegistry + CachePurger {
    /// Pin the cache home used by every later invocation of this run
    fn use_home(&self, home: &Path);

    /// Create a default build profile for this host
    async fn detect_profile(&self) -> NativepackResult<()>;

    /// Export a local recipe at the requirement's version
    async fn export(
        &self,
        recipe_dir: &Path,
        requirement: &DependencyRequirement,
    ) -> NativepackResult<()>;
}
