//! Conan-backed dependency manager
//!
//! Every operation shells out to the `conan` CLI through the injected
//! [`CommandRunner`]. The cache home pinned during environment setup is
//! passed to each invocation as `CONAN_HOME`.

use super::manifest::DependencyRequirement;
use super::remote::{RemoteKind, RemoteRegistry, RemoteSource};
use super::{CachePurger, DependencyManager};
use crate::error::{NativepackError, NativepackResult};
use crate::exec::{CommandRunner, Invocation};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// Environment variable Conan reads its home directory from
pub const HOME_VAR: &str = "CONAN_HOME";

/// Conan's name for indexed-recipes remotes
const LOCAL_RECIPES_INDEX: &str = "local-recipes-index";

/// Entry of `conan remote list --format=json`
#[derive(Debug, Deserialize)]
struct ListedRemote {
    name: String,
    url: String,
    #[serde(default, alias = "type")]
    remote_type: Option<String>,
}

impl ListedRemote {
    /// Older Conan releases omit the type; a non-HTTP URL can only be an index
    fn kind(&self) -> RemoteKind {
        match self.remote_type.as_deref() {
            Some(LOCAL_RECIPES_INDEX) => RemoteKind::IndexedRecipes,
            Some(_) => RemoteKind::RemoteServer,
            None if self.url.starts_with("http://") || self.url.starts_with("https://") => {
                RemoteKind::RemoteServer
            }
            None => RemoteKind::IndexedRecipes,
        }
    }
}

/// The `conan` command line client
pub struct Conan {
    program: String,
    runner: Arc<dyn CommandRunner>,
    home: OnceLock<PathBuf>,
}

impl Conan {
    pub fn new(program: impl Into<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            program: program.into(),
            runner,
            home: OnceLock::new(),
        }
    }

    /// Cache home pinned for this run, if any
    pub fn home(&self) -> Option<&Path> {
        self.home.get().map(PathBuf::as_path)
    }

    fn invocation(&self) -> Invocation {
        let inv = Invocation::new(&self.program);
        match self.home.get() {
            Some(home) => inv.env(HOME_VAR, home.display().to_string()),
            None => inv,
        }
    }

    async fn run_checked(&self, inv: Invocation) -> NativepackResult<String> {
        let output = self.runner.run(&inv).await?.check(&inv)?;
        Ok(output.stdout)
    }

    async fn list_remotes(&self) -> NativepackResult<Vec<ListedRemote>> {
        let stdout = self
            .run_checked(self.invocation().args(["remote", "list", "--format=json"]))
            .await?;
        serde_json::from_str(&stdout).map_err(|e| NativepackError::RemoteQuery(e.to_string()))
    }
}

#[async_trait]
impl RemoteRegistry for Conan {
    async fn get(&self, name: &str) -> NativepackResult<Option<RemoteSource>> {
        let remotes = self.list_remotes().await?;
        Ok(remotes
            .into_iter()
            .find(|r| r.name == name)
            .map(|r| RemoteSource::new(&r.name, &r.url, r.kind())))
    }

    async fn add(&self, remote: &RemoteSource) -> NativepackResult<()> {
        let mut inv = self
            .invocation()
            .args(["remote", "add", remote.name.as_str(), remote.location.as_str()]);
        if remote.kind == RemoteKind::IndexedRecipes {
            inv = inv.arg(format!("--type={}", LOCAL_RECIPES_INDEX));
        }
        self.run_checked(inv.arg("--force")).await?;
        Ok(())
    }

    async fn remove(&self, name: &str) -> NativepackResult<()> {
        self.run_checked(self.invocation().args(["remote", "remove", name]))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CachePurger for Conan {
    async fn purge(&self) -> NativepackResult<()> {
        info!("Removing all cached packages");
        self.run_checked(self.invocation().args(["remove", "*", "--confirm"]))
            .await?;
        self.run_checked(self.invocation().args(["cache", "clean"]))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl DependencyManager for Conan {
    fn use_home(&self, home: &Path) {
        match self.home.set(home.to_path_buf()) {
            Ok(()) => debug!("{} pinned to {}", HOME_VAR, home.display()),
            Err(_) => warn!(
                "{} already pinned to {}, ignoring {}",
                HOME_VAR,
                self.home().map(|h| h.display().to_string()).unwrap_or_default(),
                home.display()
            ),
        }
    }

    async fn detect_profile(&self) -> NativepackResult<()> {
        self.run_checked(self.invocation().args(["profile", "detect", "--force"]))
            .await?;
        Ok(())
    }

    async fn export(
        &self,
        recipe_dir: &Path,
        requirement: &DependencyRequirement,
    ) -> NativepackResult<()> {
        let inv = self
            .invocation()
            .arg("export")
            .path_arg(recipe_dir)
            .arg(format!("--version={}", requirement.version))
            .streamed();
        self.run_checked(inv).await?;
        Ok(())
    }
}
