//! Remote source reconciliation
//!
//! [`RemoteConfigurator`] drives a [`RemoteRegistry`] towards a desired state
//! with idempotent upserts, so an interrupted run heals itself when re-run.

use crate::error::{NativepackError, NativepackResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Type of a remote source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RemoteKind {
    /// A directory laid out as a recipe index (e.g. a clone of the public index)
    IndexedRecipes,
    /// A package server reached over the network
    RemoteServer,
}

impl RemoteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IndexedRecipes => "indexed-recipes",
            Self::RemoteServer => "remote-server",
        }
    }
}

impl fmt::Display for RemoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RemoteKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "indexed-recipes" => Ok(Self::IndexedRecipes),
            "remote-server" => Ok(Self::RemoteServer),
            other => Err(format!(
                "unknown remote kind '{}' (expected indexed-recipes or remote-server)",
                other
            )),
        }
    }
}

/// A named source the dependency manager can pull packages from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteSource {
    pub name: String,
    /// Filesystem path or URL
    pub location: String,
    pub kind: RemoteKind,
}

impl RemoteSource {
    pub fn new(name: impl Into<String>, location: impl Into<String>, kind: RemoteKind) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            kind,
        }
    }
}

/// Registry of remote sources keyed by name
#[async_trait]
pub trait RemoteRegistry: Send + Sync {
    /// Look up a remote by name
    async fn get(&self, name: &str) -> NativepackResult<Option<RemoteSource>>;

    /// Register a remote
    async fn add(&self, remote: &RemoteSource) -> NativepackResult<()>;

    /// Remove a remote by name
    async fn remove(&self, name: &str) -> NativepackResult<()>;
}

/// What [`RemoteConfigurator::ensure`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteAction {
    Created,
    Unchanged,
    Recreated,
}

/// Reconciles remote sources against a registry
pub struct RemoteConfigurator<'a, R: RemoteRegistry + ?Sized> {
    registry: &'a R,
    reconcile_location: bool,
}

impl<'a, R: RemoteRegistry + ?Sized> RemoteConfigurator<'a, R> {
    pub fn new(registry: &'a R) -> Self {
        Self {
            registry,
            reconcile_location: false,
        }
    }

    /// Also recreate a remote of the right kind whose location drifted
    pub fn reconcile_location(mut self, enabled: bool) -> Self {
        self.reconcile_location = enabled;
        self
    }

    /// Make sure exactly one remote `name` exists with the desired kind
    pub async fn ensure(
        &self,
        name: &str,
        location: &str,
        kind: RemoteKind,
    ) -> NativepackResult<RemoteAction> {
        let desired = RemoteSource::new(name, location, kind);

        let Some(existing) = self.registry.get(name).await? else {
            info!("Adding remote {} ({}) at {}", name, kind, location);
            self.registry.add(&desired).await?;
            return Ok(RemoteAction::Created);
        };

        if existing.kind != kind {
            warn!(
                "Remote {} is {} but should be {}, recreating it",
                name, existing.kind, kind
            );
        } else if self.reconcile_location && existing.location != location {
            warn!(
                "Remote {} points at {} instead of {}, recreating it",
                name, existing.location, location
            );
        } else {
            if existing.location != location {
                debug!(
                    "Remote {} keeps its location {} (desired {})",
                    name, existing.location, location
                );
            }
            info!("Remote {} already exists as {}", name, kind);
            return Ok(RemoteAction::Unchanged);
        }

        self.registry.remove(name).await?;
        self.registry.add(&desired).await?;
        Ok(RemoteAction::Recreated)
    }

    /// Remove `name` if it is registered
    ///
    /// Absence, or a registry that cannot be queried, is logged and ignored.
    pub async fn remove_if_present(&self, name: &str) -> bool {
        match self.registry.get(name).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                info!("Remote {} is not registered, nothing to remove", name);
                return false;
            }
            Err(e) => {
                warn!("Could not look up remote {}: {}", name, e);
                return false;
            }
        }
        match self.registry.remove(name).await {
            Ok(()) => {
                info!("Removed remote {}", name);
                true
            }
            Err(e) => {
                warn!("Could not remove remote {}: {}", name, e);
                false
            }
        }
    }
}

/// Parse a kind from configuration, reporting the offending value
pub fn parse_kind(value: &str) -> NativepackResult<RemoteKind> {
    value
        .parse()
        .map_err(|reason| NativepackError::ConfigInvalid {
            path: "remote.fallback_kind".into(),
            reason,
        })
}
