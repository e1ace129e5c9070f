//! In-memory collaborators for unit tests

use crate::deps::{
    CachePurger, DependencyManager, DependencyRequirement, RemoteRegistry, RemoteSource,
};
use crate::error::{NativepackError, NativepackResult};
use crate::exec::{CommandRunner, Invocation, ToolOutput};
use crate::host::{RuntimeIdentity, RuntimeProbe};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

type Handler = Box<dyn Fn(&Invocation) -> ToolOutput + Send + Sync>;

/// Runner that answers every invocation through a closure and records it
pub struct ScriptedRunner {
    handler: Handler,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Invocation) -> ToolOutput + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every command exits 0 with no output
    pub fn succeeding() -> Self {
        Self::new(|_| ToolOutput::ok(""))
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.program).collect()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, invocation: &Invocation) -> NativepackResult<ToolOutput> {
        self.calls.lock().unwrap().push(invocation.clone());
        Ok((self.handler)(invocation))
    }
}

/// Registry backed by a vector; `add` replaces a remote of the same name
#[derive(Default)]
pub struct InMemoryRegistry {
    remotes: Mutex<Vec<RemoteSource>>,
}

impl InMemoryRegistry {
    pub fn with(remotes: Vec<RemoteSource>) -> Self {
        Self {
            remotes: Mutex::new(remotes),
        }
    }

    pub fn snapshot(&self) -> Vec<RemoteSource> {
        self.remotes.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteRegistry for InMemoryRegistry {
    async fn get(&self, name: &str) -> NativepackResult<Option<RemoteSource>> {
        Ok(self
            .remotes
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.name == name)
            .cloned())
    }

    async fn add(&self, remote: &RemoteSource) -> NativepackResult<()> {
        let mut remotes = self.remotes.lock().unwrap();
        remotes.retain(|r| r.name != remote.name);
        remotes.push(remote.clone());
        Ok(())
    }

    async fn remove(&self, name: &str) -> NativepackResult<()> {
        let mut remotes = self.remotes.lock().unwrap();
        let before = remotes.len();
        remotes.retain(|r| r.name != name);
        if remotes.len() == before {
            return Err(NativepackError::RemoteQuery(format!("remote {} not found", name)));
        }
        Ok(())
    }
}

/// Dependency manager that records what the pipeline asked of it
#[derive(Default)]
pub struct FakeDependencyManager {
    registry: InMemoryRegistry,
    purges: AtomicUsize,
    profiles: AtomicUsize,
    exports: Mutex<Vec<String>>,
    home: Mutex<Option<PathBuf>>,
    failing_export: Option<String>,
}

impl FakeDependencyManager {
    pub fn with_remotes(remotes: Vec<RemoteSource>) -> Self {
        Self {
            registry: InMemoryRegistry::with(remotes),
            ..Self::default()
        }
    }

    pub fn failing_export(mut self, name: &str) -> Self {
        self.failing_export = Some(name.to_string());
        self
    }

    pub fn purge_count(&self) -> usize {
        self.purges.load(Ordering::SeqCst)
    }

    pub fn profile_count(&self) -> usize {
        self.profiles.load(Ordering::SeqCst)
    }

    pub fn exports(&self) -> Vec<String> {
        self.exports.lock().unwrap().clone()
    }

    pub fn home(&self) -> Option<PathBuf> {
        self.home.lock().unwrap().clone()
    }

    pub fn remotes(&self) -> Vec<RemoteSource> {
        self.registry.snapshot()
    }
}

#[async_trait]
impl RemoteRegistry for FakeDependencyManager {
    async fn get(&self, name: &str) -> NativepackResult<Option<RemoteSource>> {
        self.registry.get(name).await
    }

    async fn add(&self, remote: &RemoteSource) -> NativepackResult<()> {
        self.registry.add(remote).await
    }

    async fn remove(&self, name: &str) -> NativepackResult<()> {
        self.registry.remove(name).await
    }
}

#[async_trait]
impl CachePurger for FakeDependencyManager {
    async fn purge(&self) -> NativepackResult<()> {
        self.purges.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl DependencyManager for FakeDependencyManager {
    fn use_home(&self, home: &Path) {
        *self.home.lock().unwrap() = Some(home.to_path_buf());
    }

    async fn detect_profile(&self) -> NativepackResult<()> {
        self.profiles.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn export(
        &self,
        _recipe_dir: &Path,
        requirement: &DependencyRequirement,
    ) -> NativepackResult<()> {
        if self.failing_export.as_deref() == Some(requirement.name.as_str()) {
            return Err(NativepackError::external(
                format!("export {}", requirement),
                &ToolOutput::failed(1, "recipe error"),
            ));
        }
        self.exports.lock().unwrap().push(requirement.to_string());
        Ok(())
    }
}

/// Probe that always reports the same identity
pub struct FixedProbe(pub RuntimeIdentity);

#[async_trait]
impl RuntimeProbe for FixedProbe {
    async fn detect(&self) -> RuntimeIdentity {
        self.0.clone()
    }
}

/// Purger that only counts calls
#[derive(Default)]
pub struct CountingPurger {
    calls: AtomicUsize,
}

impl CountingPurger {
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CachePurger for CountingPurger {
    async fn purge(&self) -> NativepackResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
