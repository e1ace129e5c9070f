//! Host environment detection
//!
//! Platform sniffing, C runtime identity, and host-to-container path
//! translation. Everything here is decided once per run and then passed
//! around as plain values.

mod elf;
pub mod paths;
pub mod probe;

pub use paths::{to_container_path, PathTranslator, DEFAULT_MOUNT_ROOT};
pub use probe::{HostProbe, RuntimeIdentity, RuntimeProbe};

use std::path::PathBuf;
use tracing::debug;

/// Detected platform family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOS,
    Windows,
    Other,
}

impl Platform {
    /// Detect the current platform
    pub fn detect() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    fn from_os(os: &str) -> Self {
        match os {
            "linux" => Platform::Linux,
            "macos" => Platform::MacOS,
            "windows" => Platform::Windows,
            _ => Platform::Other,
        }
    }

    /// Get a human-readable platform name
    pub fn name(&self) -> &'static str {
        match self {
            Platform::Linux => "Linux",
            Platform::MacOS => "macOS",
            Platform::Windows => "Windows",
            Platform::Other => "Other",
        }
    }

    /// Whether CI runners on this platform build inside a container that
    /// bind-mounts the host filesystem
    pub fn uses_build_container(&self) -> bool {
        matches!(self, Platform::Linux)
    }
}

/// Per-run description of where the orchestrator executes
///
/// Built once from CLI flags and environment variables; host paths are kept
/// untranslated here and mapped through [`ExecutionContext::translator`].
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Running on a CI build runner, isolated or not
    pub ci_runner: bool,

    /// Running inside an isolated container with the host mounted
    pub isolated: bool,

    /// Where the host filesystem is mounted inside the container
    pub mount_root: PathBuf,

    /// Dependency cache home override (host path)
    pub dependency_home: Option<PathBuf>,

    /// Persisted runtime identity record (host path)
    pub record_file: Option<PathBuf>,

    /// Clone of the primary remote, registered as the fallback source (host path)
    pub remote_clone: Option<PathBuf>,
}

impl ExecutionContext {
    /// Resolve the context for this run
    ///
    /// A CI runner only counts as isolated on platforms whose runners build
    /// inside a container.
    pub fn resolve(
        ci_runner: bool,
        platform: Platform,
        mount_root: PathBuf,
        dependency_home: Option<PathBuf>,
        record_file: Option<PathBuf>,
        remote_clone: Option<PathBuf>,
    ) -> Self {
        let isolated = ci_runner && platform.uses_build_container();
        debug!(
            ci_runner,
            platform = platform.name(),
            isolated,
            "Resolved execution context"
        );
        Self {
            ci_runner,
            isolated,
            mount_root,
            dependency_home,
            record_file,
            remote_clone,
        }
    }

    /// A non-isolated context with nothing configured
    pub fn local() -> Self {
        Self {
            ci_runner: false,
            isolated: false,
            mount_root: PathBuf::from(DEFAULT_MOUNT_ROOT),
            dependency_home: None,
            record_file: None,
            remote_clone: None,
        }
    }

    /// Path translator matching this context
    pub fn translator(&self) -> PathTranslator {
        PathTranslator::new(self.isolated, self.mount_root.clone())
    }

    /// Container-visible dependency cache home
    ///
    /// Outside a container the dependency manager's own default
    /// (`~/.conan2`) applies when no override is given.
    pub fn container_home(&self) -> Option<PathBuf> {
        match &self.dependency_home {
            Some(home) => Some(self.translator().translate(home)),
            None if !self.isolated => dirs::home_dir().map(|home| home.join(".conan2")),
            None => None,
        }
    }

    /// Container-visible path of the runtime identity record, if overridden
    pub fn container_record(&self) -> Option<PathBuf> {
        self.record_file
            .as_deref()
            .map(|record| self.translator().translate(record))
    }

    /// Container-visible path of the primary remote's clone
    pub fn container_remote_clone(&self) -> Option<PathBuf> {
        self.remote_clone
            .as_deref()
            .map(|clone| self.translator().translate(clone))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_detect_returns_valid() {
        let platform = Platform::detect();
        assert!(matches!(
            platform,
            Platform::Linux | Platform::MacOS | Platform::Windows | Platform::Other
        ));
    }

    #[test]
    fn platform_from_os() {
        assert_eq!(Platform::from_os("linux"), Platform::Linux);
        assert_eq!(Platform::from_os("macos"), Platform::MacOS);
        assert_eq!(Platform::from_os("freebsd"), Platform::Other);
        assert_eq!(Platform::MacOS.name(), "macOS");
    }

    #[test]
    fn ci_runner_is_isolated_only_on_linux() {
        let ctx = ExecutionContext::resolve(true, Platform::Linux, "/host".into(), None, None, None);
        assert!(ctx.isolated);

        let ctx = ExecutionContext::resolve(true, Platform::MacOS, "/host".into(), None, None, None);
        assert!(!ctx.isolated);
        assert!(ctx.ci_runner);

        let ctx = ExecutionContext::resolve(false, Platform::Linux, "/host".into(), None, None, None);
        assert!(!ctx.isolated);
    }

    #[test]
    fn translator_follows_isolation() {
        let ctx = ExecutionContext::resolve(true, Platform::Linux, "/host".into(), None, None, None);
        assert_eq!(
            ctx.translator().translate(std::path::Path::new("/home/ci/.conan2")),
            PathBuf::from("/host/home/ci/.conan2")
        );

        let local = ExecutionContext::local();
        assert_eq!(
            local.translator().translate(std::path::Path::new("/home/ci/.conan2")),
            PathBuf::from("/home/ci/.conan2")
        );
    }

    #[test]
    fn isolated_context_requires_explicit_home() {
        let ctx = ExecutionContext::resolve(
            true,
            Platform::Linux,
            "/host".into(),
            None,
            Some("/var/ci/libc_id".into()),
            Some("/srv/index".into()),
        );
        assert_eq!(ctx.container_home(), None);
        assert_eq!(ctx.container_record(), Some(PathBuf::from("/host/var/ci/libc_id")));
        assert_eq!(ctx.container_remote_clone(), Some(PathBuf::from("/host/srv/index")));
    }

    #[test]
    fn local_context_keeps_host_paths() {
        let ctx = ExecutionContext::resolve(
            false,
            Platform::Linux,
            "/host".into(),
            Some("/home/ci/.conan2".into()),
            None,
            None,
        );
        assert_eq!(ctx.container_home(), Some(PathBuf::from("/home/ci/.conan2")));
        assert_eq!(ctx.container_record(), None);
    }
}
