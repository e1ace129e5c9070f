//! Host-to-container path translation
//!
//! Containerized CI runners bind-mount the host filesystem under a fixed
//! sub-root, so a host path `/a/b` is visible as `<mount_root>/a/b`.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

/// Mount point of the host filesystem inside build containers
pub const DEFAULT_MOUNT_ROOT: &str = "/host";

/// Rewrite `host_path` to live under `mount_root`
///
/// Relative paths are taken from the current directory. The result is
/// normalized lexically, its root (and any drive prefix) stripped, and the
/// remainder re-joined under `mount_root`, so it never leaves `mount_root`.
pub fn to_container_path(host_path: &Path, mount_root: &Path) -> PathBuf {
    let absolute = if host_path.is_absolute() {
        host_path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(host_path),
            Err(_) => host_path.to_path_buf(),
        }
    };
    mount_root.join(strip_root(&absolute))
}

/// Resolve `.` and `..` without touching the filesystem and drop the root
fn strip_root(path: &Path) -> PathBuf {
    let mut parts: Vec<&OsStr> = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::ParentDir => {
                parts.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    parts.iter().collect()
}

/// Applies [`to_container_path`] only when running isolated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTranslator {
    isolated: bool,
    mount_root: PathBuf,
}

impl PathTranslator {
    pub fn new(isolated: bool, mount_root: impl Into<PathBuf>) -> Self {
        Self {
            isolated,
            mount_root: mount_root.into(),
        }
    }

    /// Container-visible path for `host_path`; identity when not isolated
    pub fn translate(&self, host_path: &Path) -> PathBuf {
        if self.isolated {
            to_container_path(host_path, &self.mount_root)
        } else {
            host_path.to_path_buf()
        }
    }
}
