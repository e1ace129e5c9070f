//! C runtime identity detection
//!
//! Layered strategy: ask the platform's own runtime first (glibc reports its
//! version directly), then inspect the extension's interpreter binary for a
//! musl loader and ask that loader for its version. Detection never fails;
//! an unknown runtime is reported as an identity with an empty family.

use super::elf::program_interpreter;
use crate::exec::{CommandRunner, Invocation};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Family name reported for glibc hosts
pub const GLIBC: &str = "glibc";

/// Family name reported for musl hosts
pub const MUSL: &str = "musl";

/// Low-level C runtime family and version of the build host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeIdentity {
    pub family: String,
    pub version: String,
}

impl RuntimeIdentity {
    pub fn new(family: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            version: version.into(),
        }
    }

    /// Sentinel for a failed detection
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Whether detection produced a family name
    pub fn is_known(&self) -> bool {
        !self.family.is_empty()
    }
}

impl fmt::Display for RuntimeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_known() {
            write!(f, "{} {}", self.family, self.version)
        } else {
            write!(f, "unknown")
        }
    }
}

/// Source of the live runtime identity
#[async_trait]
pub trait RuntimeProbe: Send + Sync {
    async fn detect(&self) -> RuntimeIdentity;
}

/// Probe for the machine this process runs on
pub struct HostProbe {
    runner: Arc<dyn CommandRunner>,
    interpreter: Option<PathBuf>,
}

impl HostProbe {
    /// `interpreter` is the language runtime the extension is built for;
    /// when unset, this executable is inspected instead.
    pub fn new(runner: Arc<dyn CommandRunner>, interpreter: Option<PathBuf>) -> Self {
        Self {
            runner,
            interpreter,
        }
    }

    async fn from_interpreter(&self) -> Option<RuntimeIdentity> {
        let binary = match self.interpreter {
            Some(ref path) => resolve_program(path)?,
            None => std::env::current_exe().ok()?,
        };
        debug!("Inspecting {} for a musl loader", binary.display());

        let image = match tokio::fs::read(&binary).await {
            Ok(image) => image,
            Err(e) => {
                debug!("Cannot read {}: {}", binary.display(), e);
                return None;
            }
        };
        let loader = program_interpreter(&image)?;
        if !loader.contains(MUSL) {
            debug!("Interpreter loader {} is not musl", loader);
            return None;
        }

        // The musl loader prints its banner to stderr and exits non-zero
        // when run without arguments.
        let output = match self.runner.run(&Invocation::new(&loader)).await {
            Ok(output) => output,
            Err(e) => {
                debug!("Cannot run musl loader {}: {}", loader, e);
                return None;
            }
        };
        let version = parse_musl_version(&output.stderr)?;
        Some(RuntimeIdentity::new(MUSL, version))
    }
}

#[async_trait]
impl RuntimeProbe for HostProbe {
    async fn detect(&self) -> RuntimeIdentity {
        if let Some(identity) = native_runtime() {
            info!("Detected C runtime {}", identity);
            return identity;
        }
        match self.from_interpreter().await {
            Some(identity) => {
                info!("Detected C runtime {} from interpreter", identity);
                identity
            }
            None => {
                info!("Could not detect the C runtime, reporting unknown");
                RuntimeIdentity::unknown()
            }
        }
    }
}

#[cfg(all(target_os = "linux", target_env = "gnu"))]
fn native_runtime() -> Option<RuntimeIdentity> {
    // SAFETY: gnu_get_libc_version returns a pointer to a static,
    // NUL-terminated string owned by glibc.
    let version = unsafe { std::ffi::CStr::from_ptr(libc::gnu_get_libc_version()) };
    let version = version.to_str().ok()?.trim();
    if version.is_empty() {
        None
    } else {
        Some(RuntimeIdentity::new(GLIBC, version))
    }
}

#[cfg(not(all(target_os = "linux", target_env = "gnu")))]
fn native_runtime() -> Option<RuntimeIdentity> {
    None
}

/// Extract `major.minor` from the musl loader banner
///
/// ```text
/// musl libc (x86_64)
/// Version 1.2.4
/// Dynamic Program Loader
/// ```
pub(crate) fn parse_musl_version(banner: &str) -> Option<String> {
    let line = banner
        .lines()
        .map(str::trim)
        .find(|l| l.starts_with("Version "))?;
    let version = line["Version ".len()..].trim();
    let mut parts = version.split('.');
    let major: u64 = parts.next()?.parse().ok()?;
    let minor: u64 = parts.next()?.parse().ok()?;
    Some(format!("{}.{}", major, minor))
}

/// Resolve a program name through PATH; paths with a separator are taken as-is
fn resolve_program(program: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 || program.is_absolute() {
        return Some(program.to_path_buf());
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}
