//! Configure and build steps of the external toolchain

use super::config::BuildConfig;
use crate::error::{NativepackError, NativepackResult};
use crate::exec::{CommandRunner, Invocation};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Configure cache file left behind by earlier runs
const CONFIGURE_CACHE: &str = "CMakeCache.txt";

/// File extensions of loadable extension modules
const ARTIFACT_EXTENSIONS: &[&str] = &["so", "pyd", "dylib"];

/// The external configure script and build driver
pub struct Toolchain<'a> {
    runner: &'a dyn CommandRunner,
    config: &'a BuildConfig,
    env: Vec<(String, String)>,
}

impl<'a> Toolchain<'a> {
    pub fn new(runner: &'a dyn CommandRunner, config: &'a BuildConfig) -> Self {
        Self {
            runner,
            config,
            env: Vec::new(),
        }
    }

    /// Environment variable passed to both toolchain steps
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    fn prepare(&self, inv: Invocation) -> Invocation {
        self.env
            .iter()
            .fold(inv, |inv, (key, value)| inv.env(key, value))
            .streamed()
    }

    /// Configure invocation, run from the source directory
    pub fn configure_invocation(&self, version: Option<&str>) -> Invocation {
        let cfg = self.config;
        let mut inv = Invocation::new(&cfg.toolchain_cmd)
            .arg("--source")
            .path_arg(&cfg.source_dir)
            .arg("--build")
            .path_arg(&cfg.toolchain_dir())
            .args(["--config", cfg.build_type.as_str()])
            .args(["--conan_cmd", cfg.manager_cmd.as_str()])
            .arg("--conan_extra_args")
            .arg(cfg.manager_args.join(" "))
            .args(cfg.defines.iter().cloned());

        if let Some(version) = version {
            inv = inv.arg(format!("-D{}={}", cfg.version_define, version));
        }

        inv.arg(format!(
            "-DCMAKE_LIBRARY_OUTPUT_DIRECTORY={}",
            cfg.output_dir.display()
        ))
        .arg(format!("-DPYTHON_EXECUTABLE={}", cfg.interpreter.display()))
        .args(cfg.extra_args.iter().cloned())
        .current_dir(&cfg.source_dir)
    }

    /// Build invocation for the extension target, run from the build directory
    pub fn build_invocation(&self) -> Invocation {
        let cfg = self.config;
        let mut inv = Invocation::new(&cfg.build_cmd)
            .arg("--build")
            .path_arg(&cfg.toolchain_dir());
        if cfg.parallel {
            inv = inv.arg("--parallel");
        }
        inv.args(["--target", cfg.extension.as_str()])
            .current_dir(&cfg.build_dir)
    }

    /// Run the configure step
    pub async fn configure(&self, version: Option<&str>) -> NativepackResult<()> {
        fs::create_dir_all(&self.config.build_dir)
            .await
            .map_err(|e| {
                NativepackError::io(
                    format!("creating build directory {}", self.config.build_dir.display()),
                    e,
                )
            })?;
        clear_configure_cache(&self.config.build_dir);

        let inv = self.prepare(self.configure_invocation(version));
        info!(build_type = %self.config.build_type, "Configuring: {}", inv);
        self.runner.run(&inv).await?.check(&inv)?;
        Ok(())
    }

    /// Run the build step and locate the built extension
    pub async fn build(&self) -> NativepackResult<PathBuf> {
        let inv = self.prepare(self.build_invocation());
        info!("Building: {}", inv);
        self.runner.run(&inv).await?.check(&inv)?;

        locate_artifact(&self.config.output_dir, &self.config.extension).ok_or_else(|| {
            NativepackError::ArtifactNotFound {
                name: self.config.extension.clone(),
                dir: self.config.output_dir.clone(),
            }
        })
    }
}

/// Read the first line of the version file, if there is one
pub async fn read_version(source_dir: &Path, version_file: &Path) -> Option<String> {
    let path = source_dir.join(version_file);
    match fs::read_to_string(&path).await {
        Ok(content) => {
            let version = content.lines().next().unwrap_or_default().trim().to_string();
            if version.is_empty() {
                warn!("Version file {} is empty", path.display());
                None
            } else {
                debug!("Version {} from {}", version, path.display());
                Some(version)
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No version file at {}", path.display());
            None
        }
        Err(e) => {
            warn!("Could not read version file {}: {}", path.display(), e);
            None
        }
    }
}

/// Remove stale configure caches below `build_dir`
///
/// Best effort: failures are logged and skipped. Returns the number removed.
pub fn clear_configure_cache(build_dir: &Path) -> usize {
    let mut removed = 0;
    for entry in WalkDir::new(build_dir).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() || entry.file_name() != CONFIGURE_CACHE {
            continue;
        }
        match std::fs::remove_file(entry.path()) {
            Ok(()) => {
                info!("Removed {}", entry.path().display());
                removed += 1;
            }
            Err(e) => warn!("Could not remove {}: {}", entry.path().display(), e),
        }
    }
    removed
}

/// Find the built extension `<name>[.<tag>].<so|pyd|dylib>` in `dir`
pub fn locate_artifact(dir: &Path, name: &str) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut matches: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                return false;
            };
            let Some(rest) = file_name.strip_prefix(name).and_then(|r| r.strip_prefix('.')) else {
                return false;
            };
            rest.rsplit('.')
                .next()
                .is_some_and(|ext| ARTIFACT_EXTENSIONS.contains(&ext))
        })
        .collect();
    matches.sort();
    if matches.len() > 1 {
        warn!(
            "Several builds of {} in {}, using {}",
            name,
            dir.display(),
            matches[0].display()
        );
    }
    matches.into_iter().next()
}

/// Module name of an extension artifact (`_ext.cpython-312-x86_64-linux-gnu.so` → `_ext`)
pub fn module_name(artifact: &Path) -> Option<&str> {
    artifact
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.split('.').next())
        .filter(|n| !n.is_empty())
}
