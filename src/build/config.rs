//! Per-invocation build configuration

use crate::config::Config;
use clap::ValueEnum;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Toolchain build type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ValueEnum)]
pub enum BuildType {
    Debug,
    #[default]
    Release,
}

impl BuildType {
    /// Name as the configure script expects it
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::Release => "Release",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied values that take precedence over the project config
#[derive(Debug, Clone, Default)]
pub struct BuildOverrides {
    pub source_dir: PathBuf,
    pub build_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub build_type: Option<BuildType>,
    /// Debug flag from the environment, used when no build type is given
    pub debug: bool,
    pub toolchain_cmd: Option<String>,
    pub manager_cmd: Option<String>,
    pub extra_args: Vec<String>,
}

/// Everything the toolchain stages need, read-only once assembled
#[derive(Debug, Clone, Serialize)]
pub struct BuildConfig {
    pub source_dir: PathBuf,
    /// Scratch directory for toolchain state and generated stubs
    pub build_dir: PathBuf,
    /// Where the extension and its package directory end up
    pub output_dir: PathBuf,
    pub build_type: BuildType,
    /// Configure command
    pub toolchain_cmd: String,
    /// Build driver command
    pub build_cmd: String,
    pub parallel: bool,
    pub defines: Vec<String>,
    /// Configured extra arguments followed by the caller's passthrough
    pub extra_args: Vec<String>,
    pub extension: String,
    pub package: String,
    pub interpreter: PathBuf,
    pub manager_cmd: String,
    pub manager_args: Vec<String>,
    pub version_file: PathBuf,
    pub version_define: String,
}

impl BuildConfig {
    /// Merge project configuration with caller overrides
    ///
    /// Relative directories are resolved against the source directory.
    pub fn assemble(config: &Config, overrides: BuildOverrides) -> Self {
        let source_dir = overrides.source_dir;
        let build_dir = overrides
            .build_dir
            .map(|dir| source_dir.join(dir))
            .unwrap_or_else(|| source_dir.join("build"));
        let output_dir = overrides
            .output_dir
            .map(|dir| source_dir.join(dir))
            .unwrap_or_else(|| build_dir.join("lib"));
        let build_type = overrides.build_type.unwrap_or(if overrides.debug {
            BuildType::Debug
        } else {
            BuildType::Release
        });

        let mut extra_args = config.toolchain.extra_args.clone();
        extra_args.extend(overrides.extra_args);

        Self {
            source_dir,
            build_dir,
            output_dir,
            build_type,
            toolchain_cmd: overrides
                .toolchain_cmd
                .unwrap_or_else(|| config.toolchain.configure.clone()),
            build_cmd: config.toolchain.build.clone(),
            parallel: config.toolchain.parallel,
            defines: config.toolchain.defines.clone(),
            extra_args,
            extension: config.extension.name.clone(),
            package: config.extension.package.clone(),
            interpreter: config.extension.interpreter.clone(),
            manager_cmd: overrides
                .manager_cmd
                .unwrap_or_else(|| config.dependencies.manager.clone()),
            manager_args: config.dependencies.manager_args.clone(),
            version_file: config.extension.version_file.clone(),
            version_define: config.extension.version_define.clone(),
        }
    }

    /// Directory the toolchain configures into
    pub fn toolchain_dir(&self) -> PathBuf {
        self.build_dir.join("build")
    }

    /// Package directory inside the output tree
    pub fn package_dir(&self) -> PathBuf {
        self.output_dir.join(&self.package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn overrides() -> BuildOverrides {
        BuildOverrides {
            source_dir: PathBuf::from("/src/mimir"),
            ..BuildOverrides::default()
        }
    }

    #[test]
    fn defaults_come_from_config() {
        let build = BuildConfig::assemble(&Config::default(), overrides());

        assert_eq!(build.build_type, BuildType::Release);
        assert_eq!(build.build_dir, Path::new("/src/mimir/build"));
        assert_eq!(build.output_dir, Path::new("/src/mimir/build/lib"));
        assert_eq!(build.toolchain_dir(), Path::new("/src/mimir/build/build"));
        assert_eq!(build.package_dir(), Path::new("/src/mimir/build/lib/pymimir"));
        assert_eq!(build.toolchain_cmd, "./configure.sh");
        assert_eq!(build.manager_cmd, "conan");
    }

    #[test]
    fn debug_flag_selects_debug_unless_type_given() {
        let build = BuildConfig::assemble(
            &Config::default(),
            BuildOverrides {
                debug: true,
                ..overrides()
            },
        );
        assert_eq!(build.build_type, BuildType::Debug);

        let build = BuildConfig::assemble(
            &Config::default(),
            BuildOverrides {
                debug: true,
                build_type: Some(BuildType::Release),
                ..overrides()
            },
        );
        assert_eq!(build.build_type, BuildType::Release);
    }

    #[test]
    fn passthrough_args_follow_configured_ones() {
        let mut config = Config::default();
        config.toolchain.extra_args = vec!["-DUSE_LTO=ON".to_string()];

        let build = BuildConfig::assemble(
            &config,
            BuildOverrides {
                extra_args: vec!["-G".to_string(), "Ninja".to_string()],
                build_dir: Some(PathBuf::from("/tmp/out")),
                ..overrides()
            },
        );

        assert_eq!(build.extra_args, vec!["-DUSE_LTO=ON", "-G", "Ninja"]);
        assert_eq!(build.build_dir, Path::new("/tmp/out"));
    }
}
