//! Configuration schema for nativepack
//!
//! Project configuration lives in `nativepack.toml` next to the sources.
//! Every field has a default, so an empty file (or no file) is valid.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// The extension module being built
    pub extension: ExtensionConfig,

    /// External configure/build commands
    pub toolchain: ToolchainConfig,

    /// Dependency manager settings
    pub dependencies: DependenciesConfig,

    /// Remote source reconciliation
    pub remote: RemoteConfig,

    /// Containerized CI runners
    pub isolation: IsolationConfig,

    /// Interface stub generation
    pub stubs: StubsConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Extension module settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionConfig {
    /// Module name of the built artifact (also the build target)
    pub name: String,

    /// Package directory the stub is installed into
    pub package: String,

    /// Interpreter the extension is built for
    pub interpreter: PathBuf,

    /// File holding the version string, relative to the source directory
    pub version_file: PathBuf,

    /// Define the version is passed through to configure
    pub version_define: String,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            name: "_pymimir".to_string(),
            package: "pymimir".to_string(),
            interpreter: PathBuf::from("python3"),
            version_file: PathBuf::from("__version__"),
            version_define: "MIMIR_VERSION_INFO".to_string(),
        }
    }
}

/// Toolchain commands
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Configure script, run from the source directory
    pub configure: String,

    /// Build driver
    pub build: String,

    /// Pass `--parallel` to the build driver
    pub parallel: bool,

    /// Defines always passed to configure
    pub defines: Vec<String>,

    /// Extra arguments appended to configure
    pub extra_args: Vec<String>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            configure: "./configure.sh".to_string(),
            build: "cmake".to_string(),
            parallel: true,
            defines: vec!["-DBUILD_PYMIMIR=ON".to_string(), "-DBUILD_TESTS=OFF".to_string()],
            extra_args: vec![],
        }
    }
}

/// Dependency manager settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DependenciesConfig {
    /// Dependency manager command
    pub manager: String,

    /// Arguments forwarded to the manager by the configure script
    pub manager_args: Vec<String>,

    /// Requirements manifest, relative to the source directory
    pub manifest: PathBuf,

    /// Directory holding one recipe directory per dependency
    pub recipes_dir: PathBuf,

    /// Dependencies to export before configuring (empty = all)
    pub export: Vec<String>,
}

impl Default for DependenciesConfig {
    fn default() -> Self {
        Self {
            manager: "conan".to_string(),
            manager_args: vec!["--build=missing".to_string()],
            manifest: PathBuf::from("conandata.yml"),
            recipes_dir: PathBuf::from("dependencies"),
            export: vec![],
        }
    }
}

/// Remote source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Default remote superseded by the fallback
    pub default_remote: String,

    /// Name of the fallback remote
    pub fallback_name: String,

    /// Kind of the fallback remote ("indexed-recipes" or "remote-server")
    pub fallback_kind: String,

    /// Recreate the fallback when its location drifted
    pub reconcile_location: bool,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            default_remote: "conancenter".to_string(),
            fallback_name: "local_conancenter".to_string(),
            fallback_kind: "indexed-recipes".to_string(),
            reconcile_location: false,
        }
    }
}

/// Isolated environment settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IsolationConfig {
    /// Mount point of the host filesystem inside the build container
    pub mount_root: PathBuf,
}

impl Default for IsolationConfig {
    fn default() -> Self {
        Self {
            mount_root: PathBuf::from(crate::host::DEFAULT_MOUNT_ROOT),
        }
    }
}

/// Stub generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StubsConfig {
    /// Generator module run with the interpreter (`-m`)
    pub generator: String,

    /// Extension of the generated stub file
    pub extension: String,

    /// File name the stub is installed as inside the package
    pub entry_point: String,
}

impl Default for StubsConfig {
    fn default() -> Self {
        Self {
            generator: "pybind11_stubgen".to_string(),
            extension: "pyi".to_string(),
            entry_point: "__init__.pyi".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[toolchain]"));
        assert!(toml.contains("[remote]"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.dependencies.manager, "conan");
        assert_eq!(config.remote.fallback_name, "local_conancenter");
        assert!(!config.remote.reconcile_location);
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [extension]
            name = "_fastlib"
            package = "fastlib"

            [remote]
            reconcile_location = true
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.extension.name, "_fastlib");
        assert_eq!(config.extension.version_file, PathBuf::from("__version__"));
        assert!(config.remote.reconcile_location);
        assert_eq!(config.stubs.entry_point, "__init__.pyi"); // default preserved
    }
}
