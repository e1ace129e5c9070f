//! Configuration management for nativepack

pub mod schema;

pub use schema::Config;

use crate::error::{NativepackError, NativepackResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Name of the project configuration file
pub const CONFIG_FILE_NAME: &str = "nativepack.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
    required: bool,
}

impl ConfigManager {
    /// Use the project file in `source_dir`, if there is one
    pub fn discover(source_dir: &Path) -> Self {
        Self {
            config_path: source_dir.join(CONFIG_FILE_NAME),
            required: false,
        }
    }

    /// Use an explicit file, which must exist
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            config_path: path,
            required: true,
        }
    }

    /// Load configuration, falling back to defaults for a missing discovered file
    pub async fn load(&self) -> NativepackResult<Config> {
        if !self.config_path.exists() {
            if self.required {
                return Err(NativepackError::ConfigNotFound(self.config_path.clone()));
            }
            debug!(
                "No config at {}, using defaults",
                self.config_path.display()
            );
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> NativepackResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| NativepackError::io(format!("reading config from {}", path.display()), e))?;

        let config = toml::from_str(&content).map_err(|e| NativepackError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Render the effective configuration as TOML
    pub fn render(config: &Config) -> NativepackResult<String> {
        Ok(toml::to_string_pretty(config)?)
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}
