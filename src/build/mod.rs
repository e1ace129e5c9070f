//! Build pipeline
//!
//! Drives the extension build through a fixed sequence of stages:
//!
//! ```text
//! INIT → ENV_SETUP → CACHE_CHECK → REMOTE_CONFIG → CONFIGURE → BUILD → STUB_GEN → PACKAGE → DONE
//! ```
//!
//! Any stage may end in `FAILED`. Stages run strictly one after another;
//! parallelism only happens inside the external build driver.

pub mod config;
pub mod package;
pub mod pipeline;
pub mod stubs;
pub mod toolchain;

pub use config::{BuildConfig, BuildOverrides, BuildType};
pub use package::{BuildReceipt, FileDigest, PackageLayout, RECEIPT_FILE_NAME};
pub use pipeline::{Pipeline, PipelineReport, StageObserver};
pub use stubs::StubEmitter;
pub use toolchain::Toolchain;

use serde::Serialize;
use std::fmt;

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Init,
    EnvSetup,
    CacheCheck,
    RemoteConfig,
    Configure,
    Build,
    StubGen,
    Package,
    Done,
    Failed,
}

impl Stage {
    /// Working stages in execution order
    pub const ALL: [Stage; 8] = [
        Self::Init,
        Self::EnvSetup,
        Self::CacheCheck,
        Self::RemoteConfig,
        Self::Configure,
        Self::Build,
        Self::StubGen,
        Self::Package,
    ];

    /// Stages that run before the toolchain is first invoked
    pub fn is_before_toolchain(&self) -> bool {
        matches!(
            self,
            Self::Init | Self::EnvSetup | Self::CacheCheck | Self::RemoteConfig
        )
    }

    /// Stages whose failure is an external tool's failure
    pub fn runs_external_tool(&self) -> bool {
        matches!(self, Self::Configure | Self::Build | Self::StubGen)
    }

    /// Stages that only run in an isolated environment
    pub fn requires_isolation(&self) -> bool {
        matches!(self, Self::EnvSetup | Self::CacheCheck | Self::RemoteConfig)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::EnvSetup => "ENV_SETUP",
            Self::CacheCheck => "CACHE_CHECK",
            Self::RemoteConfig => "REMOTE_CONFIG",
            Self::Configure => "CONFIGURE",
            Self::Build => "BUILD",
            Self::StubGen => "STUB_GEN",
            Self::Package => "PACKAGE",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names() {
        assert_eq!(Stage::EnvSetup.to_string(), "ENV_SETUP");
        assert_eq!(Stage::StubGen.to_string(), "STUB_GEN");
        assert_eq!(
            serde_json::to_string(&Stage::RemoteConfig).unwrap(),
            "\"REMOTE_CONFIG\""
        );
    }

    #[test]
    fn isolation_only_stages_precede_toolchain() {
        let isolated: Vec<Stage> = Stage::ALL
            .into_iter()
            .filter(Stage::requires_isolation)
            .collect();
        assert_eq!(
            isolated,
            vec![Stage::EnvSetup, Stage::CacheCheck, Stage::RemoteConfig]
        );
        for stage in isolated {
            assert!(stage.is_before_toolchain());
            assert!(!stage.runs_external_tool());
        }
        assert!(!Stage::Package.runs_external_tool());
    }
}
