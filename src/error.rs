//! Error types for nativepack
//!
//! All modules use `NativepackResult<T>` as their return type. Recoverable
//! conditions (unknown runtime identity, incompatible cache, misconfigured
//! remote, malformed manifest entries) are handled where they occur and never
//! show up here.

use crate::build::Stage;
use crate::exec::ToolOutput;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for nativepack operations
pub type NativepackResult<T> = Result<T, NativepackError>;

/// Exit status for failures that happen before the toolchain is configured
pub const EXIT_ORCHESTRATION: u8 = 3;

/// Generic failure exit status
pub const EXIT_FAILURE: u8 = 1;

/// All errors that can occur in nativepack
#[derive(Error, Debug)]
pub enum NativepackError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Missing setting: {name}. {hint}")]
    MissingSetting { name: String, hint: String },

    // Manifest errors
    #[error("Dependency manifest not found: {0}")]
    ManifestNotFound(PathBuf),

    #[error("Invalid dependency manifest {path}: {reason}")]
    ManifestInvalid { path: PathBuf, reason: String },

    // External tool errors
    #[error("{command} {}{}", describe_exit(.code), format_diagnostics(.diagnostics))]
    ExternalTool {
        command: String,
        code: Option<i32>,
        diagnostics: String,
    },

    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Stub generation failed: {detail}")]
    GenerationFailed { detail: String, code: Option<i32> },

    #[error("Built artifact {name} not found in {dir}")]
    ArtifactNotFound { name: String, dir: PathBuf },

    #[error("{failed} dependency export(s) failed")]
    ExportFailed { failed: usize },

    // Registry errors
    #[error("Could not query remote sources: {0}")]
    RemoteQuery(String),

    // Pipeline errors
    #[error("Stage {stage} failed: {source}")]
    StageFailed {
        stage: Stage,
        #[source]
        source: Box<NativepackError>,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with code {}", code),
        None => "was terminated by a signal".to_string(),
    }
}

fn format_diagnostics(diagnostics: &str) -> String {
    if diagnostics.is_empty() {
        String::new()
    } else {
        format!("\n{}", diagnostics)
    }
}

impl NativepackError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error (process could not be spawned)
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create an external tool error carrying the tool's own diagnostics
    pub fn external(command: impl Into<String>, output: &ToolOutput) -> Self {
        Self::ExternalTool {
            command: command.into(),
            code: output.code,
            diagnostics: output.diagnostics(),
        }
    }

    /// Stub generation failure that no external exit status caused
    pub fn generation(detail: impl Into<String>) -> Self {
        Self::GenerationFailed {
            detail: detail.into(),
            code: None,
        }
    }

    /// Exit status of the external tool behind this error, if one caused it
    fn tool_code(&self) -> Option<i32> {
        match self {
            Self::ExternalTool { code, .. } | Self::GenerationFailed { code, .. } => *code,
            _ => None,
        }
    }

    /// Wrap an error raised inside a pipeline stage
    pub fn in_stage(self, stage: Stage) -> Self {
        match self {
            already @ Self::StageFailed { .. } => already,
            other => Self::StageFailed {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// The pipeline stage this error aborted, if any
    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            Self::StageFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Process exit status for this error
    ///
    /// Toolchain failures propagate the tool's own exit code; anything that
    /// fails before the toolchain runs exits with `EXIT_ORCHESTRATION`. A tool
    /// exiting with `EXIT_ORCHESTRATION` itself is reported as `EXIT_FAILURE`
    /// so the two stay distinguishable.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::StageFailed { stage, source } => {
                if stage.is_before_toolchain() {
                    return EXIT_ORCHESTRATION;
                }
                if !stage.runs_external_tool() {
                    return EXIT_FAILURE;
                }
                match source.tool_code().and_then(|c| u8::try_from(c).ok()) {
                    Some(0) | Some(EXIT_ORCHESTRATION) | None => EXIT_FAILURE,
                    Some(code) => code,
                }
            }
            Self::ConfigInvalid { .. }
            | Self::ConfigNotFound(_)
            | Self::MissingSetting { .. }
            | Self::TomlParse(_) => EXIT_ORCHESTRATION,
            _ => EXIT_FAILURE,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::StageFailed { source, .. } => source.hint(),
            Self::ManifestNotFound(_) => Some("Set [dependencies] manifest in nativepack.toml"),
            Self::ArtifactNotFound { .. } => {
                Some("Check that the toolchain writes the extension into --output-dir")
            }
            Self::GenerationFailed { .. } => Some("Is the stub generator installed for the interpreter?"),
            Self::CommandFailed { .. } => Some("Check that the command is installed and on PATH"),
            _ => None,
        }
    }
}
