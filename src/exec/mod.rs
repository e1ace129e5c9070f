//! External command execution
//!
//! Every external tool (dependency manager, configure script, compiler driver,
//! stub generator) is reached through the narrow [`CommandRunner`] capability,
//! so the pipeline can be driven by a scripted runner in tests.

mod process;

pub use process::ProcessRunner;

use crate::error::{NativepackError, NativepackResult};
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};

/// Max number of stdout lines kept in error diagnostics
const DIAGNOSTIC_TAIL_LINES: usize = 50;

/// A single external command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program to execute (resolved through PATH by the runner)
    pub program: String,

    /// Arguments, passed verbatim
    pub args: Vec<String>,

    /// Working directory (inherits the caller's when unset)
    pub cwd: Option<PathBuf>,

    /// Extra environment variables layered over the inherited environment
    pub env: Vec<(String, String)>,

    /// Echo output live while it is collected
    pub stream: bool,
}

impl Invocation {
    /// Create an invocation of `program` with no arguments
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
            stream: false,
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append a path argument
    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.display().to_string())
    }

    /// Run in the given working directory
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Set an environment variable for the child process
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Stream output to the terminal while collecting it
    pub fn streamed(mut self) -> Self {
        self.stream = true;
        self
    }

    /// Whether the argument list contains `needle`
    pub fn has_arg(&self, needle: &str) -> bool {
        self.args.iter().any(|a| a == needle)
    }

    /// Value following `flag` in the argument list
    pub fn arg_after(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of an external command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` when the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Successful output with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Whether the command exited with status zero
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// The tool's own diagnostics
    ///
    /// The tail of stdout followed by all of stderr, since tools like CMake
    /// split an error report across both streams.
    pub fn diagnostics(&self) -> String {
        let stderr = self.stderr.trim_end();
        let lines: Vec<&str> = self.stdout.trim_end().lines().collect();
        let tail = lines[lines.len().saturating_sub(DIAGNOSTIC_TAIL_LINES)..].join("\n");
        match (tail.is_empty(), stderr.is_empty()) {
            (true, _) => stderr.to_string(),
            (false, true) => tail,
            (false, false) => format!("{}\n{}", tail, stderr),
        }
    }

    /// Turn a non-zero exit into an [`NativepackError::ExternalTool`]
    pub fn check(self, invocation: &Invocation) -> NativepackResult<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(NativepackError::external(invocation.to_string(), &self))
        }
    }
}

/// Capability to run external commands
///
/// `run` only fails when the process cannot be started; a non-zero exit is
/// reported through [`ToolOutput::code`].
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> NativepackResult<ToolOutput>;
}
