//! Interface stub generation

use super::toolchain::module_name;
use crate::error::{NativepackError, NativepackResult};
use crate::exec::{CommandRunner, Invocation};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Runs the stub generator against a built extension
pub struct StubEmitter {
    runner: Arc<dyn CommandRunner>,
    interpreter: PathBuf,
    generator: String,
    extension: String,
}

impl StubEmitter {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        interpreter: impl Into<PathBuf>,
        generator: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            interpreter: interpreter.into(),
            generator: generator.into(),
            extension: extension.into(),
        }
    }

    /// Generator invocation for `module`, run next to the artifact so it imports
    pub fn invocation(&self, artifact_dir: &Path, module: &str, output_dir: &Path) -> Invocation {
        Invocation::new(self.interpreter.display().to_string())
            .args(["-m", self.generator.as_str(), "--output-dir"])
            .path_arg(output_dir)
            .arg(module)
            .current_dir(artifact_dir)
    }

    /// Generate the stub for `artifact` into `output_dir`
    ///
    /// Returns the path of the generated `<module>.<extension>` file. A stub
    /// left over from an earlier run is removed first, so only output of this
    /// run counts. A non-zero exit or a missing output file is a
    /// [`NativepackError::GenerationFailed`].
    pub async fn generate(&self, artifact: &Path, output_dir: &Path) -> NativepackResult<PathBuf> {
        let module = module_name(artifact).ok_or_else(|| {
            NativepackError::generation(format!(
                "cannot derive a module name from {}",
                artifact.display()
            ))
        })?;
        let artifact_dir = artifact.parent().unwrap_or_else(|| Path::new("."));

        tokio::fs::create_dir_all(output_dir).await.map_err(|e| {
            NativepackError::io(format!("creating stub directory {}", output_dir.display()), e)
        })?;

        let stub = output_dir.join(format!("{}.{}", module, self.extension));
        remove_stale(&stub).await?;

        let inv = self.invocation(artifact_dir, module, output_dir);
        info!("Generating stubs: {}", inv);
        let output = self.runner.run(&inv).await?;
        if !output.success() {
            let status = output
                .code
                .map(|c| format!("exited with code {}", c))
                .unwrap_or_else(|| "was terminated by a signal".to_string());
            return Err(NativepackError::GenerationFailed {
                detail: format!("{} {}\n{}", inv, status, output.diagnostics()),
                code: output.code,
            });
        }

        if !stub.is_file() {
            return Err(NativepackError::generation(format!(
                "{} produced no {}",
                self.generator,
                stub.display()
            )));
        }
        debug!("Generated {}", stub.display());
        Ok(stub)
    }
}

async fn remove_stale(stub: &Path) -> NativepackResult<()> {
    match tokio::fs::remove_file(stub).await {
        Ok(()) => {
            debug!("Removed stale stub {}", stub.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(NativepackError::io(
            format!("removing stale stub {}", stub.display()),
            e,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::ToolOutput;
    use crate::testing::ScriptedRunner;
    use tempfile::TempDir;

    fn emitter(runner: Arc<ScriptedRunner>) -> StubEmitter {
        StubEmitter::new(runner, "python3", "pybind11_stubgen", "pyi")
    }

    /// Runner that writes `<module>.pyi` into the requested output directory
    fn writing_runner() -> Arc<ScriptedRunner> {
        Arc::new(ScriptedRunner::new(|inv| {
            let dir = PathBuf::from(inv.arg_after("--output-dir").unwrap());
            let module = inv.args.last().unwrap();
            std::fs::write(dir.join(format!("{module}.pyi")), "def f() -> None: ...\n").unwrap();
            ToolOutput::ok("")
        }))
    }

    #[tokio::test]
    async fn generates_stub_for_module() {
        let temp = TempDir::new().unwrap();
        let artifact = temp.path().join("lib").join("_pymimir.cpython-312-x86_64-linux-gnu.so");
        let stubs = temp.path().join("stubs");
        let runner = writing_runner();

        let stub = emitter(runner.clone())
            .generate(&artifact, &stubs)
            .await
            .unwrap();

        assert_eq!(stub, stubs.join("_pymimir.pyi"));
        let call = &runner.calls()[0];
        assert_eq!(call.cwd.as_deref(), Some(temp.path().join("lib").as_path()));
        assert_eq!(
            call.args,
            vec![
                "-m".to_string(),
                "pybind11_stubgen".to_string(),
                "--output-dir".to_string(),
                stubs.display().to_string(),
                "_pymimir".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn non_zero_exit_is_generation_failure() {
        let temp = TempDir::new().unwrap();
        let runner = Arc::new(ScriptedRunner::new(|_| {
            ToolOutput::failed(1, "ModuleNotFoundError: No module named '_pymimir'")
        }));

        let err = emitter(runner)
            .generate(&temp.path().join("_pymimir.so"), temp.path())
            .await
            .unwrap_err();

        match err {
            NativepackError::GenerationFailed { detail, code } => {
                assert!(detail.contains("ModuleNotFoundError"));
                assert_eq!(code, Some(1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_output_is_generation_failure() {
        let temp = TempDir::new().unwrap();
        let runner = Arc::new(ScriptedRunner::succeeding());

        let err = emitter(runner)
            .generate(&temp.path().join("_pymimir.so"), temp.path())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            NativepackError::GenerationFailed { code: None, .. }
        ));
    }

    #[tokio::test]
    async fn stale_stub_does_not_count_as_output() {
        let temp = TempDir::new().unwrap();
        let stale = temp.path().join("_pymimir.pyi");
        std::fs::write(&stale, "class Old: ...\n").unwrap();
        let runner = Arc::new(ScriptedRunner::succeeding());

        let err = emitter(runner)
            .generate(&temp.path().join("_pymimir.so"), temp.path())
            .await
            .unwrap_err();

        assert!(matches!(err, NativepackError::GenerationFailed { .. }));
        assert!(!stale.exists());
    }

    #[tokio::test]
    async fn fresh_stub_replaces_stale_one() {
        let temp = TempDir::new().unwrap();
        let artifact = temp.path().join("_pymimir.so");
        std::fs::write(temp.path().join("_pymimir.pyi"), "class Old: ...\n").unwrap();

        let stub = emitter(writing_runner())
            .generate(&artifact, temp.path())
            .await
            .unwrap();

        let content = std::fs::read_to_string(stub).unwrap();
        assert!(content.contains("def f()"));
    }
}
