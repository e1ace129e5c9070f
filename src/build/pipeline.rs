//! The build pipeline state machine

use super::config::BuildConfig;
use super::package::{BuildReceipt, PackageLayout};
use super::stubs::StubEmitter;
use super::toolchain::{read_version, Toolchain};
use super::Stage;
use crate::cache::{record_location, validate, CacheVerdict};
use crate::config::Config;
use crate::deps::conan::HOME_VAR;
use crate::deps::remote::parse_kind;
use crate::deps::{
    export_requirements, DependencyManager, ExportSummary, Manifest, RemoteAction,
    RemoteConfigurator,
};
use crate::error::{NativepackError, NativepackResult};
use crate::exec::CommandRunner;
use crate::host::{ExecutionContext, RuntimeIdentity, RuntimeProbe};
use serde::Serialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Receives stage transitions, e.g. to drive a progress display
pub trait StageObserver: Send + Sync {
    fn stage_started(&self, stage: Stage);

    fn stage_finished(&self, _stage: Stage) {}

    fn stage_skipped(&self, _stage: Stage) {}

    fn stage_failed(&self, _stage: Stage, _error: &NativepackError) {}
}

/// How a stage ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageOutcome {
    Completed,
    Skipped,
}

/// What a pipeline run did, stage by stage
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineReport {
    pub stages: Vec<(Stage, StageOutcome)>,
    pub runtime: Option<RuntimeIdentity>,
    pub cache: Option<CacheVerdict>,
    pub remote: Option<RemoteAction>,
    pub export: Option<ExportSummary>,
    pub artifact: Option<PathBuf>,
    pub package: Option<PackageLayout>,
    pub receipt: Option<PathBuf>,
}

impl PipelineReport {
    pub fn outcome(&self, stage: Stage) -> Option<StageOutcome> {
        self.stages
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, outcome)| *outcome)
    }

    /// Last stage that ran to completion
    pub fn last_completed(&self) -> Option<Stage> {
        self.stages
            .iter()
            .rev()
            .find(|(_, outcome)| *outcome == StageOutcome::Completed)
            .map(|(stage, _)| *stage)
    }
}

/// Dependency cache locations pinned during ENV_SETUP
#[derive(Debug, Clone)]
struct CacheLocation {
    home: PathBuf,
    record: PathBuf,
}

/// Runs the stages in order against injected collaborators
pub struct Pipeline {
    build: BuildConfig,
    settings: Config,
    context: ExecutionContext,
    runner: Arc<dyn CommandRunner>,
    manager: Arc<dyn DependencyManager>,
    probe: Arc<dyn RuntimeProbe>,
    observer: Option<Arc<dyn StageObserver>>,
}

impl Pipeline {
    pub fn new(
        build: BuildConfig,
        settings: Config,
        context: ExecutionContext,
        runner: Arc<dyn CommandRunner>,
        manager: Arc<dyn DependencyManager>,
        probe: Arc<dyn RuntimeProbe>,
    ) -> Self {
        Self {
            build,
            settings,
            context,
            runner,
            manager,
            probe,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn StageObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn build_config(&self) -> &BuildConfig {
        &self.build
    }

    /// Run every stage through PACKAGE
    pub async fn run(&self) -> NativepackResult<PipelineReport> {
        self.run_until(Stage::Package).await
    }

    /// Run only the environment stages (ENV_SETUP, CACHE_CHECK, REMOTE_CONFIG)
    pub async fn prepare(&self) -> NativepackResult<PipelineReport> {
        self.run_until(Stage::RemoteConfig).await
    }

    async fn run_until(&self, last: Stage) -> NativepackResult<PipelineReport> {
        let mut report = PipelineReport::default();
        info!(
            isolated = self.context.isolated,
            source = %self.build.source_dir.display(),
            "Starting pipeline"
        );

        self.step(&mut report, Stage::Init, self.init()).await?;

        let location = if self.context.isolated {
            let location = self
                .step(&mut report, Stage::EnvSetup, self.env_setup())
                .await?;

            let (runtime, verdict) = self
                .step(&mut report, Stage::CacheCheck, self.cache_check(&location))
                .await?;
            report.runtime = Some(runtime);
            report.cache = Some(verdict);

            let remote = self
                .step(&mut report, Stage::RemoteConfig, self.remote_config())
                .await?;
            report.remote = remote;
            Some(location)
        } else {
            info!("Not running isolated, skipping environment stages");
            for stage in Stage::ALL.into_iter().filter(Stage::requires_isolation) {
                self.skip(&mut report, stage);
            }
            if self.context.ci_runner {
                self.detect_profile().await;
            }
            None
        };

        if last == Stage::RemoteConfig {
            return Ok(report);
        }

        let home = location.as_ref().map(|l| l.home.as_path());
        let export = self
            .step(&mut report, Stage::Configure, self.configure(home))
            .await?;
        report.export = export;

        let artifact = self
            .step(&mut report, Stage::Build, self.compile(home))
            .await?;
        report.artifact = Some(artifact.clone());

        let stub = self
            .step(&mut report, Stage::StubGen, self.stub_gen(&artifact))
            .await?;

        let runtime = report.runtime.clone();
        let (layout, receipt) = self
            .step(
                &mut report,
                Stage::Package,
                self.package(&artifact, &stub, runtime),
            )
            .await?;
        report.package = Some(layout);
        report.receipt = Some(receipt);

        info!("Pipeline finished");
        if let Some(observer) = &self.observer {
            observer.stage_finished(Stage::Done);
        }
        Ok(report)
    }

    async fn step<T, F>(
        &self,
        report: &mut PipelineReport,
        stage: Stage,
        work: F,
    ) -> NativepackResult<T>
    where
        F: Future<Output = NativepackResult<T>>,
    {
        debug!(stage = %stage, "Entering stage");
        if let Some(observer) = &self.observer {
            observer.stage_started(stage);
        }
        match work.await {
            Ok(value) => {
                report.stages.push((stage, StageOutcome::Completed));
                if let Some(observer) = &self.observer {
                    observer.stage_finished(stage);
                }
                Ok(value)
            }
            Err(e) => {
                debug!(stage = %stage, "Stage failed: {}", e);
                if let Some(observer) = &self.observer {
                    observer.stage_failed(stage, &e);
                }
                Err(e.in_stage(stage))
            }
        }
    }

    fn skip(&self, report: &mut PipelineReport, stage: Stage) {
        report.stages.push((stage, StageOutcome::Skipped));
        if let Some(observer) = &self.observer {
            observer.stage_skipped(stage);
        }
    }

    async fn init(&self) -> NativepackResult<()> {
        if !self.build.source_dir.is_dir() {
            return Err(NativepackError::MissingSetting {
                name: "source directory".to_string(),
                hint: format!("{} is not a directory", self.build.source_dir.display()),
            });
        }
        Ok(())
    }

    /// Pin the translated cache home and locate the identity record
    async fn env_setup(&self) -> NativepackResult<CacheLocation> {
        let home = self
            .context
            .container_home()
            .ok_or_else(|| NativepackError::MissingSetting {
                name: HOME_VAR.to_string(),
                hint: "Set CONAN_HOME or pass --conan-home".to_string(),
            })?;
        self.manager.use_home(&home);
        info!("{} is {}", HOME_VAR, home.display());

        let record = record_location(&self.context)?;
        debug!("Cache record at {}", record.display());

        self.detect_profile().await;

        Ok(CacheLocation { home, record })
    }

    /// CI runners start without a default profile; failure is not fatal
    async fn detect_profile(&self) {
        if let Err(e) = self.manager.detect_profile().await {
            warn!("Default profile detection failed: {}", e);
        }
    }

    async fn cache_check(
        &self,
        location: &CacheLocation,
    ) -> NativepackResult<(RuntimeIdentity, CacheVerdict)> {
        let live = self.probe.detect().await;
        info!("Host runtime: {}", live);
        let verdict = validate(&location.record, &live, self.manager.as_ref()).await?;
        Ok((live, verdict))
    }

    async fn remote_config(&self) -> NativepackResult<Option<RemoteAction>> {
        let remote = &self.settings.remote;
        let configurator = RemoteConfigurator::new(self.manager.as_ref())
            .reconcile_location(remote.reconcile_location);

        configurator.remove_if_present(&remote.default_remote).await;

        let Some(location) = self.context.container_remote_clone() else {
            warn!(
                "No clone path for {} configured, leaving remotes as they are",
                remote.fallback_name
            );
            return Ok(None);
        };
        let kind = parse_kind(&remote.fallback_kind)?;
        let action = configurator
            .ensure(&remote.fallback_name, &location.display().to_string(), kind)
            .await?;
        Ok(Some(action))
    }

    fn toolchain<'a>(&'a self, home: Option<&Path>) -> Toolchain<'a> {
        let toolchain = Toolchain::new(self.runner.as_ref(), &self.build);
        match home {
            Some(home) => toolchain.with_env(HOME_VAR, home.display().to_string()),
            None => toolchain,
        }
    }

    async fn configure(&self, home: Option<&Path>) -> NativepackResult<Option<ExportSummary>> {
        let export = self.export_dependencies().await?;
        let version = read_version(&self.build.source_dir, &self.build.version_file).await;
        self.toolchain(home).configure(version.as_deref()).await?;
        Ok(export)
    }

    /// Export local recipes listed in the manifest, when there is one
    async fn export_dependencies(&self) -> NativepackResult<Option<ExportSummary>> {
        let deps = &self.settings.dependencies;
        let manifest_path = self.build.source_dir.join(&deps.manifest);
        if !manifest_path.is_file() {
            debug!("No manifest at {}, nothing to export", manifest_path.display());
            return Ok(None);
        }
        let manifest = Manifest::load(&manifest_path).await?;
        let summary = export_requirements(
            self.manager.as_ref(),
            &manifest,
            &self.build.source_dir.join(&deps.recipes_dir),
            &deps.export,
        )
        .await;
        if !summary.is_clean() {
            warn!(
                "{} dependency export(s) failed, continuing with the cache as is",
                summary.failed.len()
            );
        }
        Ok(Some(summary))
    }

    async fn compile(&self, home: Option<&Path>) -> NativepackResult<PathBuf> {
        let artifact = self.toolchain(home).build().await?;
        info!("Built {}", artifact.display());
        Ok(artifact)
    }

    async fn stub_gen(&self, artifact: &Path) -> NativepackResult<PathBuf> {
        let stubs = &self.settings.stubs;
        StubEmitter::new(
            self.runner.clone(),
            &self.build.interpreter,
            &stubs.generator,
            &stubs.extension,
        )
        .generate(artifact, &self.build.build_dir)
        .await
    }

    async fn package(
        &self,
        artifact: &Path,
        stub: &Path,
        runtime: Option<RuntimeIdentity>,
    ) -> NativepackResult<(PackageLayout, PathBuf)> {
        let layout = PackageLayout::assemble(
            artifact,
            stub,
            &self.build.package_dir(),
            &self.settings.stubs.entry_point,
        )
        .await?;
        let receipt = BuildReceipt::for_layout(&layout, self.build.build_type, runtime)
            .await?
            .write(&self.build.build_dir)
            .await?;
        Ok((layout, receipt))
    }
}
