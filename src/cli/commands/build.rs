//! Build and prepare commands - run the pipeline

use super::process_runner;
use crate::build::{BuildConfig, BuildOverrides, Pipeline, PipelineReport};
use crate::cli::args::{BuildArgs, EnvArgs, PrepareArgs};
use crate::config::Config;
use crate::deps::Conan;
use crate::error::NativepackResult;
use crate::host::HostProbe;
use crate::ui::{self, StageProgress, UiContext};
use std::sync::Arc;

/// Execute the build command
pub async fn execute(args: BuildArgs, config: &Config) -> NativepackResult<()> {
    let ctx = UiContext::detect();
    let pipeline = pipeline(&args.env, args.overrides(), config, &ctx);

    let report = pipeline.run().await?;
    print_environment(&ctx, &report);

    if let Some(layout) = &report.package {
        ui::section(&ctx, "Package");
        ui::key_value(&ctx, "Artifact", &layout.artifact.display().to_string());
        ui::key_value(&ctx, "Stub", &layout.stub.display().to_string());
    }
    if let Some(receipt) = &report.receipt {
        ui::key_value(&ctx, "Receipt", &receipt.display().to_string());
    }
    ui::outro_success(
        &ctx,
        &format!(
            "Built {} ({})",
            pipeline.build_config().package,
            pipeline.build_config().build_type
        ),
    );
    Ok(())
}

/// Execute the prepare command
pub async fn prepare(args: PrepareArgs, config: &Config) -> NativepackResult<()> {
    let ctx = UiContext::detect();
    let overrides = BuildOverrides {
        source_dir: args.project.source.clone(),
        manager_cmd: args.env.conan_cmd.clone(),
        ..BuildOverrides::default()
    };

    let report = pipeline(&args.env, overrides, config, &ctx).prepare().await?;
    print_environment(&ctx, &report);
    ui::outro_success(&ctx, "Environment prepared");
    Ok(())
}

fn pipeline(env: &EnvArgs, overrides: BuildOverrides, config: &Config, ctx: &UiContext) -> Pipeline {
    let build = BuildConfig::assemble(config, overrides);
    let runner = process_runner();
    let manager = Arc::new(Conan::new(build.manager_cmd.clone(), runner.clone()));
    let probe = Arc::new(HostProbe::new(runner.clone(), Some(build.interpreter.clone())));

    Pipeline::new(
        build,
        config.clone(),
        env.context(config),
        runner,
        manager,
        probe,
    )
    .with_observer(Arc::new(StageProgress::new(ctx)))
}

fn print_environment(ctx: &UiContext, report: &PipelineReport) {
    if report.cache.is_none() && report.remote.is_none() {
        return;
    }
    ui::section(ctx, "Environment");
    if let Some(runtime) = &report.runtime {
        ui::key_value(ctx, "C runtime", &runtime.to_string());
    }
    if let Some(verdict) = &report.cache {
        ui::key_value_status(ctx, "Dependency cache", &verdict.to_string(), !verdict.purged());
    }
    if let Some(action) = &report.remote {
        ui::key_value(ctx, "Fallback remote", &format!("{:?}", action).to_lowercase());
    }
}
