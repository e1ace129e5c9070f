//! Cache command - inspect and validate the dependency cache

use super::{dependency_manager, process_runner};
use crate::cache::{assess, record_location, validate, Assessment, CacheRecord, StoredRecord};
use crate::cli::args::{CacheAction, CacheArgs, EnvArgs, OutputFormat};
use crate::config::Config;
use crate::error::NativepackResult;
use crate::host::{HostProbe, RuntimeIdentity, RuntimeProbe};
use crate::ui::{self, TaskSpinner, UiContext};
use serde::Serialize;
use std::path::PathBuf;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> NativepackResult<()> {
    match args.action {
        CacheAction::Show { env, format, .. } => show(&env, config, format).await,
        CacheAction::Check { env, .. } => check(&env, config).await,
    }
}

async fn live_identity(config: &Config) -> RuntimeIdentity {
    HostProbe::new(process_runner(), Some(config.extension.interpreter.clone()))
        .detect()
        .await
}

#[derive(Serialize)]
struct CacheStatus {
    record: PathBuf,
    recorded: Option<CacheRecord>,
    malformed: Option<String>,
    live: RuntimeIdentity,
    assessment: String,
    purge_needed: bool,
}

/// Compare record and live identity without touching anything
async fn show(env: &EnvArgs, config: &Config, format: OutputFormat) -> NativepackResult<()> {
    let context = env.context(config);
    let record = record_location(&context)?;
    let stored = CacheRecord::read(&record).await?;
    let live = live_identity(config).await;

    let assessment = assess(&stored, &live);
    let (recorded, malformed) = match stored {
        StoredRecord::Present(record) => (Some(record), None),
        StoredRecord::Malformed(detail) => (None, Some(detail)),
        StoredRecord::Missing => (None, None),
    };
    let status = CacheStatus {
        record,
        recorded,
        malformed,
        live,
        purge_needed: matches!(assessment, Assessment::Incompatible(_)),
        assessment: match &assessment {
            Assessment::FirstRun => "no record yet".to_string(),
            Assessment::Compatible => "compatible".to_string(),
            Assessment::Incompatible(reason) => reason.clone(),
            Assessment::LiveUnknown => "runtime unknown".to_string(),
        },
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
        OutputFormat::Plain => {
            let ctx = UiContext::detect();
            ui::section(&ctx, "Dependency cache");
            ui::key_value(&ctx, "Record", &status.record.display().to_string());
            let recorded = match (&status.recorded, &status.malformed) {
                (Some(record), _) => record.to_string(),
                (None, Some(detail)) => format!("malformed ({})", detail),
                (None, None) => "none".to_string(),
            };
            ui::key_value(&ctx, "Recorded", &recorded);
            ui::key_value(&ctx, "Live", &status.live.to_string());
            ui::key_value_status(&ctx, "Verdict", &status.assessment, !status.purge_needed);
        }
    }
    Ok(())
}

/// Run the validator now
async fn check(env: &EnvArgs, config: &Config) -> NativepackResult<()> {
    let ctx = UiContext::detect();
    let context = env.context(config);
    let record = record_location(&context)?;
    let conan = dependency_manager(env.manager_cmd(config), process_runner(), &context);

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start("Detecting C runtime...");
    let live = live_identity(config).await;
    spinner.message("Validating dependency cache...");

    match validate(&record, &live, &conan).await {
        Ok(verdict) if verdict.purged() => spinner.stop_warn(&format!("Cache {}", verdict)),
        Ok(verdict) => spinner.stop(&format!("Cache {} for {}", verdict, live)),
        Err(e) => {
            spinner.stop_error("Cache validation failed");
            return Err(e);
        }
    }
    Ok(())
}
