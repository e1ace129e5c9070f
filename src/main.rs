//! nativepack - native extension build orchestrator
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use nativepack::cli::args::LogFormat;
use nativepack::cli::{commands, Cli, Commands};
use nativepack::config::{Config, ConfigManager};
use nativepack::error::NativepackResult;
use std::path::Path;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(stage) = e.failed_stage() {
                eprintln!("{} {}", style("FAILED at").red().bold(), stage);
            }
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> NativepackResult<()> {
    let cli = Cli::parse();

    // Completions don't need config or logging
    if let Commands::Completions(args) = &cli.command {
        return commands::completions(args);
    }

    let source = cli.command.source_dir().unwrap_or(Path::new("."));
    let config_manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::discover(source),
    };
    let config = config_manager.load().await?;

    init_tracing(&cli, &config);
    debug!("Using config {}", config_manager.path().display());

    match cli.command {
        Commands::Build(args) => commands::build(args, &config).await,
        Commands::Prepare(args) => commands::prepare(args, &config).await,
        Commands::Probe(args) => commands::probe(args, &config).await,
        Commands::Cache(args) => commands::cache(args, &config).await,
        Commands::Requirements(args) => commands::requirements(args, &config).await,
        Commands::Export(args) => commands::export(args, &config).await,
        Commands::Config(args) => commands::config(args, &config, &config_manager).await,
        Commands::Completions(_) => unreachable!("Completions handled above"),
    }
}

/// Logging: 0 = warn, 1 = info, 2+ = debug; `NATIVEPACK_LOG` overrides
fn init_tracing(cli: &Cli, config: &Config) {
    let filter = EnvFilter::try_from_env("NATIVEPACK_LOG").unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("nativepack=warn"),
        1 => EnvFilter::new("nativepack=info"),
        _ => EnvFilter::new("nativepack=debug"),
    });

    let json = match cli.log_format {
        Some(format) => format == LogFormat::Json,
        None => config.general.log_format.eq_ignore_ascii_case("json"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
