//! Probe command - print the detected C runtime

use super::process_runner;
use crate::cli::args::{OutputFormat, ProbeArgs};
use crate::config::Config;
use crate::error::NativepackResult;
use crate::host::{HostProbe, RuntimeProbe};

/// Execute the probe command
///
/// Detection never fails; an undetectable runtime prints as `unknown`.
pub async fn execute(args: ProbeArgs, config: &Config) -> NativepackResult<()> {
    let interpreter = args
        .interpreter
        .unwrap_or_else(|| config.extension.interpreter.clone());
    let identity = HostProbe::new(process_runner(), Some(interpreter))
        .detect()
        .await;

    match args.format {
        OutputFormat::Plain => println!("{}", identity),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&identity)?),
    }
    Ok(())
}
