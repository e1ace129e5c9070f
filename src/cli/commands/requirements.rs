//! Requirements command - list manifest requirements

use crate::cli::args::{OutputFormat, RequirementsArgs};
use crate::config::Config;
use crate::deps::Manifest;
use crate::error::NativepackResult;
use crate::ui::{self, UiContext};

/// Execute the requirements command
pub async fn execute(args: RequirementsArgs, config: &Config) -> NativepackResult<()> {
    let path = args
        .project
        .source
        .join(args.manifest.as_ref().unwrap_or(&config.dependencies.manifest));
    let manifest = Manifest::load(&path).await?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&manifest)?),
        OutputFormat::Plain => {
            for requirement in &manifest.requirements {
                println!("{}", requirement);
            }
            if !manifest.malformed.is_empty() {
                let ctx = UiContext::detect();
                for line in &manifest.malformed {
                    ui::step_warn(&ctx, &format!("Skipped malformed entry: {}", line));
                }
            }
        }
    }
    Ok(())
}
