//! Export command - export local recipes into the dependency cache

use super::{dependency_manager, process_runner};
use crate::cli::args::ExportArgs;
use crate::config::Config;
use crate::deps::{export_requirements, Manifest};
use crate::error::{NativepackError, NativepackResult};
use crate::ui::{self, UiContext};

/// Execute the export command
///
/// Every selected dependency is attempted; the command fails afterwards if
/// any export failed.
pub async fn execute(args: ExportArgs, config: &Config) -> NativepackResult<()> {
    let ctx = UiContext::detect();
    let deps = &config.dependencies;
    let source = &args.project.source;

    let manifest_path = source.join(args.manifest.as_ref().unwrap_or(&deps.manifest));
    let recipes_dir = source.join(args.recipes_dir.as_ref().unwrap_or(&deps.recipes_dir));
    let selection = if args.names.is_empty() {
        deps.export.clone()
    } else {
        args.names.clone()
    };

    let manifest = Manifest::load(&manifest_path).await?;
    let context = args.env.context(config);
    let conan = dependency_manager(args.env.manager_cmd(config), process_runner(), &context);

    let summary = export_requirements(&conan, &manifest, &recipes_dir, &selection).await;

    ui::section(&ctx, "Export");
    for requirement in &summary.exported {
        ui::step_ok(&ctx, &requirement.to_string());
    }
    for name in &summary.skipped {
        ui::step_skipped(&ctx, &format!("{} (no version or recipe)", name));
    }
    for requirement in &summary.failed {
        ui::step_error(&ctx, &requirement.to_string());
    }

    if !summary.is_clean() {
        return Err(NativepackError::ExportFailed {
            failed: summary.failed.len(),
        });
    }
    ui::outro_success(
        &ctx,
        &format!("Exported {} dependencies", summary.exported.len()),
    );
    Ok(())
}
