//! Config command - show configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::NativepackResult;

/// Execute the config command
pub async fn execute(args: ConfigArgs, config: &Config, manager: &ConfigManager) -> NativepackResult<()> {
    match args.action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => print!("{}", ConfigManager::render(config)?),
        ConfigAction::Path => {
            let path = manager.path();
            if path.exists() {
                println!("{}", path.display());
            } else {
                println!("{} (not found, using defaults)", path.display());
            }
        }
    }
    Ok(())
}
