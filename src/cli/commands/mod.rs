//! CLI command implementations

pub mod build;
pub mod cache;
pub mod completions;
pub mod config;
pub mod export;
pub mod probe;
pub mod requirements;

pub use build::{execute as build, prepare};
pub use cache::execute as cache;
pub use completions::execute as completions;
pub use config::execute as config;
pub use export::execute as export;
pub use probe::execute as probe;
pub use requirements::execute as requirements;

use crate::deps::{Conan, DependencyManager};
use crate::exec::{CommandRunner, ProcessRunner};
use crate::host::ExecutionContext;
use std::sync::Arc;

/// Runner for real external processes
fn process_runner() -> Arc<dyn CommandRunner> {
    Arc::new(ProcessRunner::new())
}

/// Dependency manager pinned to the context's cache home, when there is one
fn dependency_manager(
    program: String,
    runner: Arc<dyn CommandRunner>,
    context: &ExecutionContext,
) -> Conan {
    let conan = Conan::new(program, runner);
    if let Some(home) = context.container_home() {
        conan.use_home(&home);
    }
    conan
}
