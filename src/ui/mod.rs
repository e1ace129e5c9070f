//! Terminal output for the CLI
//!
//! Styled with `console`, with plain `[OK]`/`[FAIL]` prefixes when running
//! in CI or without a terminal. Logs go to stderr through `tracing`; these
//! helpers write to stdout.
//!
//! # Example
//!
//! ```rust,ignore
//! use nativepack::ui::{self, UiContext, TaskSpinner};
//!
//! let ctx = UiContext::detect();
//!
//! let mut spinner = TaskSpinner::new(&ctx);
//! spinner.start("Detecting C runtime...");
//! spinner.stop("glibc 2.35");
//!
//! ui::key_value(&ctx, "Record", "/host/home/ci/.conan2/runtime-identity");
//! ```

mod context;
mod output;
mod progress;

pub use context::UiContext;
pub use output::{
    key_value, key_value_status, outro_success, section, step_error, step_ok, step_skipped,
    step_warn,
};
pub use progress::{StageProgress, TaskSpinner};
