//! Progress indicators with CI fallback

use super::context::UiContext;
use super::output::{step_error, step_skipped};
use crate::build::{Stage, StageObserver};
use crate::error::NativepackError;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// A task spinner with CI fallback
pub struct TaskSpinner {
    spinner: Option<ProgressBar>,
    interactive: bool,
}

impl TaskSpinner {
    /// Create a new spinner (nothing is shown until `start`)
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            interactive: ctx.use_fancy_output(),
        }
    }

    /// Start the spinner with a message
    pub fn start(&mut self, message: &str) {
        if self.interactive {
            let spinner = ProgressBar::new_spinner();
            if let Ok(spinner_style) = ProgressStyle::default_spinner()
                .template("  {spinner:.cyan} {msg}")
            {
                spinner.set_style(spinner_style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
            }
            spinner.set_message(message.to_string());
            spinner.enable_steady_tick(Duration::from_millis(120));
            self.spinner = Some(spinner);
        } else {
            // Plain output for CI
            println!("{} {}", style("...").dim(), message);
        }
    }

    /// Update the spinner message
    pub fn message(&mut self, message: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(message.to_string());
        }
    }

    /// Stop with success message
    pub fn stop(&mut self, message: &str) {
        self.clear();
        if self.interactive {
            println!("  {} {}", style("✓").green(), message);
        } else {
            println!("{} {}", style("[OK]").green(), message);
        }
    }

    /// Stop with error message
    pub fn stop_error(&mut self, message: &str) {
        self.clear();
        if self.interactive {
            println!("  {} {}", style("✗").red(), message);
        } else {
            println!("{} {}", style("[FAIL]").red(), message);
        }
    }

    /// Stop with warning message
    pub fn stop_warn(&mut self, message: &str) {
        self.clear();
        if self.interactive {
            println!("  {} {}", style("!").yellow(), message);
        } else {
            println!("{} {}", style("[WARN]").yellow(), message);
        }
    }

    /// Clear the spinner without any message
    pub fn clear(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

/// Prints one header line per pipeline stage
///
/// No spinner here: toolchain output streams to the terminal while a stage
/// runs and would tear a live progress line.
pub struct StageProgress {
    ctx: UiContext,
}

impl StageProgress {
    pub fn new(ctx: &UiContext) -> Self {
        Self { ctx: ctx.clone() }
    }

    fn position(stage: Stage) -> String {
        match Stage::ALL.iter().position(|s| *s == stage) {
            Some(index) => format!("[{}/{}]", index + 1, Stage::ALL.len()),
            None => String::new(),
        }
    }
}

impl StageObserver for StageProgress {
    fn stage_started(&self, stage: Stage) {
        let header = format!("{} {}", Self::position(stage), stage);
        if self.ctx.use_fancy_output() {
            println!("{}", style(header).cyan().bold());
        } else {
            println!("==> {}", header);
        }
    }

    fn stage_skipped(&self, stage: Stage) {
        step_skipped(
            &self.ctx,
            &format!("{} {} skipped (not isolated)", Self::position(stage), stage),
        );
    }

    fn stage_failed(&self, stage: Stage, error: &NativepackError) {
        step_error(&self.ctx, &format!("{} failed: {}", stage, error));
    }
}
