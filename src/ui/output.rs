//! Output functions for consistent CLI formatting

use super::context::UiContext;
use console::{style, Style};

/// Display a success outro
pub fn outro_success(ctx: &UiContext, message: &str) {
    println!();
    if ctx.use_fancy_output() {
        println!("{} {}", style("✓").green().bold(), style(message).green().bold());
    } else {
        println!("{} {}", style("[OK]").green(), message);
    }
}

/// Display a section header
pub fn section(_ctx: &UiContext, title: &str) {
    println!();
    println!("{}", style(title).bold());
}

/// Display a success step
pub fn step_ok(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        println!("  {} {}", style("✓").green(), message);
    } else {
        println!("  {} {}", style("[OK]").green(), message);
    }
}

/// Display a warning step
pub fn step_warn(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        println!("  {} {}", style("!").yellow(), message);
    } else {
        println!("  {} {}", style("[WARN]").yellow(), message);
    }
}

/// Display an error step
pub fn step_error(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        println!("  {} {}", style("✗").red(), message);
    } else {
        println!("  {} {}", style("[FAIL]").red(), message);
    }
}

/// Display a skipped step
pub fn step_skipped(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        println!("  {} {}", style("-").dim(), style(message).dim());
    } else {
        println!("  {} {}", style("[-]").dim(), message);
    }
}

/// Print styled key-value pair
pub fn key_value(ctx: &UiContext, key: &str, value: &str) {
    if ctx.use_fancy_output() {
        println!("  {}: {}", style(key).dim(), value);
    } else {
        println!("  {}: {}", key, value);
    }
}

/// Print styled key-value with status color
pub fn key_value_status(ctx: &UiContext, key: &str, value: &str, ok: bool) {
    let value_style = if ok {
        Style::new().green()
    } else {
        Style::new().yellow()
    };

    if ctx.use_fancy_output() {
        println!("  {}: {}", style(key).dim(), value_style.apply_to(value));
    } else {
        let prefix = if ok { "[OK]" } else { "[WARN]" };
        println!("  {} {}: {}", prefix, key, value);
    }
}
