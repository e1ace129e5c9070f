//! nativepack - build orchestrator for native extension modules
//!
//! Keeps a shared dependency cache consistent with the host C runtime,
//! configures dependency remotes, and drives the native toolchain through
//! configure, build, stub generation and packaging.

pub mod build;
pub mod cache;
pub mod cli;
pub mod config;
pub mod deps;
pub mod error;
pub mod exec;
pub mod host;
pub mod ui;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{NativepackError, NativepackResult};
