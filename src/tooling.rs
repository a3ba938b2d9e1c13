//! Tooling & Integration Layer
//!
//! CLI surface over the codec: decompose, recompose, and the pre-run hook.

pub mod cli;
pub mod format;

pub use cli::{Cli, CliContext, CommandOutput, Commands};
