//! Command-line interface for scanlink
//!
//! Argument parsing lives in [`commands`]; [`Output`] keeps terminal formatting consistent
//! across commands.

pub mod commands;
pub mod output;

pub use commands::Cli;
pub use output::Output;
