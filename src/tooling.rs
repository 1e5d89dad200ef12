//! Tooling layer
//!
//! Command-line front end over the workspace orchestrator.

pub mod cli;

pub use cli::{Cli, CliContext, Commands, SettingsCommands};
