//! CLI Adapter
//!
//! Command-line interface for the signal-admission binary.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{CheckCmd, CliApp, Command, OutputFormat, ProfilesCmd, RankCmd, SessionArgs};
