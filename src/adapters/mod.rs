//! Adapters Layer - External System Implementations
//!
//! - CLI: Command-line interface definitions

pub mod cli;

pub use cli::CliApp;
