//! Configuration Module
//!
//! Loads and validates configuration from TOML files and resolves the
//! effective mode/profile against CLI and environment overrides.

pub mod loader;
pub mod selection;

pub use loader::{
    Config, ConfigError, LoggingSection, TradingSection, load_config,
};
pub use selection::{
    Selection, SelectionOverrides, SelectionSource, resolve_selection, MODE_ENV, PROFILE_ENV,
};
