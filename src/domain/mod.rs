//! Domain Layer - Core types for signal admission
//!
//! Pure data types with no I/O:
//! - `settings`: The mutable threshold record profiles write into
//! - `signal`: Incoming candidates, their feature snapshot, and ranked output

pub mod settings;
pub mod signal;

pub use settings::{ParseModeError, SettingField, SettingsError, TradingMode, TradingSettings};
pub use signal::{Candidate, RankedSignal, SignalFeatures};
