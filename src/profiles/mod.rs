//! Profiles - Mode-safe threshold bundles
//!
//! PROFILES control trading thresholds (what quality of setups to take).
//! MODE (paper/live) controls the execution path (simulated vs real orders).
//!
//! - `registry`: Built-in profile table, aliases and the override allow-list
//! - `gate`: Validate-then-apply of a profile onto `TradingSettings`

pub mod registry;
pub mod gate;

pub use registry::{
    Profile, ProfileRegistry, ALLOWED_PROFILE_KEYS, TEST_PROFILES,
    PAPER_DEFAULT_PROFILE, LIVE_DEFAULT_PROFILE,
};
pub use gate::{ProfileGate, ProfileError, ResolvedProfile, default_profile_for_mode};
