//! Ports Layer - Trait definitions for external dependencies
//!
//! Following hexagonal architecture, the ranking core only sees:
//! - A clock for window-boundary decisions

pub mod clock;

pub use clock::{Clock, ManualClock, SystemClock};
#[cfg(test)]
pub use clock::MockClock;
