//! Ranking Layer - Momentum-weighted signal prioritization
//!
//! Don't miss the movers: when several candidates fire in the same window,
//! enter the strongest mover first rather than whichever signal arrived first.
//!
//! - `params`: Window/size triggers, leader thresholds, rank weights
//! - `buffer`: `WindowedRankingBuffer` with its leader comparison (`should_skip`)

pub mod params;
pub mod buffer;

pub use params::{RankingConfig, RankingConfigError, RankWeights};
pub use buffer::WindowedRankingBuffer;
