//! Ranking Parameters
//!
//! Window timing, release size, and leader-skip thresholds for the buffer.

use serde::{Deserialize, Serialize};

/// Composite rank weights. Momentum dominates (60%), volume confirms (25%),
/// score is a quality tiebreak (15%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankWeights {
    pub momentum_1h: f64,
    pub momentum_15m: f64,
    pub volume_spike: f64,
    pub raw_score: f64,
}

impl Default for RankWeights {
    fn default() -> Self {
        Self {
            momentum_1h: 0.4,
            momentum_15m: 0.2,
            volume_spike: 0.25,
            raw_score: 0.15,
        }
    }
}

impl RankWeights {
    /// `0.4·|m1h| + 0.2·|m15m| + 0.25·(vol − 1) + 0.15·(score/100)`
    pub fn combined_rank(&self, momentum_1h: f64, momentum_15m: f64, volume_spike: f64, raw_score: i32) -> f64 {
        self.momentum_1h * momentum_1h.abs()
            + self.momentum_15m * momentum_15m.abs()
            + self.volume_spike * (volume_spike - 1.0)
            + self.raw_score * (f64::from(raw_score) / 100.0)
    }
}

/// Buffer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RankingConfig {
    /// Seconds to collect signals before releasing a window
    pub window_seconds: u64,
    /// Buffer size that releases a window early
    pub size_trigger: usize,
    /// Default number of signals released per window
    pub max_count: usize,
    /// Max new positions opened from one window
    pub max_new_positions: usize,
    /// Leader momentum (%) above which weaker candidates are skipped
    pub leader_momentum_trigger: f64,
    /// Candidates below this fraction of the leader are skipped
    pub leader_ratio: f64,
    #[serde(skip)]
    pub weights: RankWeights,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            window_seconds: 30,
            size_trigger: 20,
            max_count: 10,
            max_new_positions: 3,
            leader_momentum_trigger: 5.0,
            leader_ratio: 0.5,
            weights: RankWeights::default(),
        }
    }
}

impl RankingConfig {
    pub fn with_window_seconds(mut self, secs: u64) -> Self {
        self.window_seconds = secs;
        self
    }

    pub fn with_size_trigger(mut self, size: usize) -> Self {
        self.size_trigger = size;
        self
    }

    pub fn validate(&self) -> Result<(), RankingConfigError> {
        if self.window_seconds == 0 {
            return Err(RankingConfigError::InvalidWindow(self.window_seconds));
        }
        if self.size_trigger == 0 {
            return Err(RankingConfigError::InvalidSizeTrigger(self.size_trigger));
        }
        if !self.leader_momentum_trigger.is_finite() || self.leader_momentum_trigger < 0.0 {
            return Err(RankingConfigError::InvalidLeaderTrigger(self.leader_momentum_trigger));
        }
        if !(0.0..=1.0).contains(&self.leader_ratio) {
            return Err(RankingConfigError::InvalidLeaderRatio(self.leader_ratio));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum RankingConfigError {
    #[error("Invalid window: {0}s (must be > 0)")]
    InvalidWindow(u64),
    #[error("Invalid size trigger: {0} (must be > 0)")]
    InvalidSizeTrigger(usize),
    #[error("Invalid leader momentum trigger: {0} (must be finite and >= 0)")]
    InvalidLeaderTrigger(f64),
    #[error("Invalid leader ratio: {0} (must be 0-1)")]
    InvalidLeaderRatio(f64),
}
