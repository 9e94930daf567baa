//! Trading Settings
//!
//! The mutable configuration record read by the admission layer. Profiles
//! override a subset of its numeric thresholds through [`SettingField`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Execution path: simulated fills or real orders
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradingMode {
    #[default]
    Paper,
    Live,
}

impl TradingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradingMode::Paper => "paper",
            TradingMode::Live => "live",
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, TradingMode::Live)
    }
}

impl fmt::Display for TradingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown trading mode '{0}' (expected 'paper' or 'live')")]
pub struct ParseModeError(pub String);

impl FromStr for TradingMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "paper" => Ok(TradingMode::Paper),
            "live" => Ok(TradingMode::Live),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}

/// Every numeric field on [`TradingSettings`] addressable by name.
///
/// This is a superset of the profile allow-list: fields such as
/// `max_trade_usd` exist here but may never be overridden by a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SettingField {
    EntryScoreMin,
    MinRrRatio,
    SpreadMaxBps,
    FixedStopPct,
    Tp1Pct,
    Tp2Pct,
    MlMinConfidence,
    MlBoostScale,
    PaperStartBalanceUsd,
    MaxTradeUsd,
    DailyMaxLossUsd,
    PortfolioMaxExposurePct,
}

impl SettingField {
    pub const ALL: [SettingField; 12] = [
        SettingField::EntryScoreMin,
        SettingField::MinRrRatio,
        SettingField::SpreadMaxBps,
        SettingField::FixedStopPct,
        SettingField::Tp1Pct,
        SettingField::Tp2Pct,
        SettingField::MlMinConfidence,
        SettingField::MlBoostScale,
        SettingField::PaperStartBalanceUsd,
        SettingField::MaxTradeUsd,
        SettingField::DailyMaxLossUsd,
        SettingField::PortfolioMaxExposurePct,
    ];

    /// Configuration key as written in profiles and config files
    pub fn name(&self) -> &'static str {
        match self {
            SettingField::EntryScoreMin => "entry_score_min",
            SettingField::MinRrRatio => "min_rr_ratio",
            SettingField::SpreadMaxBps => "spread_max_bps",
            SettingField::FixedStopPct => "fixed_stop_pct",
            SettingField::Tp1Pct => "tp1_pct",
            SettingField::Tp2Pct => "tp2_pct",
            SettingField::MlMinConfidence => "ml_min_confidence",
            SettingField::MlBoostScale => "ml_boost_scale",
            SettingField::PaperStartBalanceUsd => "paper_start_balance_usd",
            SettingField::MaxTradeUsd => "max_trade_usd",
            SettingField::DailyMaxLossUsd => "daily_max_loss_usd",
            SettingField::PortfolioMaxExposurePct => "portfolio_max_exposure_pct",
        }
    }

    /// Look up a field by its configuration key
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.name() == name)
    }
}

impl fmt::Display for SettingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Gate thresholds and execution mode for one trading session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TradingSettings {
    /// Paper or live execution
    #[serde(skip_deserializing)]
    pub mode: TradingMode,
    /// Profile last applied, for observability only
    #[serde(skip_deserializing)]
    pub active_profile: Option<String>,

    /// Minimum entry score to admit a signal
    pub entry_score_min: f64,
    /// Minimum reward:risk (tp1_pct / fixed_stop_pct)
    pub min_rr_ratio: f64,
    /// Maximum bid/ask spread in basis points
    pub spread_max_bps: f64,
    /// Stop distance as a fraction of entry (0.035 = 3.5%)
    pub fixed_stop_pct: f64,
    /// First take-profit as a fraction of entry
    pub tp1_pct: f64,
    /// Second take-profit as a fraction of entry
    pub tp2_pct: f64,
    /// ML confidence floor (0.0 disables the gate)
    pub ml_min_confidence: f64,
    /// Score points added per unit of ML confidence
    pub ml_boost_scale: f64,
    /// Starting cash for paper sessions
    pub paper_start_balance_usd: f64,

    pub max_trade_usd: f64,
    pub daily_max_loss_usd: f64,
    pub portfolio_max_exposure_pct: f64,
    /// Concurrent open positions allowed
    pub max_positions: usize,
}

impl Default for TradingSettings {
    fn default() -> Self {
        Self {
            mode: TradingMode::Paper,
            active_profile: None,
            entry_score_min: 70.0,
            min_rr_ratio: 1.5,
            spread_max_bps: 25.0,
            fixed_stop_pct: 0.035,
            tp1_pct: 0.07,
            tp2_pct: 0.10,
            ml_min_confidence: 0.55,
            ml_boost_scale: 10.0,
            paper_start_balance_usd: 1000.0,
            max_trade_usd: 15.0,
            daily_max_loss_usd: 25.0,
            portfolio_max_exposure_pct: 0.70,
            max_positions: 10,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SettingsError {
    #[error("{field} must be a finite non-negative number, got {value}")]
    InvalidThreshold { field: SettingField, value: f64 },
    #[error("{field} must be within {min}..={max}, got {value}")]
    OutOfRange {
        field: SettingField,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("max_positions must be > 0")]
    NoPositionSlots,
}

impl TradingSettings {
    /// Create settings for the given mode with default thresholds
    pub fn for_mode(mode: TradingMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn get(&self, field: SettingField) -> f64 {
        match field {
            SettingField::EntryScoreMin => self.entry_score_min,
            SettingField::MinRrRatio => self.min_rr_ratio,
            SettingField::SpreadMaxBps => self.spread_max_bps,
            SettingField::FixedStopPct => self.fixed_stop_pct,
            SettingField::Tp1Pct => self.tp1_pct,
            SettingField::Tp2Pct => self.tp2_pct,
            SettingField::MlMinConfidence => self.ml_min_confidence,
            SettingField::MlBoostScale => self.ml_boost_scale,
            SettingField::PaperStartBalanceUsd => self.paper_start_balance_usd,
            SettingField::MaxTradeUsd => self.max_trade_usd,
            SettingField::DailyMaxLossUsd => self.daily_max_loss_usd,
            SettingField::PortfolioMaxExposurePct => self.portfolio_max_exposure_pct,
        }
    }

    pub fn set(&mut self, field: SettingField, value: f64) {
        let slot = match field {
            SettingField::EntryScoreMin => &mut self.entry_score_min,
            SettingField::MinRrRatio => &mut self.min_rr_ratio,
            SettingField::SpreadMaxBps => &mut self.spread_max_bps,
            SettingField::FixedStopPct => &mut self.fixed_stop_pct,
            SettingField::Tp1Pct => &mut self.tp1_pct,
            SettingField::Tp2Pct => &mut self.tp2_pct,
            SettingField::MlMinConfidence => &mut self.ml_min_confidence,
            SettingField::MlBoostScale => &mut self.ml_boost_scale,
            SettingField::PaperStartBalanceUsd => &mut self.paper_start_balance_usd,
            SettingField::MaxTradeUsd => &mut self.max_trade_usd,
            SettingField::DailyMaxLossUsd => &mut self.daily_max_loss_usd,
            SettingField::PortfolioMaxExposurePct => &mut self.portfolio_max_exposure_pct,
        };
        *slot = value;
    }

    /// Reward:risk implied by the current stop and first target
    pub fn implied_rr_ratio(&self) -> f64 {
        if self.fixed_stop_pct <= 0.0 {
            return 0.0;
        }
        self.tp1_pct / self.fixed_stop_pct
    }

    /// Validate threshold values
    pub fn validate(&self) -> Result<(), SettingsError> {
        for field in SettingField::ALL {
            let value = self.get(field);
            if !value.is_finite() || value < 0.0 {
                return Err(SettingsError::InvalidThreshold { field, value });
            }
        }

        let unit_fields = [
            SettingField::MlMinConfidence,
            SettingField::PortfolioMaxExposurePct,
        ];
        for field in unit_fields {
            let value = self.get(field);
            if value > 1.0 {
                return Err(SettingsError::OutOfRange {
                    field,
                    value,
                    min: 0.0,
                    max: 1.0,
                });
            }
        }

        // Stops and targets are fractions, a value of 4.0 almost certainly meant 4%
        let pct_fields = [
            SettingField::FixedStopPct,
            SettingField::Tp1Pct,
            SettingField::Tp2Pct,
        ];
        for field in pct_fields {
            let value = self.get(field);
            if value <= 0.0 || value >= 1.0 {
                return Err(SettingsError::OutOfRange {
                    field,
                    value,
                    min: 0.0,
                    max: 1.0,
                });
            }
        }

        if self.max_positions == 0 {
            return Err(SettingsError::NoPositionSlots);
        }

        Ok(())
    }
}
