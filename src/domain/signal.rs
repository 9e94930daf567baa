use serde::{Deserialize, Serialize};
use std::fmt;

/// Momentum and volume snapshot attached to a candidate.
///
/// Trends are percentage moves over the named lookback (2.5 = +2.5%).
/// Missing or non-finite values are treated as absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalFeatures {
    pub trend_1h: Option<f64>,
    pub trend_15m: Option<f64>,
    pub trend_5m: Option<f64>,
    pub vol_spike_5m: Option<f64>,
}

fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

impl SignalFeatures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trend_1h(mut self, v: f64) -> Self {
        self.trend_1h = Some(v);
        self
    }

    pub fn with_trend_15m(mut self, v: f64) -> Self {
        self.trend_15m = Some(v);
        self
    }

    pub fn with_trend_5m(mut self, v: f64) -> Self {
        self.trend_5m = Some(v);
        self
    }

    pub fn with_vol_spike(mut self, v: f64) -> Self {
        self.vol_spike_5m = Some(v);
        self
    }

    /// 1h move, extrapolated from the 15m trend when the 1h bar is missing.
    /// A trend of `0.0` is a real flat reading and does not fall back.
    pub fn momentum_1h(&self) -> f64 {
        present(self.trend_1h).unwrap_or_else(|| 4.0 * present(self.trend_15m).unwrap_or(0.0))
    }

    /// 15m move, extrapolated from the 5m trend when the 15m bar is missing.
    /// As with `momentum_1h`, `0.0` counts as present.
    pub fn momentum_15m(&self) -> f64 {
        present(self.trend_15m).unwrap_or_else(|| 3.0 * present(self.trend_5m).unwrap_or(0.0))
    }

    /// Volume vs average; 1.0 (no spike) when unknown
    pub fn volume_spike(&self) -> f64 {
        present(self.vol_spike_5m).unwrap_or(1.0)
    }
}

/// A scored candidate from the upstream engine, before ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate<P> {
    pub symbol: String,
    pub strategy_id: String,
    /// Base quality score (0-100)
    pub raw_score: i32,
    #[serde(default)]
    pub features: SignalFeatures,
    /// Opaque upstream signal, handed back untouched
    #[serde(default)]
    pub payload: P,
}

impl<P> Candidate<P> {
    pub fn new(
        symbol: impl Into<String>,
        strategy_id: impl Into<String>,
        raw_score: i32,
        features: SignalFeatures,
        payload: P,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            strategy_id: strategy_id.into(),
            raw_score,
            features,
            payload,
        }
    }
}

/// A candidate with its derived momentum metrics and composite rank.
///
/// Built once at ingestion, never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedSignal<P> {
    symbol: String,
    strategy_id: String,
    raw_score: i32,
    momentum_1h: f64,
    momentum_15m: f64,
    volume_spike: f64,
    combined_rank: f64,
    payload: P,
}

impl<P> RankedSignal<P> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        symbol: String,
        strategy_id: String,
        raw_score: i32,
        momentum_1h: f64,
        momentum_15m: f64,
        volume_spike: f64,
        combined_rank: f64,
        payload: P,
    ) -> Self {
        Self {
            symbol,
            strategy_id,
            raw_score,
            momentum_1h,
            momentum_15m,
            volume_spike,
            combined_rank,
            payload,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn strategy_id(&self) -> &str {
        &self.strategy_id
    }

    pub fn raw_score(&self) -> i32 {
        self.raw_score
    }

    pub fn momentum_1h(&self) -> f64 {
        self.momentum_1h
    }

    pub fn momentum_15m(&self) -> f64 {
        self.momentum_15m
    }

    pub fn volume_spike(&self) -> f64 {
        self.volume_spike
    }

    pub fn combined_rank(&self) -> f64 {
        self.combined_rank
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn into_payload(self) -> P {
        self.payload
    }
}

impl<P> fmt::Display for RankedSignal<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] rank:{:.3} score:{} mom1h:{:+.1}% mom15m:{:+.1}% vol:{:.2}x",
            self.symbol,
            self.strategy_id,
            self.combined_rank,
            self.raw_score,
            self.momentum_1h,
            self.momentum_15m,
            self.volume_spike
        )
    }
}
