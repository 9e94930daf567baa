//! Admission Session
//!
//! Owns one trading session's settings, profile gate and ranking buffer.
//! Built explicitly by the control loop and dropped with it; there is no
//! process-wide instance.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::domain::{Candidate, RankedSignal, SettingsError, TradingMode, TradingSettings};
use crate::ports::{Clock, SystemClock};
use crate::profiles::{ProfileError, ProfileGate};
use crate::ranking::{RankingConfig, WindowedRankingBuffer};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error("Profile '{profile}' produced invalid settings: {source}")]
    InvalidSettings {
        profile: String,
        #[source]
        source: SettingsError,
    },
}

/// What happened to an offered candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OfferOutcome {
    /// Added to the window with this combined rank
    Buffered(f64),
    /// Dropped: a much stronger mover is already in the window
    Skipped,
}

/// Fields forwarded to trade analytics for an admitted signal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdmissionRecord {
    pub symbol: String,
    pub strategy_id: String,
    pub raw_score: i32,
    pub combined_rank: f64,
    pub momentum_1h: f64,
    pub momentum_15m: f64,
    pub volume_spike: f64,
    /// 1-based position in the released window
    pub rank_position: usize,
    pub profile: Option<String>,
    pub mode: TradingMode,
    pub admitted_at: DateTime<Utc>,
}

/// A signal cleared for execution, with its upstream payload
#[derive(Debug, Clone, PartialEq)]
pub struct Admission<P> {
    pub record: AdmissionRecord,
    pub payload: P,
}

/// Per-session admission pipeline
#[derive(Debug)]
pub struct AdmissionSession<P, C = SystemClock> {
    settings: TradingSettings,
    gate: ProfileGate,
    buffer: WindowedRankingBuffer<P, C>,
}

impl<P> AdmissionSession<P, SystemClock> {
    pub fn new(settings: TradingSettings, gate: ProfileGate, ranking: RankingConfig) -> Self {
        Self::with_clock(settings, gate, ranking, SystemClock)
    }
}

impl<P, C: Clock> AdmissionSession<P, C> {
    pub fn with_clock(settings: TradingSettings, gate: ProfileGate, ranking: RankingConfig, clock: C) -> Self {
        Self {
            settings,
            gate,
            buffer: WindowedRankingBuffer::with_clock(ranking, clock),
        }
    }

    pub fn settings(&self) -> &TradingSettings {
        &self.settings
    }

    pub fn mode(&self) -> TradingMode {
        self.settings.mode
    }

    pub fn buffer(&self) -> &WindowedRankingBuffer<P, C> {
        &self.buffer
    }

    /// Switch to profile `name`. On any error the current settings are kept.
    pub fn configure(&mut self, name: &str) -> Result<(), SessionError> {
        if !self.buffer.is_empty() {
            tracing::warn!(
                "Reconfiguring with {} signals pending - they will be admitted under the new thresholds",
                self.buffer.len()
            );
        }

        let mut next = self.settings.clone();
        self.gate.apply(name, &mut next)?;
        next.validate().map_err(|source| SessionError::InvalidSettings {
            profile: next.active_profile.clone().unwrap_or_default(),
            source,
        })?;

        self.settings = next;
        Ok(())
    }

    /// Buffer a candidate unless a much stronger mover already leads the window
    pub fn offer(&mut self, candidate: Candidate<P>) -> OfferOutcome {
        let momentum_1h = candidate.features.momentum_1h();
        if self.buffer.should_skip(&candidate.symbol, momentum_1h) {
            return OfferOutcome::Skipped;
        }
        OfferOutcome::Buffered(self.buffer.ingest(candidate).combined_rank())
    }

    /// Poll the window and admit what fits into free position slots
    pub fn next_batch(&mut self, open_positions: &HashSet<String>) -> Vec<Admission<P>> {
        let max_count = self.buffer.config().max_count;
        let ranked = self.buffer.poll(max_count);
        self.admit(ranked, open_positions)
    }

    /// Flush regardless of timing (shutdown, end of replay)
    pub fn drain(&mut self, open_positions: &HashSet<String>) -> Vec<Admission<P>> {
        let ranked = self.buffer.force_flush();
        self.admit(ranked, open_positions)
    }

    fn admit(&self, ranked: Vec<RankedSignal<P>>, open_positions: &HashSet<String>) -> Vec<Admission<P>> {
        if ranked.is_empty() {
            return Vec::new();
        }

        for (i, rs) in ranked.iter().take(5).enumerate() {
            tracing::info!("#{}: {}", i + 1, rs);
        }

        let available_slots = self.settings.max_positions.saturating_sub(open_positions.len());
        let max_new = self.buffer.config().max_new_positions;
        let to_open = available_slots.min(max_new);
        if to_open == 0 {
            tracing::warn!(
                "No slots available (have {}/{} positions) - dropping {} ranked signals",
                open_positions.len(),
                self.settings.max_positions,
                ranked.len()
            );
            return Vec::new();
        }

        let admitted_at = self.buffer.clock().now();
        let mut taken: HashSet<String> = HashSet::new();
        let mut admissions = Vec::with_capacity(to_open);

        for (idx, rs) in ranked.into_iter().enumerate() {
            if admissions.len() >= to_open {
                break;
            }
            if open_positions.contains(rs.symbol()) {
                tracing::debug!("Skipping {} - already have position", rs.symbol());
                continue;
            }
            if !taken.insert(rs.symbol().to_string()) {
                tracing::debug!("Skipping {} - already admitted this window", rs.symbol());
                continue;
            }

            let record = AdmissionRecord {
                symbol: rs.symbol().to_string(),
                strategy_id: rs.strategy_id().to_string(),
                raw_score: rs.raw_score(),
                combined_rank: rs.combined_rank(),
                momentum_1h: rs.momentum_1h(),
                momentum_15m: rs.momentum_15m(),
                volume_spike: rs.volume_spike(),
                rank_position: idx + 1,
                profile: self.settings.active_profile.clone(),
                mode: self.settings.mode,
                admitted_at,
            };
            admissions.push(Admission {
                record,
                payload: rs.into_payload(),
            });
        }

        tracing::info!("Admitted {}/{} (slots: {})", admissions.len(), to_open, available_slots);
        admissions
    }
}
