//! Windowed Ranking Buffer
//!
//! Collects concurrently arriving candidates for a window, then releases the
//! best of them by composite rank instead of whichever arrived first.
//!
//! Release rules:
//! - The first `poll` only starts the window timer (cold start). A partial
//!   window at startup never leaks through.
//! - Later polls release once `window_seconds` have elapsed or the buffer
//!   holds `size_trigger` signals, whichever comes first.
//!
//! Not internally synchronized. One evaluation loop owns the buffer; every
//! mutating call takes `&mut self`.

use chrono::{DateTime, Utc};

use super::params::RankingConfig;
use crate::domain::{Candidate, RankedSignal};
use crate::ports::{Clock, SystemClock};

/// Time/size-triggered top-N signal buffer
#[derive(Debug)]
pub struct WindowedRankingBuffer<P, C = SystemClock> {
    config: RankingConfig,
    clock: C,
    buffer: Vec<RankedSignal<P>>,
    last_flush: Option<DateTime<Utc>>,
}

impl<P> WindowedRankingBuffer<P, SystemClock> {
    /// Buffer driven by the wall clock
    pub fn new(config: RankingConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<P> Default for WindowedRankingBuffer<P, SystemClock> {
    fn default() -> Self {
        Self::new(RankingConfig::default())
    }
}

impl<P, C: Clock> WindowedRankingBuffer<P, C> {
    pub fn with_clock(config: RankingConfig, clock: C) -> Self {
        Self {
            config,
            clock,
            buffer: Vec::new(),
            last_flush: None,
        }
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// When the current window started; `None` before the first poll
    pub fn last_flush(&self) -> Option<DateTime<Utc>> {
        self.last_flush
    }

    /// Buffered signals in arrival order
    pub fn pending(&self) -> &[RankedSignal<P>] {
        &self.buffer
    }

    /// Rank a candidate and add it to the current window.
    ///
    /// No dedup and no cap: every ingested candidate stays until the next flush.
    pub fn ingest(&mut self, candidate: Candidate<P>) -> &RankedSignal<P> {
        let Candidate {
            symbol,
            strategy_id,
            raw_score,
            features,
            payload,
        } = candidate;

        let momentum_1h = features.momentum_1h();
        let momentum_15m = features.momentum_15m();
        let volume_spike = features.volume_spike();
        let combined_rank = self
            .config
            .weights
            .combined_rank(momentum_1h, momentum_15m, volume_spike, raw_score);

        tracing::debug!(
            "Buffered {} (score:{}, rank:{:.3}, mom1h:{:.1}%)",
            symbol,
            raw_score,
            combined_rank,
            momentum_1h
        );

        self.buffer.push(RankedSignal::new(
            symbol,
            strategy_id,
            raw_score,
            momentum_1h,
            momentum_15m,
            volume_spike,
            combined_rank,
            payload,
        ));
        let last = self.buffer.len() - 1;
        &self.buffer[last]
    }

    /// Release up to `max_count` best signals if the window boundary has been reached.
    ///
    /// Returns an empty vec on cold start and while still collecting.
    pub fn poll(&mut self, max_count: usize) -> Vec<RankedSignal<P>> {
        let now = self.clock.now();

        let Some(last_flush) = self.last_flush else {
            tracing::debug!("Ranking window opened at {}", now);
            self.last_flush = Some(now);
            return Vec::new();
        };

        if !self.window_elapsed(last_flush, now) && self.buffer.len() < self.config.size_trigger {
            return Vec::new();
        }

        let buffered = self.buffer.len();
        let mut ranked = self.drain_ranked(now);
        ranked.truncate(max_count);

        if buffered > 0 {
            tracing::info!(
                "Window closed: releasing {} of {} signals (top: {})",
                ranked.len(),
                buffered,
                ranked.first().map(|s| s.symbol()).unwrap_or("-")
            );
        }
        ranked
    }

    /// Drain and rank everything now, ignoring window timing
    pub fn force_flush(&mut self) -> Vec<RankedSignal<P>> {
        let now = self.clock.now();
        let ranked = self.drain_ranked(now);
        if !ranked.is_empty() {
            tracing::info!("Forced flush: releasing {} signals", ranked.len());
        }
        ranked
    }

    /// Highest-ranked signal currently buffered
    pub fn leader(&self) -> Option<&RankedSignal<P>> {
        self.buffer
            .iter()
            .reduce(|best, s| if s.combined_rank() > best.combined_rank() { s } else { best })
    }

    /// Strongest absolute 1h move among buffered (not yet released) signals
    pub fn max_momentum_1h(&self) -> Option<f64> {
        self.buffer
            .iter()
            .map(|s| s.momentum_1h().abs())
            .reduce(f64::max)
    }

    /// Whether a candidate is too weak to bother buffering.
    ///
    /// True only when a strong mover (above the leader trigger, 5% by default)
    /// is already in the window and the candidate's 1h momentum is below half
    /// of it.
    pub fn should_skip(&self, symbol: &str, momentum_1h: f64) -> bool {
        let Some(leader) = self.max_momentum_1h() else {
            return false;
        };

        let skip = leader > self.config.leader_momentum_trigger
            && momentum_1h < leader * self.config.leader_ratio;
        if skip {
            tracing::debug!(
                "Skipping {} (mom={:.1}%) - leader at {:.1}%",
                symbol,
                momentum_1h,
                leader
            );
        }
        skip
    }

    fn window_elapsed(&self, since: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let elapsed_ms = now.signed_duration_since(since).num_milliseconds();
        // clock stepped backwards: keep collecting
        if elapsed_ms < 0 {
            return false;
        }
        elapsed_ms as u64 >= self.config.window_seconds.saturating_mul(1000)
    }

    fn drain_ranked(&mut self, now: DateTime<Utc>) -> Vec<RankedSignal<P>> {
        let mut ranked = std::mem::take(&mut self.buffer);
        // stable: equal ranks keep arrival order
        ranked.sort_by(|a, b| b.combined_rank().total_cmp(&a.combined_rank()));
        self.last_flush = Some(now);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SignalFeatures;
    use crate::ports::{ManualClock, MockClock};
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 14, 30, 0).unwrap()
    }

    fn buffer() -> (WindowedRankingBuffer<u32, ManualClock>, ManualClock) {
        let clock = ManualClock::new(start());
        (WindowedRankingBuffer::with_clock(RankingConfig::default(), clock.clone()), clock)
    }

    fn candidate(symbol: &str, m1h: f64, m15m: f64, vol: f64, score: i32) -> Candidate<u32> {
        Candidate::new(
            symbol,
            "momentum_1h",
            score,
            SignalFeatures::new()
                .with_trend_1h(m1h)
                .with_trend_15m(m15m)
                .with_vol_spike(vol),
            0,
        )
    }

    fn symbols<P>(signals: &[RankedSignal<P>]) -> Vec<&str> {
        signals.iter().map(|s| s.symbol()).collect()
    }

    #[test]
    fn test_ranking_dominance() {
        let (mut buf, _) = buffer();
        let a = buf.ingest(candidate("A", 10.0, 5.0, 2.0, 80)).combined_rank();
        let b = buf.ingest(candidate("B", 3.0, 1.0, 1.0, 90)).combined_rank();

        assert!(a > b);
        assert_relative_eq!(a, 5.37, epsilon = 1e-9);
        assert_relative_eq!(b, 1.535, epsilon = 1e-9);
    }

    #[test]
    fn test_ingest_derives_metrics_from_fallbacks() {
        let (mut buf, _) = buffer();
        let features = SignalFeatures::new().with_trend_15m(1.0).with_trend_5m(0.5);
        let ranked = buf.ingest(Candidate::new("ETH-USD", "vwap_reclaim", 70, features, 7));

        assert_relative_eq!(ranked.momentum_1h(), 4.0);
        assert_relative_eq!(ranked.momentum_15m(), 1.0);
        assert_relative_eq!(ranked.volume_spike(), 1.0);
        // 0.4*4 + 0.2*1 + 0 + 0.15*0.7
        assert_relative_eq!(ranked.combined_rank(), 1.905, epsilon = 1e-9);
        assert_eq!(*ranked.payload(), 7);
    }

    #[test]
    fn test_ingest_keeps_duplicates() {
        let (mut buf, _) = buffer();
        buf.ingest(candidate("SOL-USD", 2.0, 1.0, 1.0, 60));
        buf.ingest(candidate("SOL-USD", 3.0, 1.0, 1.0, 60));
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn test_cold_start_returns_empty() {
        let (mut buf, clock) = buffer();
        buf.ingest(candidate("A", 10.0, 5.0, 2.0, 80));

        // even with the window long gone, the first poll only starts the timer
        clock.advance_secs(3600);
        assert!(buf.poll(10).is_empty());
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.last_flush(), Some(start() + Duration::seconds(3600)));
    }

    #[test]
    fn test_poll_waits_for_window() {
        let (mut buf, clock) = buffer();
        assert!(buf.poll(10).is_empty());

        buf.ingest(candidate("A", 1.0, 0.5, 1.0, 70));
        clock.advance_secs(29);
        assert!(buf.poll(10).is_empty());
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn test_poll_releases_sorted_after_window() {
        let (mut buf, clock) = buffer();
        assert!(buf.poll(10).is_empty());

        buf.ingest(candidate("ETH-USD", 2.9, 0.8, 1.1, 85));
        buf.ingest(candidate("LRDS-USD", 9.0, 3.0, 3.5, 72));
        buf.ingest(candidate("BTC-USD", 1.0, 0.2, 1.0, 90));
        clock.advance_secs(30);

        let released = buf.poll(10);

        assert_eq!(symbols(&released), vec!["LRDS-USD", "ETH-USD", "BTC-USD"]);
        assert!(released.windows(2).all(|w| w[0].combined_rank() >= w[1].combined_rank()));
        assert!(buf.is_empty());
        assert_eq!(buf.last_flush(), Some(start() + Duration::seconds(30)));
    }

    #[test]
    fn test_poll_truncates_to_max_count() {
        let (mut buf, clock) = buffer();
        buf.poll(10);
        for i in 0..5 {
            buf.ingest(candidate(&format!("C{}", i), i as f64, 0.0, 1.0, 50));
        }
        clock.advance_secs(31);

        let released = buf.poll(2);

        assert_eq!(symbols(&released), vec!["C4", "C3"]);
        // the rest are dropped with the window
        assert!(buf.is_empty());
    }

    #[test]
    fn test_empty_window_boundary_restarts_timer() {
        let (mut buf, clock) = buffer();
        assert!(buf.poll(10).is_empty());

        clock.advance_secs(31);
        assert!(buf.poll(10).is_empty());
        assert_eq!(buf.last_flush(), Some(start() + Duration::seconds(31)));

        // arrives right after the empty boundary: belongs to the new window
        buf.ingest(candidate("A", 2.0, 1.0, 1.0, 60));
        assert!(buf.poll(10).is_empty());
        assert_eq!(symbols(buf.pending()), vec!["A"]);
    }

    #[test]
    fn test_poll_zero_drains_window() {
        let (mut buf, clock) = buffer();
        buf.poll(10);
        buf.ingest(candidate("A", 3.0, 1.0, 1.2, 70));
        buf.ingest(candidate("B", 1.0, 0.5, 1.0, 60));
        clock.advance_secs(31);

        assert!(buf.poll(0).is_empty());
        assert!(buf.is_empty());
        assert_eq!(buf.last_flush(), Some(start() + Duration::seconds(31)));
    }

    #[test]
    fn test_size_trigger_releases_early() {
        let (mut buf, clock) = buffer();
        buf.poll(10);
        for i in 0..20 {
            buf.ingest(candidate(&format!("S{:02}", i), 1.0, 0.0, 1.0, i));
        }
        clock.advance_secs(1);

        let released = buf.poll(5);

        assert_eq!(released.len(), 5);
        assert_eq!(released[0].symbol(), "S19");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_ties_keep_arrival_order() {
        let (mut buf, _) = buffer();
        buf.ingest(candidate("FIRST", 2.0, 1.0, 1.0, 50));
        buf.ingest(candidate("SECOND", 2.0, 1.0, 1.0, 50));
        buf.ingest(candidate("THIRD", 2.0, 1.0, 1.0, 50));

        let released = buf.force_flush();
        assert_eq!(symbols(&released), vec!["FIRST", "SECOND", "THIRD"]);
    }

    #[test]
    fn test_force_flush_is_idempotent() {
        let (mut buf, clock) = buffer();
        buf.ingest(candidate("A", 6.0, 1.0, 1.5, 70));
        buf.ingest(candidate("B", 1.0, 0.0, 1.0, 70));
        clock.advance_secs(3);

        let first = buf.force_flush();
        let second = buf.force_flush();

        assert_eq!(symbols(&first), vec!["A", "B"]);
        assert!(second.is_empty());
        assert_eq!(buf.last_flush(), Some(start() + Duration::seconds(3)));
    }

    #[test]
    fn test_force_flush_restarts_window() {
        let (mut buf, clock) = buffer();
        buf.poll(10);
        clock.advance_secs(25);
        buf.force_flush();

        buf.ingest(candidate("A", 1.0, 0.0, 1.0, 50));
        clock.advance_secs(10);
        assert!(buf.poll(10).is_empty(), "window restarted by the forced flush");
    }

    #[test]
    fn test_clock_stepping_back_keeps_collecting() {
        let (mut buf, clock) = buffer();
        buf.poll(10);
        buf.ingest(candidate("A", 1.0, 0.0, 1.0, 50));
        clock.set(start() - Duration::seconds(600));
        assert!(buf.poll(10).is_empty());
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn test_should_skip_weak_candidate_behind_strong_leader() {
        let (mut buf, _) = buffer();
        buf.ingest(candidate("LRDS-USD", 8.0, 2.0, 2.0, 70));

        assert!(buf.should_skip("ETH-USD", 2.0));
        assert!(!buf.should_skip("SOL-USD", 4.0));
        assert!(!buf.should_skip("AVAX-USD", 7.5));
    }

    #[test]
    fn test_should_skip_needs_strong_leader() {
        let (mut buf, _) = buffer();
        assert!(!buf.should_skip("ETH-USD", -10.0));

        buf.ingest(candidate("BTC-USD", 4.0, 1.0, 1.0, 90));
        for m in [-3.0, 0.0, 0.1, 1.9, 3.9] {
            assert!(!buf.should_skip("X", m));
        }
    }

    #[test]
    fn test_should_skip_uses_absolute_leader_momentum() {
        let (mut buf, _) = buffer();
        buf.ingest(candidate("DUMP-USD", -12.0, -3.0, 2.0, 60));
        assert_eq!(buf.max_momentum_1h(), Some(12.0));
        assert!(buf.should_skip("ETH-USD", 3.0));
    }

    #[test]
    fn test_flush_clears_leaderboard() {
        let (mut buf, clock) = buffer();
        buf.poll(10);
        buf.ingest(candidate("LRDS-USD", 8.0, 2.0, 2.0, 70));
        assert!(buf.should_skip("ETH-USD", 1.0));

        clock.advance_secs(30);
        assert_eq!(buf.poll(10).len(), 1);
        assert!(!buf.should_skip("ETH-USD", 1.0));

        buf.ingest(candidate("PUMP-USD", 9.0, 2.0, 2.0, 70));
        buf.force_flush();
        assert!(!buf.should_skip("ETH-USD", 1.0));
        assert!(buf.leader().is_none());
    }

    #[test]
    fn test_leader_is_highest_rank() {
        let (mut buf, _) = buffer();
        buf.ingest(candidate("A", 1.0, 0.0, 1.0, 99));
        buf.ingest(candidate("B", 6.0, 1.0, 2.0, 40));
        buf.ingest(candidate("C", 2.0, 0.0, 1.0, 80));
        assert_eq!(buf.leader().map(|s| s.symbol()), Some("B"));
    }

    #[test]
    fn test_ingest_does_not_read_clock() {
        let mut clock = MockClock::new();
        clock.expect_now().times(1).return_const(start());
        let mut buf = WindowedRankingBuffer::with_clock(RankingConfig::default(), clock);

        buf.ingest(candidate("A", 1.0, 0.0, 1.0, 50));
        buf.ingest(candidate("B", 2.0, 0.0, 1.0, 50));
        buf.should_skip("C", 0.5);
        assert!(buf.poll(10).is_empty());
    }
}
