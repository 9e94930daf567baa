//! Signal Admission - momentum-ranked entry selection library
//!
//! Collects concurrently arriving trading candidates, ranks them by a
//! momentum/volume/quality composite, and releases only the best per window.
//! Admission thresholds come from named profiles applied through a gate that
//! never lets test-grade parameters reach live trading.
//!
//! # Modules
//!
//! - `domain`: Core types (TradingSettings, Candidate, RankedSignal)
//! - `ports`: Trait abstractions (Clock)
//! - `profiles`: Profile registry and the fail-closed ProfileGate
//! - `ranking`: WindowedRankingBuffer and rank parameters
//! - `config`: Configuration loading, validation and mode/profile selection
//! - `application`: Per-session admission pipeline
//! - `adapters`: CLI definitions

pub mod domain;
pub mod ports;
pub mod profiles;
pub mod ranking;
pub mod config;
pub mod application;
pub mod adapters;
