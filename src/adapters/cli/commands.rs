//! CLI Commands
//!
//! Argument definitions for the signal-admission binary.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::SelectionOverrides;
use crate::domain::TradingMode;

/// Signal Admission - momentum-ranked entry selection with mode-safe profiles
#[derive(Parser, Debug)]
#[command(
    name = "signal-admission",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Momentum-ranked signal admission with mode-safe threshold profiles",
    long_about = "Collects concurrent trading candidates over a window, ranks them by \
                  momentum, volume and score, and admits only the strongest movers. \
                  Thresholds come from named profiles that can never put test-grade \
                  parameters in front of live trading."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List available profiles and aliases
    Profiles(ProfilesCmd),

    /// Preflight: resolve and apply the session profile, print effective settings
    Check(CheckCmd),

    /// Replay JSON-lines candidates through a session and print admissions
    Rank(RankCmd),
}

impl Command {
    pub fn config_path(&self) -> Option<&PathBuf> {
        match self {
            Command::Profiles(cmd) => cmd.config.as_ref(),
            Command::Check(cmd) => Some(&cmd.session.config),
            Command::Rank(cmd) => Some(&cmd.session.config),
        }
    }
}

/// Mode/profile selection shared by session commands
#[derive(Args, Debug)]
pub struct SessionArgs {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/admission.toml")]
    pub config: PathBuf,

    /// Override trading mode (paper, live)
    #[arg(long, value_name = "MODE")]
    pub mode: Option<TradingMode>,

    /// Override profile (name or alias)
    #[arg(long, value_name = "NAME")]
    pub profile: Option<String>,
}

impl SessionArgs {
    pub fn overrides(&self) -> SelectionOverrides {
        SelectionOverrides {
            mode: self.mode,
            profile: self.profile.clone(),
        }
    }
}

/// List profiles
#[derive(Parser, Debug)]
pub struct ProfilesCmd {
    /// Include operator profiles from this configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Preflight check
#[derive(Parser, Debug)]
pub struct CheckCmd {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Replay candidates
#[derive(Parser, Debug)]
pub struct RankCmd {
    #[command(flatten)]
    pub session: SessionArgs,

    /// JSON-lines file of candidates (symbol, strategy_id, raw_score, features, payload)
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Symbols already held (comma separated)
    #[arg(long, value_name = "SYMBOLS", value_delimiter = ',')]
    pub open: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_check_with_overrides() {
        let app = CliApp::parse_from([
            "signal-admission",
            "check",
            "--config",
            "cfg.toml",
            "--mode",
            "live",
            "--profile",
            "live",
            "--format",
            "json",
        ]);
        match app.command {
            Command::Check(cmd) => {
                assert_eq!(cmd.session.config, PathBuf::from("cfg.toml"));
                assert_eq!(cmd.session.mode, Some(TradingMode::Live));
                assert_eq!(cmd.session.profile.as_deref(), Some("live"));
                assert_eq!(cmd.format, OutputFormat::Json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_rank_open_positions() {
        let app = CliApp::parse_from([
            "signal-admission",
            "--debug",
            "rank",
            "--input",
            "candidates.jsonl",
            "--open",
            "BTC-USD,ETH-USD",
        ]);
        assert!(app.debug);
        match app.command {
            Command::Rank(cmd) => {
                assert_eq!(cmd.open, vec!["BTC-USD".to_string(), "ETH-USD".to_string()]);
                assert_eq!(cmd.session.config, PathBuf::from("config/admission.toml"));
                assert!(cmd.session.overrides().mode.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_bad_mode_rejected() {
        let result = CliApp::try_parse_from(["signal-admission", "check", "--mode", "yolo"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_profiles_config_optional() {
        let app = CliApp::parse_from(["signal-admission", "profiles"]);
        assert!(app.command.config_path().is_none());
    }
}
