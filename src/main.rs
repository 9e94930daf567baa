//! Signal Admission CLI
//!
//! Preflight profile checks and offline replay of candidate batches.

use anyhow::{Context, Result};
use clap::Parser;
use std::collections::HashSet;
use std::io::{BufRead, BufReader};
use tracing_subscriber::{fmt, EnvFilter};

use signal_admission::adapters::cli::{CheckCmd, CliApp, Command, OutputFormat, ProfilesCmd, RankCmd, SessionArgs};
use signal_admission::application::{AdmissionSession, OfferOutcome};
use signal_admission::config::{load_config, resolve_selection, Config, SelectionOverrides};
use signal_admission::domain::Candidate;
use signal_admission::profiles::{ProfileGate, ProfileRegistry};

fn main() -> Result<()> {
    // Load .env file if it exists (TRADING_MODE / PROFILE may live there)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();

    let config = match app.command.config_path() {
        Some(path) => Some(
            load_config(path).with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        ),
        None => None,
    };
    let config_level = config.as_ref().map(|c| c.logging.level.as_str());
    init_logging(app.verbose, app.debug, config_level)?;

    match app.command {
        Command::Profiles(cmd) => profiles_command(cmd, config.as_ref()),
        Command::Check(cmd) => check_command(cmd, required(config)?),
        Command::Rank(cmd) => rank_command(cmd, required(config)?),
    }
}

fn required(config: Option<Config>) -> Result<Config> {
    config.context("Command requires a configuration file")
}

fn init_logging(verbose: bool, debug: bool, config_level: Option<&str>) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else if let Ok(filter) = EnvFilter::try_from_default_env() {
        filter
    } else {
        EnvFilter::new(config_level.unwrap_or("warn"))
    };

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialise logging: {}", e))?;
    Ok(())
}

/// Build a configured session for the effective mode/profile.
///
/// Any profile error aborts: nothing runs with a half-applied or unsafe profile.
fn start_session<P>(config: &Config, args: &SessionArgs) -> Result<AdmissionSession<P>> {
    let env = SelectionOverrides::from_env()?;
    let selection = resolve_selection(config, &args.overrides(), &env);
    selection.log();

    let registry = config.registry()?;
    let mut session = AdmissionSession::new(
        config.base_settings(selection.mode),
        ProfileGate::new(registry),
        config.ranking.clone(),
    );
    session
        .configure(&selection.profile)
        .with_context(|| format!("Refusing to start with profile '{}'", selection.profile))?;
    Ok(session)
}

fn profiles_command(_cmd: ProfilesCmd, config: Option<&Config>) -> Result<()> {
    let registry = match config {
        Some(c) => c.registry()?,
        None => ProfileRegistry::builtin(),
    };

    println!("Profiles:");
    for profile in registry.profiles() {
        let flag = if registry.is_test_profile(profile.name()) {
            "  [test - paper only]"
        } else {
            ""
        };
        println!("  {}{}", profile.name(), flag);
        if profile.is_empty() {
            println!("      (no overrides)");
        }
        for (key, value) in profile.overrides() {
            println!("      {} = {}", key, value);
        }
    }

    println!("Aliases:");
    for (alias, canonical) in registry.aliases() {
        println!("  {} -> {}", alias, canonical);
    }

    println!("Overridable keys:");
    for key in registry.allow_list() {
        println!("  {}", key);
    }
    Ok(())
}

fn check_command(cmd: CheckCmd, config: Config) -> Result<()> {
    let session = start_session::<serde_json::Value>(&config, &cmd.session)?;
    let settings = session.settings();

    match cmd.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(settings)?);
        }
        OutputFormat::Text => {
            println!("Mode:           {}", session.mode());
            println!("Profile:        {}", settings.active_profile.as_deref().unwrap_or("-"));
            println!("Entry score:    >= {}", settings.entry_score_min);
            println!("Reward:risk:    >= {} (implied {:.2})", settings.min_rr_ratio, settings.implied_rr_ratio());
            println!("Spread:         <= {} bps", settings.spread_max_bps);
            println!("Stop / TP1/TP2: {:.2}% / {:.2}% / {:.2}%",
                settings.fixed_stop_pct * 100.0, settings.tp1_pct * 100.0, settings.tp2_pct * 100.0);
            println!("ML confidence:  >= {}", settings.ml_min_confidence);
            println!("Max positions:  {}", settings.max_positions);
        }
    }

    if settings.implied_rr_ratio() < settings.min_rr_ratio {
        tracing::warn!(
            "tp1_pct / fixed_stop_pct = {:.2} is below min_rr_ratio {} - fixed geometry will never pass the R:R gate",
            settings.implied_rr_ratio(),
            settings.min_rr_ratio
        );
    }
    Ok(())
}

fn rank_command(cmd: RankCmd, config: Config) -> Result<()> {
    let mut session = start_session::<serde_json::Value>(&config, &cmd.session)?;

    let input = shellexpand::tilde(&cmd.input.to_string_lossy()).to_string();
    let file = std::fs::File::open(&input).with_context(|| format!("Failed to open {}", input))?;

    let mut offered = 0usize;
    let mut skipped = 0usize;
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", input))?;
        if line.trim().is_empty() {
            continue;
        }
        let candidate: Candidate<serde_json::Value> = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid candidate", input, line_no + 1))?;
        offered += 1;
        if session.offer(candidate) == OfferOutcome::Skipped {
            skipped += 1;
        }
    }

    let open: HashSet<String> = cmd.open.into_iter().collect();
    let admissions = session.drain(&open);
    tracing::info!(
        "Replayed {} candidates: {} skipped behind leaders, {} admitted",
        offered,
        skipped,
        admissions.len()
    );

    for admission in admissions {
        let line = serde_json::json!({
            "admission": admission.record,
            "payload": admission.payload,
        });
        println!("{}", serde_json::to_string(&line)?);
    }
    Ok(())
}
