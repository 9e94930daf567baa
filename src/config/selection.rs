//! Mode/Profile Selection
//!
//! Decides the effective trading mode and profile for a session.
//!
//! Precedence (highest first):
//! 1. CLI arguments (`--mode`, `--profile`)
//! 2. Environment (`TRADING_MODE`, `PROFILE`)
//! 3. Config file `[trading]` section
//! 4. Mode default (`paper-profile` / `live-profile`)

use std::fmt;

use super::loader::{Config, ConfigError};
use crate::domain::TradingMode;
use crate::profiles::default_profile_for_mode;

pub const MODE_ENV: &str = "TRADING_MODE";
pub const PROFILE_ENV: &str = "PROFILE";

/// Where a selected value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSource {
    Cli,
    Env,
    File,
    Default,
}

impl SelectionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionSource::Cli => "cli",
            SelectionSource::Env => "env",
            SelectionSource::File => "file",
            SelectionSource::Default => "default",
        }
    }
}

impl fmt::Display for SelectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional mode/profile values from one source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionOverrides {
    pub mode: Option<TradingMode>,
    pub profile: Option<String>,
}

impl SelectionOverrides {
    /// Read `TRADING_MODE` and `PROFILE`. Empty values count as unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mode = non_empty(MODE_ENV)
            .map(|v| v.parse::<TradingMode>())
            .transpose()
            .map_err(|e| ConfigError::ValidationError(format!("{}: {}", MODE_ENV, e)))?;
        let profile = non_empty(PROFILE_ENV).map(|v| v.trim().to_string());

        Ok(Self { mode, profile })
    }
}

/// Effective mode and profile with their sources, for startup logging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub mode: TradingMode,
    pub mode_source: SelectionSource,
    pub profile: String,
    pub profile_source: SelectionSource,
}

impl Selection {
    pub fn log(&self) {
        tracing::info!(
            "effective_mode={} source={} effective_profile={} source={}",
            self.mode,
            self.mode_source,
            self.profile,
            self.profile_source
        );
    }
}

/// Resolve the effective mode and profile using the standard precedence rules
pub fn resolve_selection(config: &Config, cli: &SelectionOverrides, env: &SelectionOverrides) -> Selection {
    let (mode, mode_source) = match (cli.mode, env.mode) {
        (Some(m), _) => (m, SelectionSource::Cli),
        (None, Some(m)) => (m, SelectionSource::Env),
        (None, None) => (config.trading.mode, SelectionSource::File),
    };

    let file_profile = config
        .trading
        .profile
        .as_deref()
        .filter(|p| !p.trim().is_empty());

    let (profile, profile_source) = if let Some(p) = cli.profile.as_deref() {
        (p.to_string(), SelectionSource::Cli)
    } else if let Some(p) = env.profile.as_deref() {
        (p.to_string(), SelectionSource::Env)
    } else if let Some(p) = file_profile {
        (p.to_string(), SelectionSource::File)
    } else {
        (default_profile_for_mode(mode).to_string(), SelectionSource::Default)
    };

    Selection {
        mode,
        mode_source,
        profile,
        profile_source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(mode: &str, profile: Option<&str>) -> Config {
        let mut toml_src = format!("[trading]\nmode = \"{}\"\n", mode);
        if let Some(p) = profile {
            toml_src.push_str(&format!("profile = \"{}\"\n", p));
        }
        toml::from_str(&toml_src).unwrap()
    }

    fn env(vars: &[(&str, &str)]) -> SelectionOverrides {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        SelectionOverrides::from_lookup(|k| map.get(k).cloned()).unwrap()
    }

    #[test]
    fn test_file_values_used_without_overrides() {
        let sel = resolve_selection(&config("live", Some("conservative")), &SelectionOverrides::default(), &env(&[]));
        assert_eq!(sel.mode, TradingMode::Live);
        assert_eq!(sel.mode_source, SelectionSource::File);
        assert_eq!(sel.profile, "conservative");
        assert_eq!(sel.profile_source, SelectionSource::File);
    }

    #[test]
    fn test_mode_default_profile() {
        let sel = resolve_selection(&config("live", None), &SelectionOverrides::default(), &env(&[]));
        assert_eq!(sel.profile, "live-profile");
        assert_eq!(sel.profile_source, SelectionSource::Default);

        // mode from env drives the default too
        let sel = resolve_selection(
            &config("live", None),
            &SelectionOverrides::default(),
            &env(&[("TRADING_MODE", "paper")]),
        );
        assert_eq!(sel.mode, TradingMode::Paper);
        assert_eq!(sel.profile, "paper-profile");
    }

    #[test]
    fn test_env_beats_file_and_cli_beats_env() {
        let cfg = config("paper", Some("aggressive"));
        let env = env(&[("TRADING_MODE", "live"), ("PROFILE", "conservative")]);

        let sel = resolve_selection(&cfg, &SelectionOverrides::default(), &env);
        assert_eq!((sel.mode, sel.mode_source), (TradingMode::Live, SelectionSource::Env));
        assert_eq!(sel.profile, "conservative");

        let cli = SelectionOverrides {
            mode: Some(TradingMode::Paper),
            profile: Some("test".to_string()),
        };
        let sel = resolve_selection(&cfg, &cli, &env);
        assert_eq!((sel.mode, sel.mode_source), (TradingMode::Paper, SelectionSource::Cli));
        assert_eq!((sel.profile.as_str(), sel.profile_source), ("test", SelectionSource::Cli));
    }

    #[test]
    fn test_empty_env_values_ignored() {
        let overrides = env(&[("TRADING_MODE", ""), ("PROFILE", "  ")]);
        assert_eq!(overrides, SelectionOverrides::default());
    }

    #[test]
    fn test_bad_env_mode_rejected() {
        let result = SelectionOverrides::from_lookup(|k| (k == MODE_ENV).then(|| "real".to_string()));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
