//! Configuration Loader
//!
//! Loads and validates the session configuration from a TOML file.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::domain::{TradingMode, TradingSettings};
use crate::profiles::{Profile, ProfileError, ProfileRegistry};
use crate::ranking::RankingConfig;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub trading: TradingSection,
    /// Base threshold values before any profile is applied
    #[serde(default)]
    pub settings: TradingSettings,
    #[serde(default)]
    pub ranking: RankingConfig,
    /// Operator-defined profiles, merged into the built-in table
    #[serde(default)]
    pub profiles: BTreeMap<String, BTreeMap<String, f64>>,
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Mode and profile selection
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TradingSection {
    /// "paper" or "live"
    #[serde(default)]
    pub mode: TradingMode,
    /// Profile name or alias; mode default when absent
    #[serde(default)]
    pub profile: Option<String>,
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Profile table rejected: {0}")]
    Profile(#[from] ProfileError),
}

/// Load configuration from a TOML file (`~` is expanded)
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let raw = path.as_ref().to_string_lossy();
    let expanded = shellexpand::tilde(&raw).to_string();
    let content = std::fs::read_to_string(&expanded)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    tracing::debug!(
        "Loaded config from {} ({} operator profiles)",
        expanded,
        config.profiles.len()
    );
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.settings
            .validate()
            .map_err(|e| ConfigError::ValidationError(format!("[settings] {}", e)))?;

        self.ranking
            .validate()
            .map_err(|e| ConfigError::ValidationError(format!("[ranking] {}", e)))?;

        match self.logging.level.to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "logging.level must be one of trace/debug/info/warn/error, got '{}'",
                    other
                )))
            }
        }

        // Building the registry checks every operator profile up front
        self.registry()?;
        Ok(())
    }

    /// Built-in profiles plus the operator tables from this file
    pub fn registry(&self) -> Result<ProfileRegistry, ConfigError> {
        let mut registry = ProfileRegistry::builtin();

        for (name, overrides) in &self.profiles {
            if registry.contains(name) || registry.resolve(name) != name {
                return Err(ConfigError::ValidationError(format!(
                    "profile '{}' shadows a built-in profile or alias",
                    name
                )));
            }
            registry.insert(Profile::new(
                name.clone(),
                overrides.iter().map(|(k, v)| (k.clone(), *v)),
            ));
        }

        for (alias, canonical) in &self.aliases {
            if registry.contains(alias) || registry.resolve(alias) != alias {
                return Err(ConfigError::ValidationError(format!(
                    "alias '{}' shadows an existing profile or alias",
                    alias
                )));
            }
            registry.add_alias(alias.clone(), canonical.clone());
        }

        registry.validate()?;
        Ok(registry)
    }

    /// Base settings for a session in `mode`, before any profile
    pub fn base_settings(&self, mode: TradingMode) -> TradingSettings {
        TradingSettings {
            mode,
            active_profile: None,
            ..self.settings.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn create_valid_config() -> String {
        r#"
[trading]
mode = "paper"
profile = "scalper"

[settings]
entry_score_min = 72.0
spread_max_bps = 22.0
max_positions = 6

[ranking]
window_seconds = 45
size_trigger = 15
max_count = 8
max_new_positions = 2

[profiles.scalper]
entry_score_min = 50.0
spread_max_bps = 30.0
tp1_pct = 0.04

[aliases]
scalp = "scalper"

[logging]
level = "debug"
"#
        .to_string()
    }

    #[test]
    fn test_load_valid_config() {
        let file = write_config(&create_valid_config());

        let config = load_config(file.path()).unwrap();

        assert_eq!(config.trading.mode, TradingMode::Paper);
        assert_eq!(config.trading.profile.as_deref(), Some("scalper"));
        assert_eq!(config.settings.entry_score_min, 72.0);
        assert_eq!(config.settings.max_positions, 6);
        // unspecified settings keep defaults
        assert_eq!(config.settings.min_rr_ratio, 1.5);
        assert_eq!(config.ranking.window_seconds, 45);
        assert_eq!(config.ranking.leader_momentum_trigger, 5.0);
        assert_eq!(config.logging.level, "debug");

        let registry = config.registry().unwrap();
        assert!(registry.contains("scalper"));
        assert_eq!(registry.resolve("scalp"), "scalper");
        assert!(registry.contains("live-profile"));
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let file = write_config("[trading]\n");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.trading.mode, TradingMode::Paper);
        assert!(config.trading.profile.is_none());
        assert_eq!(config.settings, TradingSettings::default());
        assert_eq!(config.ranking.size_trigger, 20);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/path/config.toml");
        assert!(matches!(result.unwrap_err(), ConfigError::IoError(_)));
    }

    #[test]
    fn test_unknown_mode_is_parse_error() {
        let file = write_config("[trading]\nmode = \"yolo\"\n");
        assert!(matches!(load_config(file.path()).unwrap_err(), ConfigError::ParseError(_)));
    }

    #[test]
    fn test_unknown_settings_key_is_parse_error() {
        let file = write_config("[trading]\n[settings]\nentry_score_minimum = 50.0\n");
        assert!(matches!(load_config(file.path()).unwrap_err(), ConfigError::ParseError(_)));
    }

    #[test]
    fn test_mode_cannot_be_set_from_settings_table() {
        let file = write_config("[trading]\nmode = \"paper\"\n[settings]\nmode = \"live\"\n");
        assert!(matches!(load_config(file.path()).unwrap_err(), ConfigError::ParseError(_)));
    }

    #[test]
    fn test_operator_profile_with_disallowed_key() {
        let file = write_config(
            r#"
[trading]
[profiles.whale]
entry_score_min = 50.0
max_trade_usd = 500.0
"#,
        );
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Profile(ProfileError::DisallowedOverrideKey { ref key, .. }) if key == "max_trade_usd"
        ));
    }

    #[test]
    fn test_operator_profile_cannot_shadow_builtin() {
        let file = write_config(
            r#"
[trading]
[profiles.test-profile]
entry_score_min = 60.0
"#,
        );
        assert!(matches!(load_config(file.path()).unwrap_err(), ConfigError::ValidationError(_)));

        let file = write_config(
            r#"
[trading]
[profiles.live]
entry_score_min = 10.0
"#,
        );
        assert!(matches!(load_config(file.path()).unwrap_err(), ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_alias_to_missing_profile() {
        let file = write_config("[trading]\n[aliases]\nfast = \"scalper\"\n");
        assert!(matches!(
            load_config(file.path()).unwrap_err(),
            ConfigError::Profile(ProfileError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let file = write_config("[trading]\n[settings]\nml_min_confidence = 1.5\n");
        assert!(matches!(load_config(file.path()).unwrap_err(), ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_invalid_ranking_rejected() {
        let file = write_config("[trading]\n[ranking]\nwindow_seconds = 0\n");
        assert!(matches!(load_config(file.path()).unwrap_err(), ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_base_settings_take_mode() {
        let file = write_config(&create_valid_config());
        let config = load_config(file.path()).unwrap();

        let settings = config.base_settings(TradingMode::Live);

        assert_eq!(settings.mode, TradingMode::Live);
        assert_eq!(settings.entry_score_min, 72.0);
        assert!(settings.active_profile.is_none());
    }
}
