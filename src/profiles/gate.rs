//! Profile Gate
//!
//! Applies a named profile onto [`TradingSettings`]. Fails closed: a test-grade
//! profile can never be applied while the settings are in live mode, and a
//! profile with any invalid key leaves the settings untouched.

use thiserror::Error;

use super::registry::{ProfileRegistry, LIVE_DEFAULT_PROFILE, PAPER_DEFAULT_PROFILE};
use crate::domain::{SettingField, TradingMode, TradingSettings};

/// Profile application errors.
///
/// None of these are recoverable: startup or reconfiguration must abort.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("Unknown profile: {name}")]
    UnknownProfile { name: String },

    #[error(
        "DANGER: Cannot use '{profile}' with TRADING_MODE={mode}! \
         Test profiles bypass safety gates. Use 'live-profile' instead."
    )]
    UnsafeProfileCombination { profile: String, mode: TradingMode },

    #[error("Profile '{profile}' overrides key not allowed: {key}")]
    DisallowedOverrideKey { profile: String, key: String },

    #[error("Profile '{profile}' overrides '{key}' but settings have no such field")]
    UnknownConfigField { profile: String, key: String },
}

/// A profile that passed every check, ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProfile {
    pub name: String,
    pub overrides: Vec<(SettingField, f64)>,
}

/// Default profile for a mode when none was requested
pub fn default_profile_for_mode(mode: TradingMode) -> &'static str {
    match mode {
        TradingMode::Paper => PAPER_DEFAULT_PROFILE,
        TradingMode::Live => LIVE_DEFAULT_PROFILE,
    }
}

/// Validates and applies profiles from a registry
#[derive(Debug, Clone, Default)]
pub struct ProfileGate {
    registry: ProfileRegistry,
}

impl ProfileGate {
    pub fn new(registry: ProfileRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProfileRegistry {
        &self.registry
    }

    /// Alias lookup, falling back to the name itself
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.registry.resolve(name)
    }

    /// Run every check for `name` under `mode` without touching any settings
    pub fn plan(&self, name: &str, mode: TradingMode) -> Result<ResolvedProfile, ProfileError> {
        let requested = if name.is_empty() {
            default_profile_for_mode(mode)
        } else {
            name
        };
        let resolved = self.resolve(requested);

        let profile = self
            .registry
            .get(resolved)
            .ok_or_else(|| ProfileError::UnknownProfile {
                name: resolved.to_string(),
            })?;

        if self.registry.is_test_profile(resolved) && mode.is_live() {
            return Err(ProfileError::UnsafeProfileCombination {
                profile: resolved.to_string(),
                mode,
            });
        }

        let overrides = self.registry.check_profile(profile)?;

        Ok(ResolvedProfile {
            name: resolved.to_string(),
            overrides,
        })
    }

    /// Apply profile `name` to `settings`.
    ///
    /// All-or-nothing: on error `settings` is unchanged. On success every
    /// override is written and `active_profile` records the resolved name.
    pub fn apply(&self, name: &str, settings: &mut TradingSettings) -> Result<(), ProfileError> {
        let plan = match self.plan(name, settings.mode) {
            Ok(plan) => plan,
            Err(e) => {
                tracing::error!(profile = name, mode = %settings.mode, "Profile rejected: {}", e);
                return Err(e);
            }
        };

        for (field, value) in &plan.overrides {
            let previous = settings.get(*field);
            settings.set(*field, *value);
            tracing::debug!("{}: {} -> {}", field, previous, value);
        }

        if self.registry.is_test_profile(&plan.name) {
            tracing::warn!(
                "Test profile '{}' active - most admission gates are loosened (paper only)",
                plan.name
            );
        }
        tracing::info!(
            profile = %plan.name,
            mode = %settings.mode,
            overrides = plan.overrides.len(),
            "Profile applied"
        );

        settings.active_profile = Some(plan.name);
        Ok(())
    }
}
