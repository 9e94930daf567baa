//! Profile Registry
//!
//! Named threshold bundles, their short aliases, and the fixed allow-list of
//! keys a profile is permitted to override.

use std::collections::{BTreeMap, BTreeSet};

use super::gate::ProfileError;
use crate::domain::SettingField;

/// Keys a profile may override. Restricted so a profile cannot change the gate order.
pub const ALLOWED_PROFILE_KEYS: [&str; 9] = [
    "entry_score_min",
    "min_rr_ratio",
    "spread_max_bps",
    "fixed_stop_pct",
    "tp1_pct",
    "tp2_pct",
    "ml_min_confidence",
    "ml_boost_scale",
    "paper_start_balance_usd",
];

/// Profiles that bypass most gates. Never allowed in live mode.
pub const TEST_PROFILES: [&str; 2] = ["test", "test-profile"];

pub const PAPER_DEFAULT_PROFILE: &str = "paper-profile";
pub const LIVE_DEFAULT_PROFILE: &str = "live-profile";

/// An immutable named set of overrides
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    name: String,
    overrides: Vec<(String, f64)>,
}

impl Profile {
    pub fn new<I, K>(name: impl Into<String>, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            name: name.into(),
            overrides: overrides.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Overrides in declaration order
    pub fn overrides(&self) -> &[(String, f64)] {
        &self.overrides
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

/// Registry of profiles, loaded once at process start
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: BTreeMap<String, Profile>,
    aliases: BTreeMap<String, String>,
    allow_list: BTreeSet<String>,
    test_names: BTreeSet<String>,
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ProfileRegistry {
    /// Empty registry with the given allow-list and test-grade names
    pub fn new<A, T>(allow_list: A, test_names: T) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        Self {
            profiles: BTreeMap::new(),
            aliases: BTreeMap::new(),
            allow_list: allow_list.into_iter().map(Into::into).collect(),
            test_names: test_names.into_iter().map(Into::into).collect(),
        }
    }

    /// The production profile table
    pub fn builtin() -> Self {
        let mut registry = Self::new(ALLOWED_PROFILE_KEYS, TEST_PROFILES);

        // Realistic paper trading, used for measurement before going live
        registry.insert(Profile::new(
            PAPER_DEFAULT_PROFILE,
            [
                ("entry_score_min", 60.0),
                ("min_rr_ratio", 2.0),
                ("spread_max_bps", 25.0),
                ("ml_min_confidence", 0.55),
                ("paper_start_balance_usd", 1000.0),
            ],
        ));
        // ML still warming up in live, so the confidence gate is off
        registry.insert(Profile::new(
            LIVE_DEFAULT_PROFILE,
            [
                ("entry_score_min", 60.0),
                ("min_rr_ratio", 2.0),
                ("spread_max_bps", 18.0),
                ("ml_min_confidence", 0.0),
                ("fixed_stop_pct", 0.04),
            ],
        ));
        let loose = [
            ("entry_score_min", 10.0),
            ("min_rr_ratio", 1.0),
            ("spread_max_bps", 100.0),
            ("ml_min_confidence", 0.0),
        ];
        registry.insert(Profile::new("test-profile", loose));
        registry.insert(Profile::new("test", loose));

        registry.insert(Profile::new("prod", Vec::<(String, f64)>::new()));
        registry.insert(Profile::new(
            "aggressive",
            [
                ("entry_score_min", 55.0),
                ("min_rr_ratio", 1.8),
                ("ml_min_confidence", 0.5),
            ],
        ));
        registry.insert(Profile::new(
            "conservative",
            [
                ("entry_score_min", 65.0),
                ("min_rr_ratio", 2.2),
                ("spread_max_bps", 18.0),
            ],
        ));

        registry.add_alias("paper", PAPER_DEFAULT_PROFILE);
        registry.add_alias("live", LIVE_DEFAULT_PROFILE);
        registry.add_alias("test", "test-profile");
        registry
    }

    /// Insert a profile, replacing any existing one with the same name
    pub fn insert(&mut self, profile: Profile) -> Option<Profile> {
        self.profiles.insert(profile.name.clone(), profile)
    }

    pub fn add_alias(&mut self, alias: impl Into<String>, canonical: impl Into<String>) {
        self.aliases.insert(alias.into(), canonical.into());
    }

    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    pub fn profiles(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.values()
    }

    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(a, c)| (a.as_str(), c.as_str()))
    }

    /// Canonical name for `name`, or `name` itself when it is not an alias
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    pub fn is_allowed_key(&self, key: &str) -> bool {
        self.allow_list.contains(key)
    }

    pub fn allow_list(&self) -> impl Iterator<Item = &str> {
        self.allow_list.iter().map(String::as_str)
    }

    pub fn is_test_profile(&self, name: &str) -> bool {
        self.test_names.contains(name)
    }

    /// Check a single profile's keys against the allow-list and the settings schema
    pub fn check_profile(&self, profile: &Profile) -> Result<Vec<(SettingField, f64)>, ProfileError> {
        profile
            .overrides
            .iter()
            .map(|(key, value)| {
                if !self.is_allowed_key(key) {
                    return Err(ProfileError::DisallowedOverrideKey {
                        profile: profile.name.clone(),
                        key: key.clone(),
                    });
                }
                let field = SettingField::from_name(key).ok_or_else(|| {
                    ProfileError::UnknownConfigField {
                        profile: profile.name.clone(),
                        key: key.clone(),
                    }
                })?;
                Ok((field, *value))
            })
            .collect()
    }

    /// Check every profile and alias in the table.
    ///
    /// Run at startup so a broken table fails before any session begins.
    pub fn validate(&self) -> Result<(), ProfileError> {
        for key in &self.allow_list {
            if SettingField::from_name(key).is_none() {
                return Err(ProfileError::UnknownConfigField {
                    profile: "<allow-list>".to_string(),
                    key: key.clone(),
                });
            }
        }
        for profile in self.profiles.values() {
            self.check_profile(profile)?;
        }
        for canonical in self.aliases.values() {
            if !self.profiles.contains_key(canonical) {
                return Err(ProfileError::UnknownProfile {
                    name: canonical.clone(),
                });
            }
        }
        Ok(())
    }
}
