//! TOML-based application configuration.
//!
//! Tunables for the reward economy and daily goal selection. Structural
//! constants of the economy (the 300 s overtime buffer, the warning
//! thresholds, the penalty interval) live with their engines; this file
//! only carries the knobs a user might reasonably turn.
//!
//! Configuration is stored at `~/.config/brainbites/config.toml`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::storage::data_dir;

/// Time and point rewards for quiz performance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardsConfig {
    /// Points for a correct answer before the streak bonus.
    #[serde(default = "default_base_points")]
    pub base_points: u32,
    /// Seconds of screen time per correct answer.
    #[serde(default = "default_correct_answer_seconds")]
    pub correct_answer_seconds: u64,
    /// Extra seconds when a streak lands exactly on a milestone.
    #[serde(default = "default_streak_milestone_seconds")]
    pub streak_milestone_seconds: u64,
    /// Seconds granted per rewarded ad watch.
    #[serde(default = "default_ad_bonus_seconds")]
    pub ad_bonus_seconds: u64,
}

/// Daily goal selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalsConfig {
    /// Number of goals selected from the catalog each day.
    #[serde(default = "default_goals_per_day")]
    pub per_day: usize,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/brainbites/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub rewards: RewardsConfig,
    #[serde(default)]
    pub goals: GoalsConfig,
}

fn default_base_points() -> u32 {
    10
}
fn default_correct_answer_seconds() -> u64 {
    30
}
fn default_streak_milestone_seconds() -> u64 {
    120
}
fn default_ad_bonus_seconds() -> u64 {
    crate::timer::AD_REWARD_SECONDS
}
fn default_goals_per_day() -> usize {
    3
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            base_points: default_base_points(),
            correct_answer_seconds: default_correct_answer_seconds(),
            streak_milestone_seconds: default_streak_milestone_seconds(),
            ad_bonus_seconds: default_ad_bonus_seconds(),
        }
    }
}

impl Default for GoalsConfig {
    fn default() -> Self {
        Self {
            per_day: default_goals_per_day(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or write and return the default.
    ///
    /// # Errors
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(Self::path()?, content)?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let mut current = &json;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        match current {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key and persist.
    ///
    /// # Errors
    /// Returns an error if the key is unknown, the value cannot be parsed
    /// as the existing value's type, or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
        let mut json = serde_json::to_value(&*self)?;

        let (parents, leaf) = match key.rsplit_once('.') {
            Some((parents, leaf)) => (parents, leaf),
            None => return Err(ConfigError::UnknownKey(key.into()).into()),
        };

        let mut current = &mut json;
        for part in parents.split('.') {
            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.into()))?;
        }
        let obj = current
            .as_object_mut()
            .ok_or_else(|| ConfigError::UnknownKey(key.into()))?;
        let existing = obj
            .get(leaf)
            .ok_or_else(|| ConfigError::UnknownKey(key.into()))?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|e| ConfigError::ParseFailed(e.to_string()))?,
            ),
            serde_json::Value::Number(_) => serde_json::Value::Number(
                value
                    .parse::<u64>()
                    .map_err(|e| ConfigError::ParseFailed(e.to_string()))?
                    .into(),
            ),
            _ => serde_json::Value::String(value.into()),
        };
        obj.insert(leaf.to_string(), new_value);

        *self = serde_json::from_value(json)?;
        self.save()?;
        Ok(())
    }
}
