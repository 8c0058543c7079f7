//! Configuration file support for Fitplay.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/fitplay/config.toml`.

use crate::sequence::DEFAULT_FALLBACK_STEP_SECONDS;
use crate::stats::StatsPolicy;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub player: PlayerConfig,

    #[serde(default)]
    pub stats: StatsPolicy,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Workout player parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Period between driver ticks
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Remaining seconds shown before a workout is started
    #[serde(default = "default_idle_placeholder_seconds")]
    pub idle_placeholder_seconds: u32,

    /// Duration used for exercises that carry none
    #[serde(default = "default_fallback_step_seconds")]
    pub fallback_step_seconds: u32,

    /// Substitute the built-in workout for routines without exercises
    #[serde(default = "default_use_default_sequence")]
    pub use_default_sequence: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            idle_placeholder_seconds: default_idle_placeholder_seconds(),
            fallback_step_seconds: default_fallback_step_seconds(),
            use_default_sequence: default_use_default_sequence(),
        }
    }
}

impl PlayerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

// Default value functions
fn home_dir_or_cwd() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| home_dir_or_cwd().join(".local/share"));
    base.join("fitplay")
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_idle_placeholder_seconds() -> u32 {
    60
}

fn default_fallback_step_seconds() -> u32 {
    DEFAULT_FALLBACK_STEP_SECONDS
}

fn default_use_default_sequence() -> bool {
    true
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject settings the player cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.player.tick_interval_ms == 0 {
            return Err(Error::Config("player.tick_interval_ms must be positive".into()));
        }
        if self.player.fallback_step_seconds == 0 {
            return Err(Error::Config(
                "player.fallback_step_seconds must be positive".into(),
            ));
        }
        if self.stats.calories_per_minute < 0.0 {
            return Err(Error::Config(
                "stats.calories_per_minute must not be negative".into(),
            ));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| home_dir_or_cwd().join(".config"));
        base.join("fitplay").join("config.toml")
    }

    /// Path of the completed-workout log inside the data directory
    pub fn stats_log_path(data_dir: &Path) -> PathBuf {
        data_dir.join("stats").join("completions.jsonl")
    }

    /// Favorite routine ids under `data_dir`
    pub fn favorites_path(data_dir: &Path) -> PathBuf {
        data_dir.join("favorites.json")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.player.tick_interval_ms, 1000);
        assert_eq!(config.player.idle_placeholder_seconds, 60);
        assert_eq!(config.player.fallback_step_seconds, 30);
        assert!(config.player.use_default_sequence);
        assert_eq!(config.player.tick_interval(), Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(
            config.player.fallback_step_seconds,
            parsed.player.fallback_step_seconds
        );
        assert_eq!(
            config.stats.category_calories,
            parsed.stats.category_calories
        );
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[player]
tick_interval_ms = 250

[stats.category_calories]
yoga = "60-100"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.player.tick_interval_ms, 250);
        assert_eq!(config.player.idle_placeholder_seconds, 60); // default
        assert_eq!(
            config.stats.category_calories.get("yoga").map(String::as_str),
            Some("60-100")
        );
    }

    #[test]
    fn test_zero_interval_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[player]\ntick_interval_ms = 0\n").unwrap();

        let result = Config::load_from(&path);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.player.use_default_sequence = false;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert!(!loaded.player.use_default_sequence);
    }
}
