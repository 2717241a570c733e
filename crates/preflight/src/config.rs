//! Configuration management for preflight.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::storage::StorageKeys;
use crate::weather::Coordinate;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "preflight";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "preflight.db";

/// Prefix of environment variable overrides.
const ENV_PREFIX: &str = "PREFLIGHT_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `PREFLIGHT_`, sections separated
///    by `__`, e.g. `PREFLIGHT_WEATHER__TIMEOUT_SECS=5`)
/// 2. TOML config file at `~/.config/preflight/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Weather lookup configuration.
    pub weather: WeatherConfig,
    /// Mission rules.
    pub mission: MissionConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/preflight/preflight.db`
    pub database_path: Option<PathBuf>,
    /// Key holding the saved missions.
    pub missions_key: String,
    /// Key holding the aircraft profiles.
    pub profiles_key: String,
    /// Key holding the in-progress draft.
    pub draft_key: String,
}

/// Weather lookup configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Base URL of the National Weather Service API.
    pub api_base_url: String,
    /// `User-Agent` sent with every request; the service requires one.
    pub user_agent: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Home latitude, used when no coordinates are given on the command line.
    pub latitude: Option<f64>,
    /// Home longitude, used when no coordinates are given on the command line.
    pub longitude: Option<f64>,
}

/// Mission rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionConfig {
    /// Refuse to save a mission until every required item is satisfied.
    pub require_complete_checklist: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let keys = StorageKeys::default();
        Self {
            database_path: None, // Resolved at runtime
            missions_key: keys.missions,
            profiles_key: keys.profiles,
            draft_key: keys.draft,
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.weather.gov".to_string(),
            user_agent: format!("preflight/{} (uas checklist)", env!("CARGO_PKG_VERSION")),
            timeout_secs: 10,
            latitude: None,
            longitude: None,
        }
    }
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            require_complete_checklist: true,
        }
    }
}

impl WeatherConfig {
    /// Get the request timeout as a Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// A missing config file is not an error; defaults and environment
    /// variables still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let keys = [
            ("missions_key", &self.storage.missions_key),
            ("profiles_key", &self.storage.profiles_key),
            ("draft_key", &self.storage.draft_key),
        ];
        let mut seen = HashSet::new();
        for (name, key) in keys {
            if key.trim().is_empty() {
                return Err(Error::ConfigValidation {
                    message: format!("storage.{name} must not be empty"),
                });
            }
            if !seen.insert(key.as_str()) {
                return Err(Error::ConfigValidation {
                    message: format!("storage.{name} duplicates another key: {key}"),
                });
            }
        }

        if self.weather.timeout_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "weather.timeout_secs must be greater than 0".to_string(),
            });
        }

        if reqwest::Url::parse(&self.weather.api_base_url).is_err() {
            return Err(Error::ConfigValidation {
                message: format!("invalid weather.api_base_url: {}", self.weather.api_base_url),
            });
        }

        match (self.weather.latitude, self.weather.longitude) {
            (Some(latitude), Some(longitude)) => {
                Coordinate::new(latitude, longitude).map_err(|err| Error::ConfigValidation {
                    message: err.to_string(),
                })?;
            }
            (None, None) => {}
            _ => {
                return Err(Error::ConfigValidation {
                    message: "weather.latitude and weather.longitude must be set together"
                        .to_string(),
                });
            }
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// The configured storage key names.
    #[must_use]
    pub fn storage_keys(&self) -> StorageKeys {
        StorageKeys {
            missions: self.storage.missions_key.clone(),
            profiles: self.storage.profiles_key.clone(),
            draft: self.storage.draft_key.clone(),
        }
    }

    /// The configured home position, if both coordinates are set and valid.
    #[must_use]
    pub fn home_position(&self) -> Option<Coordinate> {
        let (latitude, longitude) = (self.weather.latitude?, self.weather.longitude?);
        Coordinate::new(latitude, longitude).ok()
    }
}
