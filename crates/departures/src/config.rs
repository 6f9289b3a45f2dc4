//! Configuration management for departures.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::collections::HashSet;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::i18n::Locale;
use crate::validate::ValidationRules;
use crate::view::{Theme, ViewState};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "departures";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "departures.db";

/// Default flat file name.
const FLAT_FILE_NAME: &str = "departures.csv";

/// Default view state file name.
const VIEW_STATE_FILE_NAME: &str = "view.json";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `DEPARTURES_`)
/// 2. TOML config file at `~/.config/departures/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Flat-file backend configuration.
    pub flat_file: FlatFileConfig,
    /// Form validation configuration.
    pub validation: ValidationConfig,
    /// View defaults.
    pub view: ViewConfig,
}

/// Which persistence backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Embedded `SQLite` database.
    #[default]
    Sqlite,
    /// Delimited text file.
    FlatFile,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Persistence backend.
    pub backend: Backend,
    /// Path to the database file.
    /// Defaults to `~/.local/share/departures/departures.db`
    pub database_path: Option<PathBuf>,
    /// Path to the flat file.
    /// Defaults to `~/.local/share/departures/departures.csv`
    pub flat_file_path: Option<PathBuf>,
}

/// Flat-file backend configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlatFileConfig {
    /// Hold an advisory exclusive lock across each read-modify-write.
    pub lock: bool,
}

/// Form validation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Reject gates that are not digits only.
    pub numeric_gate: bool,
    /// Require a destination on every departure.
    pub require_destination: bool,
    /// The closed list of destinations.
    pub destinations: Vec<String>,
}

/// View defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Where the view state is kept between invocations.
    /// Defaults to `~/.local/share/departures/view.json`
    pub state_path: Option<PathBuf>,
    /// Language for a fresh view state.
    pub default_locale: Locale,
    /// Theme for a fresh view state.
    pub default_theme: Theme,
}

impl Default for FlatFileConfig {
    fn default() -> Self {
        Self { lock: true }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            numeric_gate: true,
            require_destination: false,
            destinations: default_destinations(),
        }
    }
}

/// Default destination list.
#[must_use]
pub fn default_destinations() -> Vec<String> {
    [
        "Molde",
        "Ålesund",
        "Kristiansund",
        "Trondheim",
        "Oslo",
        "Bergen",
    ]
    .into_iter()
    .map(String::from)
    .collect()
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
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("DEPARTURES_").split("__"));

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
        if self.validation.destinations.is_empty() && self.validation.require_destination {
            return Err(Error::ConfigValidation {
                message: "require_destination is set but no destinations are configured"
                    .to_string(),
            });
        }

        let mut seen = HashSet::new();
        for destination in &self.validation.destinations {
            if destination.trim().is_empty() {
                return Err(Error::ConfigValidation {
                    message: "destinations must not contain empty names".to_string(),
                });
            }
            if !seen.insert(destination.trim().to_lowercase()) {
                return Err(Error::ConfigValidation {
                    message: format!("duplicate destination: {destination}"),
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

    /// Get the flat file path, resolving defaults if not set.
    #[must_use]
    pub fn flat_file_path(&self) -> PathBuf {
        self.storage
            .flat_file_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(FLAT_FILE_NAME))
    }

    /// Get the view state path, resolving defaults if not set.
    #[must_use]
    pub fn view_state_path(&self) -> PathBuf {
        self.view
            .state_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(VIEW_STATE_FILE_NAME))
    }

    /// Validation rules derived from the `validation` section.
    #[must_use]
    pub fn validation_rules(&self) -> ValidationRules {
        ValidationRules {
            numeric_gate: self.validation.numeric_gate,
            require_destination: self.validation.require_destination,
            destinations: self
                .validation
                .destinations
                .iter()
                .map(|d| d.trim().to_string())
                .collect(),
        }
    }

    /// A fresh view state with the configured defaults.
    #[must_use]
    pub fn initial_view_state(&self) -> ViewState {
        ViewState::with_defaults(self.view.default_locale, self.view.default_theme)
    }
}
