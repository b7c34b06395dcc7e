//! Configuration file support for fitcalc.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/fitcalc/config.toml`.

use crate::energy::DEFAULT_DESIRED_DEFICIT;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub calculation: CalculationConfig,

    #[serde(default)]
    pub display: DisplayConfig,
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

impl DataConfig {
    /// Path of the preference store inside the data directory
    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir.join("preferences.json")
    }
}

/// Calculation defaults
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CalculationConfig {
    /// Desired daily deficit prefilled into a fresh form (kcal)
    #[serde(default = "default_desired_deficit")]
    pub default_desired_deficit: f64,
}

impl Default for CalculationConfig {
    fn default() -> Self {
        Self {
            default_desired_deficit: default_desired_deficit(),
        }
    }
}

/// Display precision
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DisplayConfig {
    #[serde(default = "default_weight_decimals")]
    pub weight_decimals: u32,

    #[serde(default)]
    pub height_decimals_cm: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            weight_decimals: default_weight_decimals(),
            height_decimals_cm: 0,
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("fitcalc")
}

fn default_desired_deficit() -> f64 {
    DEFAULT_DESIRED_DEFICIT
}

fn default_weight_decimals() -> u32 {
    1
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!(
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

    /// Reject settings the calculator cannot work with
    pub fn validate(&self) -> Result<()> {
        let deficit = self.calculation.default_desired_deficit;
        if !deficit.is_finite() || deficit <= 0.0 {
            return Err(Error::Config(format!(
                "default_desired_deficit must be positive, got {}",
                deficit
            )));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("fitcalc").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
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
