//! Configuration management for `tempboard`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::DashboardError;
use crate::models::City;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Forecast API configuration
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Cities shown on the dashboard, in display order
    #[serde(default = "City::defaults")]
    pub cities: Vec<City>,
}

/// Forecast API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Base URL for the Open-Meteo API
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Request timeout in seconds, 0 leaves requests unbounded
    #[serde(default = "default_weather_timeout")]
    pub timeout_seconds: u32,
    /// Number of forecast days; the API default (7) when unset
    #[serde(default)]
    pub forecast_days: Option<u8>,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
}

// Default value functions
fn default_weather_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_weather_timeout() -> u32 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    3000
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            timeout_seconds: default_weather_timeout(),
            forecast_days: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            weather: WeatherConfig::default(),
            logging: LoggingConfig::default(),
            server: ServerConfig::default(),
            cities: City::defaults(),
        }
    }
}

impl DashboardConfig {
    /// Load configuration from specified path.
    ///
    /// An explicit path must exist; without one the default location is
    /// used when present.
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = match config_path {
            Some(path) if !path.exists() => {
                bail!("Config file {} does not exist", path.display());
            }
            Some(path) => Some(path),
            None => {
                let default = Self::get_config_path()
                    .unwrap_or_else(|| PathBuf::from("config.toml"));
                default.exists().then_some(default)
            }
        };

        if let Some(config_file) = config_file {
            builder = builder.add_source(
                File::from(config_file)
                    .required(true)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. TEMPBOARD_WEATHER__TIMEOUT_SECONDS
        builder = builder.add_source(
            Environment::with_prefix("TEMPBOARD")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: DashboardConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        // Apply defaults for missing values
        config.apply_defaults();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tempboard").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.server.host.is_empty() {
            self.server.host = default_server_host();
        }
        if self.cities.is_empty() {
            self.cities = City::defaults();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<(), DashboardError> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        self.validate_cities()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<(), DashboardError> {
        if self.weather.timeout_seconds > 300 {
            return Err(DashboardError::config(
                "Weather API timeout cannot exceed 300 seconds",
            ));
        }

        if self
            .weather
            .forecast_days
            .is_some_and(|days| !(1..=16).contains(&days))
        {
            return Err(DashboardError::config(
                "Forecast days must be between 1 and 16",
            ));
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<(), DashboardError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(DashboardError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(DashboardError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            )));
        }

        if !self.weather.base_url.starts_with("http://")
            && !self.weather.base_url.starts_with("https://")
        {
            return Err(DashboardError::config(
                "Weather API base URL must be a valid HTTP or HTTPS URL",
            ));
        }

        Ok(())
    }

    /// Validate the configured cities
    fn validate_cities(&self) -> Result<(), DashboardError> {
        if self.cities.is_empty() {
            return Err(DashboardError::config("At least one city is required"));
        }

        let mut seen = HashSet::new();
        for city in &self.cities {
            if city.id.trim().is_empty() {
                return Err(DashboardError::config("City id cannot be empty"));
            }
            if !seen.insert(city.id.as_str()) {
                return Err(DashboardError::config(format!(
                    "Duplicate city id '{}'",
                    city.id
                )));
            }
            if !city.has_valid_coordinates() {
                return Err(DashboardError::config(format!(
                    "Invalid coordinates for '{}': {}",
                    city.id,
                    city.format_coordinates()
                )));
            }
            if city.timezone.parse::<chrono_tz::Tz>().is_err() {
                return Err(DashboardError::config(format!(
                    "Unknown time zone '{}' for '{}'",
                    city.timezone, city.id
                )));
            }
        }

        Ok(())
    }
}
