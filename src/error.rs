//! Error types and handling for the `tempboard` dashboard

use thiserror::Error;

/// Message shown when one or more forecast requests did not succeed
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch weather data from one or more APIs";

/// Main error type for the `tempboard` library
#[derive(Error, Debug)]
pub enum DashboardError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// The forecast API answered with a non-success status
    #[error("Forecast API returned HTTP {status} for {city}")]
    Http { city: String, status: u16 },

    /// The request never produced a response
    #[error("Network error for {city}: {message}")]
    Network { city: String, message: String },

    /// The response body could not be turned into a forecast series
    #[error("Invalid forecast data for {city}: {message}")]
    Parse { city: String, message: String },

    /// At least one city failed at the HTTP level; aggregation was aborted
    #[error("{}", FETCH_FAILED_MESSAGE)]
    FetchFailed { cities: Vec<String> },

    /// Per-city series cannot be merged by index
    #[error("Forecast for {city} has {actual} days, expected {expected}")]
    LengthMismatch {
        city: String,
        expected: usize,
        actual: usize,
    },

    /// No forecast days to aggregate
    #[error("Forecast contains no days")]
    EmptySeries,
}

impl DashboardError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new parse error for a city
    pub fn parse<C: Into<String>, S: Into<String>>(city: C, message: S) -> Self {
        Self::Parse {
            city: city.into(),
            message: message.into(),
        }
    }

    /// Create a new network error for a city
    pub fn network<C: Into<String>, S: Into<String>>(city: C, message: S) -> Self {
        Self::Network {
            city: city.into(),
            message: message.into(),
        }
    }

    /// Status and transport failures collapse into [`DashboardError::FetchFailed`]
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Http { .. } | Self::Network { .. })
    }

    /// Cities whose requests failed, for `FetchFailed`
    #[must_use]
    pub fn failed_cities(&self) -> &[String] {
        match self {
            Self::FetchFailed { cities } => cities,
            _ => &[],
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            DashboardError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            DashboardError::Validation { message } => format!("Invalid input: {message}"),
            DashboardError::Http { .. } | DashboardError::Network { .. } => {
                FETCH_FAILED_MESSAGE.to_string()
            }
            DashboardError::FetchFailed { .. }
            | DashboardError::Parse { .. }
            | DashboardError::LengthMismatch { .. }
            | DashboardError::EmptySeries => self.to_string(),
        }
    }
}
