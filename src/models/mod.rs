//! Data models for the tempboard dashboard
//!
//! This module contains the core domain models organized by concern:
//! - City: configured forecast locations and their display metadata
//! - Forecast: per-city series, merged daily points and derived statistics

pub mod city;
pub mod forecast;

// Re-export all public types for convenient access
pub use city::City;
pub use forecast::{CityAverage, CitySeries, DailyForecastPoint, WeatherReport};
