//! `tempboard` - multi-city temperature dashboard and counter state demos
//!
//! This library provides the forecast fetching and aggregation behind the
//! weather dashboard, the two counter backends, and the text and HTTP
//! presentation layers used by the `tempboard` binary.

pub mod aggregate;
pub mod api;
pub mod config;
pub mod counter;
pub mod dashboard;
pub mod error;
pub mod logging;
pub mod models;
pub mod render;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use config::DashboardConfig;
pub use counter::{Counter, CounterAction, CounterState, CounterStore, LocalCounter};
pub use dashboard::{Dashboard, DashboardState, DashboardView, Status};
pub use error::DashboardError;
pub use models::{City, CityAverage, CitySeries, DailyForecastPoint, WeatherReport};
pub use weather::{ForecastProvider, OpenMeteoClient};
