//! Forecast providers
//!
//! A [`ForecastProvider`] turns a configured [`City`] into its daily
//! maximum temperature series. The dashboard only depends on this trait;
//! [`open_meteo::OpenMeteoClient`] is the HTTP implementation.

use async_trait::async_trait;

use crate::error::DashboardError;
use crate::models::{City, CitySeries};

pub mod open_meteo;

pub use open_meteo::OpenMeteoClient;

#[async_trait]
pub trait ForecastProvider: Send + Sync {
    /// Fetch the daily maximum temperatures for `city` in its own time zone
    async fn daily_max(&self, city: &City) -> Result<CitySeries, DashboardError>;
}
