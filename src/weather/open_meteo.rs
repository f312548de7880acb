//! Open-Meteo daily forecast client
//!
//! Requests `daily=temperature_2m_max` for one city at a time, using the
//! city's own time zone so that days line up with local calendar dates.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info, instrument, warn};

use super::ForecastProvider;
use crate::config::WeatherConfig;
use crate::error::DashboardError;
use crate::models::{City, CitySeries};

const DAILY_VARIABLE: &str = "temperature_2m_max";

/// Daily forecast response from Open-Meteo; only the fields we read
#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    pub daily: Option<DailyData>,
}

#[derive(Debug, Deserialize)]
pub struct DailyData {
    pub time: Vec<String>,
    #[serde(rename = "temperature_2m_max")]
    pub temperature_max: Option<Vec<Option<f64>>>,
}

impl ForecastResponse {
    /// Convert the `daily` block into an index-aligned series
    pub fn into_series(self, city_id: &str) -> Result<CitySeries, DashboardError> {
        let daily = self
            .daily
            .ok_or_else(|| DashboardError::parse(city_id, "response has no daily block"))?;
        let temperatures = daily.temperature_max.ok_or_else(|| {
            DashboardError::parse(city_id, format!("response has no {DAILY_VARIABLE} values"))
        })?;

        if temperatures.len() != daily.time.len() {
            return Err(DashboardError::parse(
                city_id,
                format!(
                    "{} dates but {} temperatures",
                    daily.time.len(),
                    temperatures.len()
                ),
            ));
        }

        let dates = daily
            .time
            .iter()
            .map(|day| {
                NaiveDate::parse_from_str(day, "%Y-%m-%d")
                    .map_err(|e| DashboardError::parse(city_id, format!("invalid date '{day}': {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let temperatures = temperatures
            .into_iter()
            .zip(&dates)
            .map(|(value, date)| {
                value.ok_or_else(|| {
                    DashboardError::parse(city_id, format!("missing temperature for {date}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CitySeries::new(city_id, dates, temperatures))
    }
}

/// Open-Meteo HTTP client
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: Client,
    base_url: String,
    forecast_days: Option<u8>,
}

impl OpenMeteoClient {
    /// Create a new client from the weather configuration
    pub fn new(config: &WeatherConfig) -> Result<Self, DashboardError> {
        let mut builder = Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if config.timeout_seconds > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_seconds.into()));
        }

        let client = builder
            .build()
            .map_err(|e| DashboardError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            forecast_days: config.forecast_days,
        })
    }

    /// Build the forecast URL for a city
    #[must_use]
    pub fn forecast_url(&self, city: &City) -> String {
        let mut url = format!(
            "{}/forecast?latitude={}&longitude={}&daily={}&timezone={}",
            self.base_url,
            city.latitude,
            city.longitude,
            DAILY_VARIABLE,
            urlencoding::encode(&city.timezone)
        );
        if let Some(days) = self.forecast_days {
            url.push_str(&format!("&forecast_days={days}"));
        }
        url
    }
}

#[async_trait]
impl ForecastProvider for OpenMeteoClient {
    #[instrument(skip(self, city), fields(city = %city.id))]
    async fn daily_max(&self, city: &City) -> Result<CitySeries, DashboardError> {
        let url = self.forecast_url(city);
        debug!("Open-Meteo request URL: {}", url);
        let start_time = Instant::now();

        let response = self.client.get(&url).send().await.map_err(|e| {
            error!("Forecast request for {} failed: {}", city.name, e);
            DashboardError::network(&city.id, e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Forecast API returned {} for {}", status, city.name);
            return Err(DashboardError::Http {
                city: city.id.clone(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| DashboardError::network(&city.id, e.to_string()))?;

        let parse_start = Instant::now();
        let parsed: ForecastResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse forecast response for {}: {}", city.name, e);
            DashboardError::parse(&city.id, e.to_string())
        })?;
        let series = parsed.into_series(&city.id)?;

        let total_duration = start_time.elapsed();
        info!(
            "Retrieved {}-day forecast for {} in {:.3}s (parse: {:.3}s)",
            series.len(),
            city.name,
            total_duration.as_secs_f64(),
            parse_start.elapsed().as_secs_f64()
        );

        if total_duration.as_secs() > 5 {
            warn!(
                "Slow forecast API response: {:.3}s",
                total_duration.as_secs_f64()
            );
        }

        Ok(series)
    }
}
