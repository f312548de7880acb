//! Forecast series, merged daily points and derived statistics

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Daily maximum temperatures for one city, index-aligned
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CitySeries {
    pub city_id: String,
    pub dates: Vec<NaiveDate>,
    /// Daily maximum in °C
    pub temperatures: Vec<f64>,
}

impl CitySeries {
    #[must_use]
    pub fn new(city_id: &str, dates: Vec<NaiveDate>, temperatures: Vec<f64>) -> Self {
        Self {
            city_id: city_id.to_string(),
            dates,
            temperatures,
        }
    }

    /// Number of forecast days
    #[must_use]
    pub fn len(&self) -> usize {
        self.temperatures.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.temperatures.is_empty()
    }
}

/// One day of the merged multi-city series
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DailyForecastPoint {
    pub date: NaiveDate,
    /// Short axis label such as `Jan 5`
    pub label: String,
    /// City id to daily maximum in °C
    pub temperatures: BTreeMap<String, f64>,
}

impl DailyForecastPoint {
    #[must_use]
    pub fn new(date: NaiveDate, temperatures: BTreeMap<String, f64>) -> Self {
        Self {
            date,
            label: format_day_label(date),
            temperatures,
        }
    }

    #[must_use]
    pub fn temperature(&self, city_id: &str) -> Option<f64> {
        self.temperatures.get(city_id).copied()
    }

    /// Warmest city on this day
    #[must_use]
    pub fn max_temperature(&self) -> Option<f64> {
        self.temperatures.values().copied().reduce(f64::max)
    }
}

/// Month abbreviation and unpadded day, e.g. `Jan 5`
#[must_use]
pub fn format_day_label(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CityAverage {
    pub city_id: String,
    /// Mean daily maximum, rounded to one decimal
    pub average_temp_c: f64,
}

/// Result of one successful fetch cycle
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    pub series: Vec<DailyForecastPoint>,
    /// One entry per city, in configuration order
    pub averages: Vec<CityAverage>,
    /// Highest daily maximum across all cities and days
    pub peak: f64,
    pub fetched_at: DateTime<Utc>,
}

impl WeatherReport {
    #[must_use]
    pub fn average_for(&self, city_id: &str) -> Option<f64> {
        self.averages
            .iter()
            .find(|avg| avg.city_id == city_id)
            .map(|avg| avg.average_temp_c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(2024, 1, 5, "Jan 5")]
    #[case(2024, 11, 23, "Nov 23")]
    #[case(2025, 6, 1, "Jun 1")]
    fn test_day_label(#[case] y: i32, #[case] m: u32, #[case] d: u32, #[case] expected: &str) {
        let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        assert_eq!(format_day_label(date), expected);
    }

    #[test]
    fn test_point_max_temperature() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let point = DailyForecastPoint::new(
            date,
            BTreeMap::from([
                ("london".to_string(), 8.5),
                ("taipei".to_string(), 21.0),
            ]),
        );
        assert_eq!(point.label, "Jan 15");
        assert_eq!(point.max_temperature(), Some(21.0));
        assert_eq!(point.temperature("london"), Some(8.5));
        assert_eq!(point.temperature("berlin"), None);
    }
}
