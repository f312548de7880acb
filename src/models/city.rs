//! City model for forecast coordinates and display metadata

use serde::{Deserialize, Serialize};

/// A location the dashboard fetches a forecast for
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct City {
    /// Stable identifier used as the key in merged series and averages
    pub id: String,
    /// Display name
    pub name: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// IANA time zone sent to the forecast API
    pub timezone: String,
    /// Chart colour for front ends
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    "#94a3b8".to_string()
}

impl City {
    /// Create a new city with the default colour
    #[must_use]
    pub fn new(id: &str, name: &str, latitude: f64, longitude: f64, timezone: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            latitude,
            longitude,
            timezone: timezone.to_string(),
            color: default_color(),
        }
    }

    #[must_use]
    pub fn with_color(mut self, color: &str) -> Self {
        self.color = color.to_string();
        self
    }

    /// London, Berlin and Taipei
    #[must_use]
    pub fn defaults() -> Vec<City> {
        vec![
            City::new("london", "London", 51.5074, 0.1278, "Europe/London").with_color("#3b82f6"),
            City::new("berlin", "Berlin", 52.52, 13.41, "Europe/Berlin").with_color("#ec4899"),
            City::new("taipei", "Taipei", 25.0330, 121.5654, "Asia/Taipei").with_color("#f59e0b"),
        ]
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Whether latitude and longitude are within their valid ranges
    #[must_use]
    pub fn has_valid_coordinates(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}
