//! Plain-text rendering of the dashboard and the counter

use crate::counter::CounterState;
use crate::dashboard::DashboardState;
use crate::models::{City, WeatherReport};

const BAR_WIDTH: usize = 40;

/// Format a temperature the way the stat cards show it: whole numbers
/// without a fraction, everything else as is
#[must_use]
pub fn format_temperature(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}°C")
    } else {
        format!("{value}°C")
    }
}

/// Render the full dashboard for a terminal
#[must_use]
pub fn render_dashboard(state: &DashboardState, cities: &[City]) -> String {
    let names: Vec<&str> = cities.iter().map(|c| c.name.as_str()).collect();
    let mut out = String::from("Global Weather Analytics\n");
    out.push_str(&format!(
        "Temperature comparison between {}\n\n",
        join_names(&names)
    ));

    match state {
        DashboardState::Loading => out.push_str("Retrieving API Data...\n"),
        DashboardState::Error(message) => {
            out.push_str(&format!("Error: {message}\n"));
            out.push_str("Run the command again to retry.\n");
        }
        DashboardState::Ready(report) => {
            out.push_str(&format_stats(report, cities));
            out.push('\n');
            out.push_str(&format_chart(report, cities));
        }
    }
    out
}

fn join_names(names: &[&str]) -> String {
    match names {
        [] => String::new(),
        [only] => (*only).to_string(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}

fn format_stats(report: &WeatherReport, cities: &[City]) -> String {
    let width = cities
        .iter()
        .map(|c| c.name.chars().count() + 4)
        .max()
        .unwrap_or(0)
        .max("Peak Temp".len());

    let mut out = String::new();
    for city in cities {
        if let Some(avg) = report.average_for(&city.id) {
            let label = format!("{} Avg", city.name);
            out.push_str(&format!("{label:<width$}  {avg:.1}°C\n"));
        }
    }
    out.push_str(&format!(
        "{:<width$}  {}\n",
        "Peak Temp",
        format_temperature(report.peak)
    ));
    out
}

fn format_chart(report: &WeatherReport, cities: &[City]) -> String {
    let mut out = format!(
        "Temperature Trends (Next {} Days)\n",
        report.series.len()
    );

    let name_width = cities
        .iter()
        .map(|c| c.name.chars().count())
        .max()
        .unwrap_or(0);
    let bar_width = BAR_WIDTH;
    #[allow(clippy::cast_precision_loss)]
    let scale = if report.peak > 0.0 {
        bar_width as f64 / report.peak
    } else {
        0.0
    };

    for point in &report.series {
        out.push_str(&format!("{}\n", point.label));
        for city in cities {
            let Some(value) = point.temperature(&city.id) else {
                continue;
            };
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let len = (value.max(0.0) * scale).round() as usize;
            out.push_str(&format!(
                "  {:<name_width$} {:<bar_width$} {value:.1}°C\n",
                city.name,
                "█".repeat(len.min(bar_width)),
            ));
        }
    }
    out
}

/// Render the counter as its three buttons
#[must_use]
pub fn render_counter(state: &CounterState) -> String {
    let click = if state.disabled {
        format!("{} (disabled)", state.click_label())
    } else {
        state.click_label()
    };
    format!("[{click}] [CLEAR] [{}]", state.toggle_label())
}
