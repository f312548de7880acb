//! Merging per-city forecast series and computing summary statistics

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{debug, warn};

use crate::error::DashboardError;
use crate::models::{CityAverage, CitySeries, DailyForecastPoint, WeatherReport};

/// Round to one decimal place using the exact binary value.
///
/// `0.15` is stored slightly below 0.15 and rounds to `0.1`; only values
/// that sit exactly on a half (such as `0.25`) round away from zero.
#[must_use]
pub fn round_one_decimal(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let magnitude = value.abs();
    let lower = (magnitude * 10.0).floor();
    // sign of the exact `magnitude * 10 - (lower + 0.5)`
    let above_half = magnitude.mul_add(10.0, -(lower + 0.5));
    let tenths = if above_half >= 0.0 { lower + 1.0 } else { lower };
    (tenths / 10.0).copysign(value)
}

/// Merge per-city series by index into daily points.
///
/// Every series must have the same number of days as the first one;
/// a shorter or longer series is rejected. Dates are taken from the first
/// series.
pub fn merge_series(series: &[CitySeries]) -> Result<Vec<DailyForecastPoint>, DashboardError> {
    let Some(first) = series.first() else {
        return Err(DashboardError::EmptySeries);
    };

    let expected = first.len();
    if expected == 0 {
        return Err(DashboardError::EmptySeries);
    }

    for city in series {
        if city.len() != expected || city.dates.len() != city.temperatures.len() {
            return Err(DashboardError::LengthMismatch {
                city: city.city_id.clone(),
                expected,
                actual: city.len().min(city.dates.len()),
            });
        }
    }

    let points = (0..expected)
        .map(|index| {
            let date = first.dates[index];
            let temperatures: BTreeMap<String, f64> = series
                .iter()
                .map(|city| {
                    if city.dates[index] != date {
                        warn!(
                            city = %city.city_id,
                            index,
                            expected = %date,
                            actual = %city.dates[index],
                            "Forecast dates are not aligned"
                        );
                    }
                    (city.city_id.clone(), city.temperatures[index])
                })
                .collect();
            DailyForecastPoint::new(date, temperatures)
        })
        .collect();

    Ok(points)
}

/// Mean of each city's column over the merged series, in the order given
#[must_use]
pub fn city_averages(points: &[DailyForecastPoint], city_ids: &[&str]) -> Vec<CityAverage> {
    city_ids
        .iter()
        .filter_map(|id| {
            let values: Vec<f64> = points.iter().filter_map(|p| p.temperature(id)).collect();
            if values.is_empty() {
                return None;
            }
            #[allow(clippy::cast_precision_loss)]
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            Some(CityAverage {
                city_id: (*id).to_string(),
                average_temp_c: round_one_decimal(mean),
            })
        })
        .collect()
}

/// Highest value across all cities and all days
#[must_use]
pub fn peak_temperature(points: &[DailyForecastPoint]) -> Option<f64> {
    points
        .iter()
        .filter_map(DailyForecastPoint::max_temperature)
        .reduce(f64::max)
}

/// Merge, average and find the peak in one step
pub fn build_report(series: &[CitySeries]) -> Result<WeatherReport, DashboardError> {
    let points = merge_series(series)?;
    let city_ids: Vec<&str> = series.iter().map(|s| s.city_id.as_str()).collect();
    let averages = city_averages(&points, &city_ids);
    let peak = peak_temperature(&points).ok_or(DashboardError::EmptySeries)?;

    debug!(
        days = points.len(),
        cities = city_ids.len(),
        peak,
        "Built weather report"
    );

    Ok(WeatherReport {
        series: points,
        averages,
        peak,
        fetched_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};
    use rstest::rstest;

    fn week(start: &str) -> Vec<NaiveDate> {
        let start = NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap();
        (0..7).map(|i| start + Days::new(i)).collect()
    }

    fn sample_series() -> Vec<CitySeries> {
        vec![
            CitySeries::new(
                "london",
                week("2024-01-15"),
                vec![10.0, 12.0, 14.0, 16.0, 18.0, 20.0, 22.0],
            ),
            CitySeries::new(
                "berlin",
                week("2024-01-15"),
                vec![5.0, 7.0, 9.0, 11.0, 13.0, 15.0, 17.0],
            ),
            CitySeries::new("taipei", week("2024-01-15"), vec![25.0; 7]),
        ]
    }

    #[test]
    fn test_report_for_known_week() {
        let report = build_report(&sample_series()).unwrap();

        assert_eq!(report.series.len(), 7);
        assert_eq!(report.average_for("london"), Some(16.0));
        assert_eq!(report.average_for("berlin"), Some(11.0));
        assert_eq!(report.average_for("taipei"), Some(25.0));
        assert_eq!(report.peak, 25.0);

        let ids: Vec<&str> = report.averages.iter().map(|a| a.city_id.as_str()).collect();
        assert_eq!(ids, ["london", "berlin", "taipei"]);
    }

    #[test]
    fn test_merge_pairs_same_index() {
        let points = merge_series(&sample_series()).unwrap();
        let third = &points[2];
        assert_eq!(third.label, "Jan 17");
        assert_eq!(third.temperature("london"), Some(14.0));
        assert_eq!(third.temperature("berlin"), Some(9.0));
        assert_eq!(third.temperature("taipei"), Some(25.0));
    }

    #[test]
    fn test_peak_is_true_maximum() {
        let mut series = sample_series();
        series[1].temperatures[4] = 31.7;
        let report = build_report(&series).unwrap();
        assert_eq!(report.peak, 31.7);
    }

    #[rstest]
    #[case(&[10.0, 10.0, 10.05], 10.0)]
    #[case(&[1.0, 2.0], 1.5)]
    #[case(&[20.1, 20.2, 20.2], 20.2)]
    #[case(&[-3.0, -4.0, -4.0], -3.7)]
    #[case(&[0.15], 0.1)]
    #[case(&[1.15], 1.1)]
    #[case(&[0.25], 0.3)]
    fn test_average_rounding(#[case] values: &[f64], #[case] expected: f64) {
        let dates = week("2024-03-01")[..values.len()].to_vec();
        let series = vec![CitySeries::new("x", dates, values.to_vec())];
        let report = build_report(&series).unwrap();
        assert_eq!(report.average_for("x"), Some(expected));
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let mut series = sample_series();
        series[2].dates.pop();
        series[2].temperatures.pop();

        let err = merge_series(&series).unwrap_err();
        match err {
            DashboardError::LengthMismatch {
                city,
                expected,
                actual,
            } => {
                assert_eq!(city, "taipei");
                assert_eq!(expected, 7);
                assert_eq!(actual, 6);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_misaligned_dates_use_first_city() {
        let mut series = sample_series();
        series[2].dates = week("2024-01-16");
        let points = merge_series(&series).unwrap();
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert!(matches!(merge_series(&[]), Err(DashboardError::EmptySeries)));

        let empty = vec![CitySeries::new("london", Vec::new(), Vec::new())];
        assert!(matches!(
            build_report(&empty),
            Err(DashboardError::EmptySeries)
        ));
    }

    #[rstest]
    #[case(0.05, 0.1)]
    #[case(16.04, 16.0)]
    #[case(-0.25, -0.3)]
    #[case(0.15, 0.1)]
    #[case(1.15, 1.1)]
    #[case(2.35, 2.4)]
    #[case(0.35, 0.3)]
    #[case(0.3, 0.3)]
    #[case(12.75, 12.8)]
    fn test_round_one_decimal(#[case] input: f64, #[case] expected: f64) {
        assert_eq!(round_one_decimal(input), expected);
    }
}
