//! Weather dashboard service
//!
//! A refresh fans out one forecast request per city, waits for all of them
//! to settle, then merges and aggregates the series. The outcome is
//! published through a watch channel as a whole [`DashboardState`], so
//! observers never see a half-updated dashboard.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared, join_all};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, watch};
use tokio::task::AbortHandle;
use tracing::{Instrument, error, info, instrument, warn};

use crate::aggregate;
use crate::error::DashboardError;
use crate::models::{City, CitySeries, DailyForecastPoint, WeatherReport};
use crate::weather::ForecastProvider;

/// Published dashboard state
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardState {
    Loading,
    Ready(WeatherReport),
    Error(String),
}

impl DashboardState {
    #[must_use]
    pub fn status(&self) -> Status {
        match self {
            DashboardState::Loading => Status::Loading,
            DashboardState::Ready(_) => Status::Ready,
            DashboardState::Error(_) => Status::Error,
        }
    }

    #[must_use]
    pub fn report(&self) -> Option<&WeatherReport> {
        match self {
            DashboardState::Ready(report) => Some(report),
            _ => None,
        }
    }

    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            DashboardState::Error(message) => Some(message.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Loading,
    Ready,
    Error,
}

/// City metadata a front end needs to draw the chart legend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityLegend {
    pub id: String,
    pub name: String,
    pub color: String,
}

impl From<&City> for CityLegend {
    fn from(city: &City) -> Self {
        Self {
            id: city.id.clone(),
            name: city.name.clone(),
            color: city.color.clone(),
        }
    }
}

/// Flat JSON shape of the dashboard consumed by presentation layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub status: Status,
    pub cities: Vec<CityLegend>,
    pub series: Vec<DailyForecastPoint>,
    pub averages: BTreeMap<String, f64>,
    pub peak: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<DateTime<Utc>>,
}

impl DashboardView {
    #[must_use]
    pub fn new(state: &DashboardState, cities: &[City]) -> Self {
        let report = state.report();
        Self {
            status: state.status(),
            cities: cities.iter().map(CityLegend::from).collect(),
            series: report.map(|r| r.series.clone()).unwrap_or_default(),
            averages: report
                .map(|r| {
                    r.averages
                        .iter()
                        .map(|avg| (avg.city_id.clone(), avg.average_temp_c))
                        .collect()
                })
                .unwrap_or_default(),
            peak: report.map(|r| r.peak),
            error_message: state.error_message().map(str::to_string),
            fetched_at: report.map(|r| r.fetched_at),
        }
    }
}

/// Outcome of the cycle currently in flight, shared by every waiter
type RefreshOutcome = Shared<BoxFuture<'static, DashboardState>>;

struct InFlight {
    task: AbortHandle,
    outcome: RefreshOutcome,
}

/// Fetches, aggregates and publishes forecasts for a fixed set of cities
pub struct Dashboard {
    provider: Arc<dyn ForecastProvider>,
    cities: Arc<[City]>,
    state: Arc<watch::Sender<DashboardState>>,
    in_flight: Mutex<Option<InFlight>>,
}

impl Dashboard {
    #[must_use]
    pub fn new(provider: Arc<dyn ForecastProvider>, cities: Vec<City>) -> Self {
        let (state, _rx) = watch::channel(DashboardState::Loading);
        Self {
            provider,
            cities: cities.into(),
            state: Arc::new(state),
            in_flight: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    /// Last published state
    #[must_use]
    pub fn snapshot(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn view(&self) -> DashboardView {
        DashboardView::new(&self.state.borrow(), &self.cities)
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.subscribe()
    }

    /// Run one fetch cycle and publish its outcome.
    ///
    /// Calls made while a cycle is in flight wait for that cycle and return
    /// its result instead of starting another one. The cycle runs on its own
    /// task, so dropping the returned future does not stop it from
    /// publishing.
    #[instrument(skip(self), fields(cities = self.cities.len()))]
    pub async fn refresh(&self) -> DashboardState {
        let outcome = {
            let mut in_flight = self.in_flight.lock().await;
            match in_flight.as_ref() {
                Some(cycle) if !cycle.task.is_finished() => {
                    info!("Refresh already in flight, waiting for it");
                    cycle.outcome.clone()
                }
                _ => {
                    let cycle = self.start_cycle();
                    let outcome = cycle.outcome.clone();
                    *in_flight = Some(cycle);
                    outcome
                }
            }
        };
        outcome.await
    }

    fn start_cycle(&self) -> InFlight {
        self.state.send_replace(DashboardState::Loading);

        let provider = Arc::clone(&self.provider);
        let cities = Arc::clone(&self.cities);
        let state = Arc::clone(&self.state);
        let task = tokio::spawn(
            async move {
                let next = run_cycle(provider.as_ref(), &cities).await;
                state.send_replace(next.clone());
                next
            }
            .in_current_span(),
        );

        let abort = task.abort_handle();
        let state = Arc::clone(&self.state);
        let outcome = async move {
            match task.await {
                Ok(next) => next,
                Err(e) => {
                    error!("Dashboard refresh task failed: {}", e);
                    let next = DashboardState::Error(format!("Refresh failed: {e}"));
                    state.send_replace(next.clone());
                    next
                }
            }
        }
        .boxed()
        .shared();

        InFlight {
            task: abort,
            outcome,
        }
    }
}

/// Fetch, aggregate and turn the outcome into the state to publish
async fn run_cycle(provider: &dyn ForecastProvider, cities: &[City]) -> DashboardState {
    let start_time = Instant::now();

    match fetch_report(provider, cities).await {
        Ok(report) => {
            info!(
                "Dashboard ready: {} days, peak {:.1}°C in {:.3}s",
                report.series.len(),
                report.peak,
                start_time.elapsed().as_secs_f64()
            );
            DashboardState::Ready(report)
        }
        Err(e) => {
            error!(
                failed_cities = ?e.failed_cities(),
                "Dashboard refresh failed: {}", e
            );
            DashboardState::Error(e.user_message())
        }
    }
}

/// Fan out one request per city, wait for all, then aggregate
async fn fetch_report(
    provider: &dyn ForecastProvider,
    cities: &[City],
) -> Result<WeatherReport, DashboardError> {
    let results = join_all(cities.iter().map(|city| provider.daily_max(city))).await;

    let series = collect_series(results)?;
    aggregate::build_report(&series)
}

/// Status and transport failures of any city become one `FetchFailed`;
/// otherwise the first parse failure is reported.
fn collect_series(
    results: Vec<Result<CitySeries, DashboardError>>,
) -> Result<Vec<CitySeries>, DashboardError> {
    let mut series = Vec::with_capacity(results.len());
    let mut failed_cities = Vec::new();
    let mut first_other = None;

    for result in results {
        match result {
            Ok(city_series) => series.push(city_series),
            Err(e) if e.is_upstream() => {
                warn!("Upstream failure: {}", e);
                failed_cities.push(match e {
                    DashboardError::Http { city, .. } | DashboardError::Network { city, .. } => {
                        city
                    }
                    other => other.to_string(),
                });
            }
            Err(e) => {
                if first_other.is_none() {
                    first_other = Some(e);
                }
            }
        }
    }

    if !failed_cities.is_empty() {
        return Err(DashboardError::FetchFailed {
            cities: failed_cities,
        });
    }
    if let Some(e) = first_other {
        return Err(e);
    }
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Days, NaiveDate};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Provider that answers from a table, optionally after a delay
    struct StubProvider {
        temperatures: HashMap<String, Vec<f64>>,
        failing: std::sync::Mutex<Vec<String>>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl StubProvider {
        fn new(entries: &[(&str, Vec<f64>)]) -> Self {
            Self {
                temperatures: entries
                    .iter()
                    .map(|(id, temps)| ((*id).to_string(), temps.clone()))
                    .collect(),
                failing: std::sync::Mutex::new(Vec::new()),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        fn delayed(delay: Duration) -> Self {
            Self {
                delay,
                ..sample_provider()
            }
        }

        fn fail_for(&self, ids: &[&str]) {
            *self.failing.lock().unwrap() = ids.iter().map(|id| (*id).to_string()).collect();
        }
    }

    #[async_trait]
    impl ForecastProvider for StubProvider {
        async fn daily_max(&self, city: &City) -> Result<CitySeries, DashboardError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.failing.lock().unwrap().contains(&city.id) {
                return Err(DashboardError::Http {
                    city: city.id.clone(),
                    status: 500,
                });
            }
            let temps = self.temperatures[&city.id].clone();
            let start = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
            let dates = (0..temps.len() as u64).map(|i| start + Days::new(i)).collect();
            Ok(CitySeries::new(&city.id, dates, temps))
        }
    }

    fn sample_provider() -> StubProvider {
        StubProvider::new(&[
            ("london", vec![10.0, 12.0, 14.0, 16.0, 18.0, 20.0, 22.0]),
            ("berlin", vec![5.0, 7.0, 9.0, 11.0, 13.0, 15.0, 17.0]),
            ("taipei", vec![25.0; 7]),
        ])
    }

    #[tokio::test]
    async fn test_refresh_publishes_report() {
        let dashboard = Dashboard::new(Arc::new(sample_provider()), City::defaults());
        assert_eq!(dashboard.snapshot(), DashboardState::Loading);

        let state = dashboard.refresh().await;
        let report = state.report().unwrap();
        assert_eq!(report.average_for("london"), Some(16.0));
        assert_eq!(report.average_for("berlin"), Some(11.0));
        assert_eq!(report.average_for("taipei"), Some(25.0));
        assert_eq!(report.peak, 25.0);
        assert_eq!(dashboard.snapshot(), state);
    }

    #[tokio::test]
    async fn test_any_http_failure_fails_whole_refresh() {
        let provider = Arc::new(sample_provider());
        provider.fail_for(&["berlin"]);
        let dashboard = Dashboard::new(provider.clone(), City::defaults());

        let state = dashboard.refresh().await;
        assert_eq!(state.status(), Status::Error);
        assert_eq!(
            state.error_message(),
            Some(crate::error::FETCH_FAILED_MESSAGE)
        );
        assert!(state.report().is_none());
        // all cities were still requested
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);

        let view = dashboard.view();
        assert!(view.series.is_empty());
        assert!(view.averages.is_empty());
        assert_eq!(view.peak, None);
    }

    #[tokio::test]
    async fn test_length_mismatch_becomes_error_state() {
        let provider = StubProvider::new(&[
            ("london", vec![10.0, 12.0, 14.0]),
            ("berlin", vec![5.0, 7.0]),
            ("taipei", vec![25.0, 25.0, 25.0]),
        ]);
        let dashboard = Dashboard::new(Arc::new(provider), City::defaults());
        let state = dashboard.refresh().await;
        assert!(state.error_message().unwrap().contains("berlin"));
    }

    #[tokio::test]
    async fn test_subscribers_see_loading_then_result() {
        let provider = Arc::new(StubProvider::delayed(Duration::from_millis(50)));
        let dashboard = Arc::new(Dashboard::new(provider, City::defaults()));
        let mut rx = dashboard.subscribe();
        rx.borrow_and_update();

        let refresh = tokio::spawn({
            let dashboard = dashboard.clone();
            async move { dashboard.refresh().await }
        });

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), DashboardState::Loading);

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().status(), Status::Ready);
        assert_eq!(refresh.await.unwrap().status(), Status::Ready);
    }

    #[tokio::test]
    async fn test_refresh_after_error_clears_it_before_ready() {
        let provider = Arc::new(StubProvider::delayed(Duration::from_millis(50)));
        provider.fail_for(&["taipei"]);
        let dashboard = Arc::new(Dashboard::new(provider.clone(), City::defaults()));

        assert_eq!(dashboard.refresh().await.status(), Status::Error);

        provider.fail_for(&[]);
        let mut rx = dashboard.subscribe();
        rx.borrow_and_update();

        let refresh = tokio::spawn({
            let dashboard = dashboard.clone();
            async move { dashboard.refresh().await }
        });

        rx.changed().await.unwrap();
        {
            let state = rx.borrow_and_update();
            assert_eq!(*state, DashboardState::Loading);
            assert_eq!(state.error_message(), None);
        }
        assert!(dashboard.view().error_message.is_none());

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().status(), Status::Ready);
        assert_eq!(refresh.await.unwrap().status(), Status::Ready);
    }

    #[tokio::test]
    async fn test_overlapping_refreshes_are_coalesced() {
        let provider = Arc::new(StubProvider::delayed(Duration::from_millis(50)));
        let dashboard = Arc::new(Dashboard::new(provider.clone(), City::defaults()));

        let first = tokio::spawn({
            let dashboard = dashboard.clone();
            async move { dashboard.refresh().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = dashboard.refresh().await;
        let first = first.await.unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_dropped_caller_does_not_stall_cycle() {
        let provider = Arc::new(StubProvider::delayed(Duration::from_millis(100)));
        let dashboard = Arc::new(Dashboard::new(provider.clone(), City::defaults()));

        let first = tokio::spawn({
            let dashboard = dashboard.clone();
            async move { dashboard.refresh().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = tokio::spawn({
            let dashboard = dashboard.clone();
            async move { dashboard.refresh().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        first.abort();

        let second = second.await.unwrap();
        assert_eq!(second.status(), Status::Ready);
        assert_eq!(dashboard.snapshot(), second);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_cycle_publishes_after_only_caller_is_dropped() {
        let provider = Arc::new(StubProvider::delayed(Duration::from_millis(50)));
        let dashboard = Arc::new(Dashboard::new(provider.clone(), City::defaults()));
        let mut rx = dashboard.subscribe();
        rx.borrow_and_update();

        let caller = tokio::spawn({
            let dashboard = dashboard.clone();
            async move { dashboard.refresh().await }
        });
        rx.changed().await.unwrap();
        caller.abort();

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().status(), Status::Ready);

        // a finished cycle is not reused
        tokio::time::sleep(Duration::from_millis(10)).await;
        dashboard.refresh().await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_view_of_ready_state() {
        let report = aggregate::build_report(&[CitySeries::new(
            "london",
            vec![NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()],
            vec![9.5],
        )])
        .unwrap();
        let cities = vec![City::new("london", "London", 51.5, 0.12, "Europe/London")];
        let view = DashboardView::new(&DashboardState::Ready(report), &cities);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["status"], "ready");
        assert_eq!(json["averages"]["london"], 9.5);
        assert_eq!(json["peak"], 9.5);
        assert_eq!(json["series"][0]["label"], "Jan 15");
        assert_eq!(json["cities"][0]["name"], "London");
        assert!(json.get("errorMessage").is_none());
    }
}
