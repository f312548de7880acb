//! JSON HTTP API for dashboard front ends

use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde_json::json;
use tracing::info;

use crate::counter::{CounterAction, CounterState, CounterStore};
use crate::dashboard::{Dashboard, DashboardView};
use crate::error::DashboardError;

/// Shared state behind every handler
#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Dashboard>,
    pub counter: CounterStore,
}

impl AppState {
    #[must_use]
    pub fn new(dashboard: Arc<Dashboard>, counter: CounterStore) -> Self {
        Self { dashboard, counter }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/weather", get(get_weather))
        .route("/api/weather/refresh", post(refresh_weather))
        .route("/api/counter", get(get_counter))
        .route("/api/counter/{action}", post(dispatch_counter))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn get_weather(State(state): State<AppState>) -> Json<DashboardView> {
    Json(state.dashboard.view())
}

async fn refresh_weather(State(state): State<AppState>) -> Json<DashboardView> {
    info!("Refresh requested over HTTP");
    state.dashboard.refresh().await;
    Json(state.dashboard.view())
}

async fn get_counter(State(state): State<AppState>) -> Json<CounterState> {
    Json(state.counter.get())
}

async fn dispatch_counter(
    State(state): State<AppState>,
    Path(action): Path<String>,
) -> Result<Json<CounterState>, ApiError> {
    let action: CounterAction = action.parse()?;
    Ok(Json(state.counter.dispatch(action)))
}

/// Maps library errors onto HTTP responses
pub struct ApiError(DashboardError);

impl From<DashboardError> for ApiError {
    fn from(err: DashboardError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            DashboardError::Validation { .. } => StatusCode::BAD_REQUEST,
            DashboardError::FetchFailed { .. }
            | DashboardError::Http { .. }
            | DashboardError::Network { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.user_message() }))).into_response()
    }
}
