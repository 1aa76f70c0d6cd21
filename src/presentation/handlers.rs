// HTTP request handlers
use crate::application::selection_controller::SelectionChange;
use crate::domain::error::DashboardError;
use crate::domain::occupancy::Granularity;
use crate::domain::selection::SelectionKey;
use crate::infrastructure::chunked_json::stream_from_watch;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct OccupancyQuery {
    pub year: String,
    pub period: String,
    pub month: Option<u32>,
}

#[derive(Deserialize)]
pub struct YearBody {
    pub year: String,
}

#[derive(Deserialize)]
pub struct GranularityBody {
    pub granularity: String,
}

#[derive(Deserialize)]
pub struct MonthBody {
    pub month: u32,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Full dashboard: device cards, year list and the current occupancy panel
pub async fn get_dashboard(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    respond(&state.composer.view(), accepts_brotli(&headers)).await
}

pub async fn list_devices(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    respond(&state.composer.devices(), accepts_brotli(&headers)).await
}

pub async fn list_years(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    respond(&state.composer.years(), accepts_brotli(&headers)).await
}

pub async fn current_occupancy(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    respond(&state.composer.occupancy(), accepts_brotli(&headers)).await
}

/// Render an explicit selection without changing the shared one
pub async fn query_occupancy(
    query: Result<Query<OccupancyQuery>, QueryRejection>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return error_response(DashboardError::invalid_selection(rejection.body_text())),
    };
    let granularity = match query.period.parse::<Granularity>() {
        Ok(granularity) => granularity,
        Err(e) => return error_response(e),
    };
    let month = query
        .month
        .unwrap_or_else(|| state.composer.occupancy().selection.month);
    let key = SelectionKey::new(query.year, granularity, month);

    match state.composer.query(key).await {
        Ok(bundle) => respond(&bundle, accepts_brotli(&headers)).await,
        Err(e) => error_response(e),
    }
}

pub async fn put_year(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<YearBody>, JsonRejection>,
) -> Response {
    match body {
        Ok(Json(body)) => select(&state, SelectionChange::Year(body.year), accepts_brotli(&headers)).await,
        Err(rejection) => body_rejected(rejection),
    }
}

pub async fn put_granularity(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<GranularityBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return body_rejected(rejection),
    };
    match body.granularity.parse::<Granularity>() {
        Ok(granularity) => {
            select(&state, SelectionChange::Granularity(granularity), accepts_brotli(&headers)).await
        }
        Err(e) => error_response(e),
    }
}

pub async fn put_month(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<MonthBody>, JsonRejection>,
) -> Response {
    match body {
        Ok(Json(body)) => select(&state, SelectionChange::Month(body.month), accepts_brotli(&headers)).await,
        Err(rejection) => body_rejected(rejection),
    }
}

/// Stream occupancy bundles as they are republished
pub async fn stream_occupancy(headers: HeaderMap, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    stream_from_watch(state.composer.subscribe(), accepts_brotli(&headers)).await
}

async fn select(state: &AppState, change: SelectionChange, compress: bool) -> Response {
    match state.composer.select(change).await {
        Ok(bundle) => respond(&bundle, compress).await,
        Err(e) => error_response(e),
    }
}

async fn respond<T: Serialize>(data: &T, compress: bool) -> Response {
    match json_response(StatusCode::OK, data, compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

fn body_rejected(rejection: JsonRejection) -> Response {
    error_response(DashboardError::invalid_selection(rejection.body_text()))
}

fn error_response(err: DashboardError) -> Response {
    let (status, error) = match &err {
        DashboardError::InvalidSelection(_) => (StatusCode::BAD_REQUEST, "invalid_selection"),
        DashboardError::EmptySeries => (StatusCode::NOT_FOUND, "no_data"),
        DashboardError::ControllerUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
        DashboardError::Provider(_) => (StatusCode::BAD_GATEWAY, "provider_error"),
        DashboardError::InvalidConfig(_) => (StatusCode::INTERNAL_SERVER_ERROR, "invalid_config"),
    };

    if status.is_server_error() {
        tracing::error!("Request failed: {}", err);
    }

    (
        status,
        Json(ErrorBody {
            error,
            message: err.to_string(),
        }),
    )
        .into_response()
}
