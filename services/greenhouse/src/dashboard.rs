//! HTTP API and pages

use std::collections::HashMap;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Form, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Days, Local, NaiveDate};
use greenhouse_app::feedback::{CSRF_HEADER, SUCCESS_MESSAGE};
use greenhouse_app::model::LatestReading;
use serde::Deserialize;
use serde_json::json;

use crate::config::DashboardConfig;
use crate::csrf::{CsrfToken, CSRF_FIELD};
use crate::store::{self, SqlitePool};
use crate::thresholds;
use crate::{pages, GreenhouseError};

pub const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred. Please try again later.";

/// Shared state of the router
#[derive(Clone)]
pub struct DashboardState {
    pub pool: SqlitePool,
    pub csrf: CsrfToken,
    pub history_days: u64,
    pub poll_interval: Duration,
}

impl DashboardState {
    pub fn new(pool: SqlitePool, csrf: CsrfToken, config: &DashboardConfig) -> Self {
        Self {
            pool,
            csrf,
            history_days: config.history_days,
            poll_interval: Duration::from_secs(config.poll_interval_seconds),
        }
    }
}

/// Build the dashboard axum router
pub fn build_router(state: DashboardState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/history", get(history_page_handler))
        .route("/api/history", get(history_api_handler))
        .route("/latest_sensor_data", get(latest_handler))
        .route("/alerts", get(alerts_handler))
        .route("/api/alerts/{id}/resolve", post(resolve_alert_handler))
        .route("/api/sensor_data", post(sensor_data_handler))
        .route("/api/submit_feedback", post(submit_feedback_handler))
        .route(
            "/settings",
            get(settings_handler).post(update_settings_handler),
        )
        .route("/health", get(health_handler))
        .with_state(state)
}

/// JSON `{"error": ...}` response
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<GreenhouseError> for ApiError {
    fn from(e: GreenhouseError) -> Self {
        match e {
            GreenhouseError::Validation(message) => Self::new(StatusCode::BAD_REQUEST, message),
            GreenhouseError::NotFound(message) => Self::new(StatusCode::NOT_FOUND, message),
            other => {
                tracing::error!("Request failed: {}", other);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    start: Option<String>,
    end: Option<String>,
}

impl HistoryQuery {
    /// Resolve the requested range, defaulting to the last `days` days
    fn range(&self, days: u64) -> crate::Result<(NaiveDate, NaiveDate)> {
        let end = match parse_date("end", self.end.as_deref())? {
            Some(end) => end,
            None => Local::now().date_naive(),
        };
        let start = match parse_date("start", self.start.as_deref())? {
            Some(start) => start,
            None => end.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN),
        };
        if start > end {
            return Err(GreenhouseError::Validation(format!(
                "start ({}) is after end ({})",
                start, end
            )));
        }
        Ok((start, end))
    }
}

fn parse_date(field: &str, raw: Option<&str>) -> crate::Result<Option<NaiveDate>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                GreenhouseError::Validation(format!(
                    "{} must be a YYYY-MM-DD date, got '{}'",
                    field, raw
                ))
            }),
    }
}

async fn index_handler(State(dashboard): State<DashboardState>) -> ApiResult<Html<String>> {
    let (latest, alerts) = store::with_conn(&dashboard.pool, |conn| {
        Ok((store::latest_reading(conn)?, store::active_alerts(conn)?))
    })
    .await?;

    Ok(Html(pages::dashboard_page(
        latest.as_ref(),
        &alerts,
        &dashboard.csrf,
        dashboard.poll_interval,
    )))
}

async fn history_page_handler(
    State(dashboard): State<DashboardState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Html<String>> {
    let (start, end) = query.range(dashboard.history_days)?;
    let records =
        store::with_conn(&dashboard.pool, move |conn| store::daily_averages(conn, start, end))
            .await?;

    Ok(Html(pages::history_page(&records, start, end, &dashboard.csrf)))
}

async fn history_api_handler(
    State(dashboard): State<DashboardState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<impl IntoResponse> {
    let (start, end) = query.range(dashboard.history_days)?;
    let records =
        store::with_conn(&dashboard.pool, move |conn| store::daily_averages(conn, start, end))
            .await?;
    tracing::debug!("History {}..={}: {} days", start, end, records.len());
    Ok(Json(records))
}

async fn latest_handler(State(dashboard): State<DashboardState>) -> ApiResult<impl IntoResponse> {
    let latest = store::with_conn(&dashboard.pool, |conn| store::latest_reading(conn)).await?;
    Ok(Json(latest.unwrap_or_default()))
}

async fn alerts_handler(State(dashboard): State<DashboardState>) -> ApiResult<impl IntoResponse> {
    let alerts = store::with_conn(&dashboard.pool, |conn| store::active_alerts(conn)).await?;
    Ok(Json(alerts))
}

async fn resolve_alert_handler(
    State(dashboard): State<DashboardState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let resolved =
        store::with_conn(&dashboard.pool, move |conn| store::resolve_alert(conn, id)).await?;
    if !resolved {
        return Err(GreenhouseError::NotFound(format!("Alert {} not found", id)).into());
    }
    tracing::info!("Alert {} resolved", id);
    Ok(Json(json!({ "id": id, "status": thresholds::RESOLVED_STATUS })))
}

async fn sensor_data_handler(
    State(dashboard): State<DashboardState>,
    Json(reading): Json<LatestReading>,
) -> ApiResult<impl IntoResponse> {
    tracing::debug!("Received reading: {:?}", reading);
    let alerts =
        store::with_conn(&dashboard.pool, move |conn| store::record_reading(conn, &reading))
            .await?;
    Ok(Json(json!({ "alerts": alerts })))
}

#[derive(Debug, Deserialize)]
struct FeedbackBody {
    #[serde(default)]
    feedback: String,
}

async fn submit_feedback_handler(
    State(dashboard): State<DashboardState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let token = headers
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !dashboard.csrf.verify(token) {
        tracing::warn!("Feedback rejected: bad CSRF token");
        return Err(ApiError::new(StatusCode::FORBIDDEN, "Invalid CSRF token"));
    }

    let body: FeedbackBody = serde_json::from_slice(&body).map_err(|e| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            format!("Invalid request body: {}", e),
        )
    })?;
    let feedback = body.feedback.trim().to_string();
    if feedback.is_empty() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "Feedback cannot be empty"));
    }

    store::with_conn(&dashboard.pool, move |conn| {
        store::insert_feedback(conn, &feedback, &store::now_timestamp())
    })
    .await?;
    tracing::info!("Feedback received");

    Ok(Json(json!({ "message": SUCCESS_MESSAGE })))
}

async fn settings_handler(State(dashboard): State<DashboardState>) -> ApiResult<impl IntoResponse> {
    let ranges = store::with_conn(&dashboard.pool, |conn| store::thresholds(conn)).await?;
    Ok(Json(ranges))
}

async fn update_settings_handler(
    State(dashboard): State<DashboardState>,
    Form(form): Form<HashMap<String, String>>,
) -> ApiResult<Redirect> {
    let token = form.get(CSRF_FIELD).map(String::as_str).unwrap_or_default();
    if !dashboard.csrf.verify(token) {
        tracing::warn!("Settings update rejected: bad CSRF token");
        return Err(ApiError::new(StatusCode::FORBIDDEN, "Invalid CSRF token"));
    }

    let updates = thresholds::parse_settings_form(&form)?;
    store::with_conn(&dashboard.pool, move |conn| {
        let tx = conn.transaction()?;
        for update in &updates {
            store::update_threshold(&tx, &update.parameter, update.bound, update.value)?;
        }
        tx.commit()?;
        tracing::info!("Updated {} threshold bound(s)", updates.len());
        Ok(())
    })
    .await?;

    Ok(Redirect::to("/settings"))
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}
