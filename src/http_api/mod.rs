use std::{
    collections::{HashMap, VecDeque},
    net::SocketAddr,
    sync::Arc,
};

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error};

use crate::holidays::{HolidayResult, UNNAMED_HOLIDAY};
use crate::{
    EmptyDaysPolicy, HolidayEntry, HolidayError, HolidaySet, HolidaySource, PersistenceError,
    PlanError, PlanSettings, Planner, ScheduleRecord, ScheduleStatistics, ScheduleSummary,
    StaticHolidaySource, SyllabusError, SyllabusRow, read_syllabus, schedule_to_csv_string,
};

pub const DEFAULT_CACHED_YEARS: usize = 8;

#[derive(Default)]
struct YearCache {
    sets: HashMap<i32, HolidaySet>,
    // insertion order, oldest first
    order: VecDeque<i32>,
}

/// Holiday source that keeps the most recently loaded years.
#[derive(Clone)]
pub struct HolidayCache {
    source: Arc<dyn HolidaySource + Send + Sync>,
    years: Arc<RwLock<YearCache>>,
    capacity: usize,
}

impl HolidayCache {
    pub fn new(source: Arc<dyn HolidaySource + Send + Sync>) -> Self {
        Self::with_capacity(source, DEFAULT_CACHED_YEARS)
    }

    pub fn with_capacity(source: Arc<dyn HolidaySource + Send + Sync>, capacity: usize) -> Self {
        Self {
            source,
            years: Arc::new(RwLock::new(YearCache::default())),
            capacity: capacity.max(1),
        }
    }

    pub fn cached_years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.years.read().sets.keys().copied().collect();
        years.sort_unstable();
        years
    }
}

impl HolidaySource for HolidayCache {
    fn holidays_for_year(&self, year: i32) -> HolidayResult<HolidaySet> {
        if let Some(set) = self.years.read().sets.get(&year) {
            return Ok(set.clone());
        }
        let set = self.source.holidays_for_year(year)?;
        debug!(year, count = set.len(), "caching holidays");

        let mut cache = self.years.write();
        if cache.sets.insert(year, set.clone()).is_none() {
            cache.order.push_back(year);
        }
        while cache.order.len() > self.capacity {
            if let Some(evicted) = cache.order.pop_front() {
                cache.sets.remove(&evicted);
            }
        }
        Ok(set)
    }
}

#[derive(Clone)]
pub struct AppState {
    holidays: HolidayCache,
}

impl AppState {
    pub fn new(source: Arc<dyn HolidaySource + Send + Sync>) -> Self {
        Self::with_cache(HolidayCache::new(source))
    }

    pub fn with_cache(holidays: HolidayCache) -> Self {
        Self { holidays }
    }

    /// State with no holiday feed; only free days given per request apply.
    pub fn without_holidays() -> Self {
        Self::new(Arc::new(StaticHolidaySource::default()))
    }

    pub fn holidays(&self) -> &HolidayCache {
        &self.holidays
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    Invalid(String),
    Internal(String),
}

impl ApiError {
    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl From<PlanError> for ApiError {
    fn from(value: PlanError) -> Self {
        ApiError::Invalid(value.to_string())
    }
}

impl From<SyllabusError> for ApiError {
    fn from(value: SyllabusError) -> Self {
        match value {
            SyllabusError::Io(err) => ApiError::Internal(err.to_string()),
            other => ApiError::Invalid(other.to_string()),
        }
    }
}

impl From<PersistenceError> for ApiError {
    fn from(value: PersistenceError) -> Self {
        ApiError::Internal(value.to_string())
    }
}

impl From<HolidayError> for ApiError {
    fn from(value: HolidayError) -> Self {
        ApiError::Internal(value.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        ApiError::Invalid(value.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(value: QueryRejection) -> Self {
        ApiError::Invalid(value.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Invalid(message) => {
                let body = Json(ErrorBody {
                    error: "invalid_request",
                    message,
                });
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            ApiError::Internal(message) => {
                error!(%message, "request failed");
                let body = Json(ErrorBody {
                    error: "internal_error",
                    message,
                });
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct SchedulePayload {
    rows: Vec<SyllabusRow>,
    settings: PlanSettings,
}

#[derive(Debug, Serialize)]
struct ScheduleResponse {
    records: Vec<ScheduleRecord>,
    statistics: ScheduleStatistics,
    summary: ScheduleSummary,
}

#[derive(Debug, Deserialize)]
struct CsvScheduleQuery {
    start_date: NaiveDate,
    #[serde(default)]
    add_break: Option<bool>,
    #[serde(default)]
    break_days: Option<u32>,
    #[serde(default)]
    consider_holidays: Option<bool>,
    #[serde(default)]
    fill_empty_days: Option<u32>,
}

impl CsvScheduleQuery {
    fn settings(&self) -> PlanSettings {
        let mut settings = PlanSettings::new(self.start_date);
        if let Some(add_break) = self.add_break {
            settings.add_break = add_break;
        }
        if let Some(break_days) = self.break_days {
            settings.break_days = break_days;
        }
        if let Some(consider) = self.consider_holidays {
            settings.consider_holidays = consider;
        }
        if let Some(fill) = self.fill_empty_days {
            settings.empty_days = EmptyDaysPolicy::Fill(fill);
        }
        settings
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/schedule", post(generate_schedule))
        .route("/schedule/csv", post(generate_schedule_csv))
        .route("/holidays/:year", get(list_holidays))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn generate_schedule(
    State(state): State<AppState>,
    payload: Result<Json<SchedulePayload>, JsonRejection>,
) -> Result<Json<ScheduleResponse>, ApiError> {
    let Json(payload) = payload?;
    let source: &dyn HolidaySource = state.holidays();
    let outcome = Planner::new(payload.settings).plan(&payload.rows, Some(source))?;
    Ok(Json(ScheduleResponse {
        records: outcome.schedule.into_records(),
        statistics: outcome.statistics,
        summary: outcome.summary,
    }))
}

async fn generate_schedule_csv(
    State(state): State<AppState>,
    query: Result<Query<CsvScheduleQuery>, QueryRejection>,
    body: String,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    if body.trim().is_empty() {
        return Err(ApiError::invalid("request body must be a syllabus CSV"));
    }
    let settings = query.settings();
    let syllabus = read_syllabus(body.as_bytes(), settings.empty_days)?;
    let source: &dyn HolidaySource = state.holidays();
    let outcome = Planner::new(settings).plan(&syllabus.rows, Some(source))?;
    let csv = schedule_to_csv_string(&outcome.schedule)?;
    Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], csv).into_response())
}

async fn list_holidays(
    State(state): State<AppState>,
    Path(year): Path<i32>,
) -> Result<Json<Vec<HolidayEntry>>, ApiError> {
    let set = state.holidays().holidays_for_year(year)?;
    let entries = set
        .dates()
        .map(|date| HolidayEntry {
            date,
            name: set.name_of(date).unwrap_or(UNNAMED_HOLIDAY).to_string(),
        })
        .collect();
    Ok(Json(entries))
}
