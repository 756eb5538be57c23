use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::{
    AssignmentView, DutyScheduler, DutyType, ErrorKind, GenerationResult, Holiday, Member,
    MemberId, MemberStats, MonthView, NewMember, Origin, ScheduleError, TodaySlice,
};

#[derive(Clone)]
pub struct AppState {
    scheduler: Arc<DutyScheduler>,
}

impl AppState {
    pub fn new(scheduler: DutyScheduler) -> Self {
        Self {
            scheduler: Arc::new(scheduler),
        }
    }

    pub fn with_shared(scheduler: Arc<DutyScheduler>) -> Self {
        Self { scheduler }
    }

    fn scheduler(&self) -> Arc<DutyScheduler> {
        self.scheduler.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    error: &'static str,
    message: String,
}

impl From<ScheduleError> for ApiError {
    fn from(value: ScheduleError) -> Self {
        let (status, error) = match value.kind() {
            ErrorKind::Input => (StatusCode::BAD_REQUEST, "invalid_request"),
            ErrorKind::Precondition => (StatusCode::UNPROCESSABLE_ENTITY, "precondition_failed"),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            ErrorKind::Dependency => (StatusCode::SERVICE_UNAVAILABLE, "dependency_failed"),
        };
        if status == StatusCode::SERVICE_UNAVAILABLE {
            error!(error = %value, "request failed on store dependency");
        }
        Self {
            status,
            error,
            message: value.to_string(),
        }
    }
}

impl ApiError {
    fn invalid_request(message: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: "invalid_request",
            message,
        }
    }
}

// Extractor rejections share the JSON error body instead of axum's plain text.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::invalid_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::invalid_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::invalid_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.error,
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct GeneratePayload {
    #[serde(default)]
    month: String,
}

#[derive(Debug, Deserialize)]
struct ActivePayload {
    active: bool,
}

#[derive(Debug, Deserialize)]
struct HolidayPayload {
    date: NaiveDate,
    #[serde(default)]
    label: String,
}

#[derive(Debug, Deserialize)]
struct AssignPayload {
    date: NaiveDate,
    duty: DutyType,
    member_id: MemberId,
    #[serde(default = "manual_origin")]
    origin: Origin,
}

fn manual_origin() -> Origin {
    Origin::Manual
}

#[derive(Debug, Deserialize)]
struct MonthQuery {
    month: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DutyQuery {
    duty: Option<DutyType>,
}

#[derive(Debug, Deserialize)]
struct DateQuery {
    date: Option<NaiveDate>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/generate", post(generate))
        .route("/members", get(list_members).post(create_member))
        .route("/members/:id", delete(delete_member))
        .route("/members/:id/active", put(set_member_active))
        .route("/holidays", get(list_holidays).post(create_holiday))
        .route("/holidays/:date", delete(delete_holiday))
        .route("/assignments", get(list_assignments).put(assign))
        .route("/assignments/:date", delete(unassign))
        .route("/months/:month", get(month_view))
        .route("/today", get(today))
        .route("/stats", get(stats))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, scheduler: DutyScheduler) -> std::io::Result<()> {
    let state = AppState::new(scheduler);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "http api listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GeneratePayload>, JsonRejection>,
) -> Result<Json<GenerationResult>, ApiError> {
    let Json(payload) = payload?;
    let result = state.scheduler().generate(&payload.month)?;
    Ok(Json(result))
}

async fn list_members(State(state): State<AppState>) -> Result<Json<Vec<Member>>, ApiError> {
    Ok(Json(state.scheduler().list_members()?))
}

async fn create_member(
    State(state): State<AppState>,
    member: Result<Json<NewMember>, JsonRejection>,
) -> Result<(StatusCode, Json<Member>), ApiError> {
    let Json(member) = member?;
    let created = state.scheduler().add_member(member)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn set_member_active(
    State(state): State<AppState>,
    id: Result<Path<MemberId>, PathRejection>,
    payload: Result<Json<ActivePayload>, JsonRejection>,
) -> Result<Json<Member>, ApiError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    Ok(Json(state.scheduler().set_member_active(id, payload.active)?))
}

async fn delete_member(
    State(state): State<AppState>,
    id: Result<Path<MemberId>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    state.scheduler().remove_member(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_holidays(
    State(state): State<AppState>,
    query: Result<Query<MonthQuery>, QueryRejection>,
) -> Result<Json<Vec<Holiday>>, ApiError> {
    let Query(query) = query?;
    Ok(Json(state.scheduler().holidays(query.month.as_deref())?))
}

async fn create_holiday(
    State(state): State<AppState>,
    payload: Result<Json<HolidayPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Holiday>), ApiError> {
    let Json(payload) = payload?;
    let holiday = state
        .scheduler()
        .add_holiday(payload.date, &payload.label)?;
    Ok((StatusCode::CREATED, Json(holiday)))
}

async fn delete_holiday(
    State(state): State<AppState>,
    date: Result<Path<NaiveDate>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(date) = date?;
    state.scheduler().remove_holiday(date)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_assignments(
    State(state): State<AppState>,
    query: Result<Query<MonthQuery>, QueryRejection>,
) -> Result<Json<Vec<AssignmentView>>, ApiError> {
    let Query(query) = query?;
    let month = query.month.unwrap_or_default();
    Ok(Json(state.scheduler().assignments_in(&month)?))
}

async fn assign(
    State(state): State<AppState>,
    payload: Result<Json<AssignPayload>, JsonRejection>,
) -> Result<Json<AssignmentView>, ApiError> {
    let Json(payload) = payload?;
    let view = state.scheduler().assign(
        payload.date,
        payload.duty,
        payload.member_id,
        payload.origin,
    )?;
    Ok(Json(view))
}

async fn unassign(
    State(state): State<AppState>,
    date: Result<Path<NaiveDate>, PathRejection>,
    query: Result<Query<DutyQuery>, QueryRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Path(date) = date?;
    let Query(query) = query?;
    let removed = state.scheduler().unassign(date, query.duty)?;
    Ok(Json(json!({ "removed": removed })))
}

async fn month_view(
    State(state): State<AppState>,
    month: Result<Path<String>, PathRejection>,
) -> Result<Json<MonthView>, ApiError> {
    let Path(month) = month?;
    Ok(Json(state.scheduler().month_view(&month)?))
}

async fn today(
    State(state): State<AppState>,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<TodaySlice>, ApiError> {
    let Query(query) = query?;
    let date = query
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    Ok(Json(state.scheduler().today(date)?))
}

async fn stats(
    State(state): State<AppState>,
    query: Result<Query<MonthQuery>, QueryRejection>,
) -> Result<Json<Vec<MemberStats>>, ApiError> {
    let Query(query) = query?;
    Ok(Json(state.scheduler().member_stats(query.month.as_deref())?))
}
