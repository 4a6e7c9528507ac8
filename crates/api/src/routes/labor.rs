//! Labour routes: workers, attendance, advances, bonuses and payroll.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};
use serde_json::json;
use sitebook_core::payroll::{DayAttendance, NewWorker, WorkerEvent, WorkerEventKind};
use sitebook_shared::types::WorkerId;

use crate::extractors::{ConfirmQuery, MonthQuery};
use crate::{ApiError, AppState};

/// Creates the labour routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/labor/workers", get(list_workers).post(create_worker))
        .route("/labor/workers/{id}", delete(delete_worker))
        .route("/labor/workers/{id}/month", get(worker_month))
        .route(
            "/labor/workers/{id}/events/{kind}",
            get(list_events).post(record_event),
        )
        .route(
            "/labor/attendance/{date}",
            get(get_attendance).put(mark_attendance),
        )
        .route("/labor/payroll", get(payroll))
}

/// GET `/labor/workers` - The muster roll.
async fn list_workers(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let workers = state.labor.list_workers().await?;
    Ok(Json(json!({ "workers": workers })))
}

/// POST `/labor/workers` - Add a worker.
async fn create_worker(
    State(state): State<AppState>,
    Json(input): Json<NewWorker>,
) -> Result<impl IntoResponse, ApiError> {
    let worker = state.labor.create_worker(input).await?;
    Ok((StatusCode::CREATED, Json(worker)))
}

/// DELETE `/labor/workers/{id}?confirm=true` - Remove a worker.
async fn delete_worker(
    State(state): State<AppState>,
    Path(id): Path<WorkerId>,
    Query(confirm): Query<ConfirmQuery>,
) -> Result<impl IntoResponse, ApiError> {
    state.labor.delete_worker(id, confirm.confirmation()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/labor/workers/{id}/month?month=` - Muster grid and pay for one worker.
async fn worker_month(
    State(state): State<AppState>,
    Path(id): Path<WorkerId>,
    Query(month): Query<MonthQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let month = month.resolve(&state.business)?;
    Ok(Json(state.labor.worker_month(id, &month).await?))
}

/// GET `/labor/workers/{id}/events/{kind}` - Advances or bonuses.
async fn list_events(
    State(state): State<AppState>,
    Path((id, kind)): Path<(WorkerId, WorkerEventKind)>,
) -> Result<impl IntoResponse, ApiError> {
    let events = state.labor.events(id, kind).await?;
    Ok(Json(json!({ "events": events })))
}

/// POST `/labor/workers/{id}/events/{kind}` - Record an advance or bonus.
async fn record_event(
    State(state): State<AppState>,
    Path((id, kind)): Path<(WorkerId, WorkerEventKind)>,
    Json(event): Json<WorkerEvent>,
) -> Result<impl IntoResponse, ApiError> {
    let event = state.labor.record_event(id, kind, event).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// GET `/labor/attendance/{date}` - Marks for one date.
async fn get_attendance(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.labor.attendance(&date).await?))
}

/// PUT `/labor/attendance/{date}` - Mark workers for one date.
async fn mark_attendance(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Json(marks): Json<DayAttendance>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.labor.mark_attendance(&date, &marks).await?))
}

/// GET `/labor/payroll?month=` - Pay for every worker.
async fn payroll(
    State(state): State<AppState>,
    Query(month): Query<MonthQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let month = month.resolve(&state.business)?;
    Ok(Json(state.labor.payroll(&month).await?))
}
