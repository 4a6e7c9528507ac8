//! Fleet routes: vehicles, work log, fuel and driver advances.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde::Deserialize;
use serde_json::json;
use sitebook_core::fleet::{FleetService, NewAdvance, NewFuelRecord, NewWorkEntry, VehicleUpdate};
use sitebook_shared::types::{AdvanceRecordId, FuelRecordId, WorkEntryId};

use crate::extractors::{MonthQuery, resolve_month};
use crate::{ApiError, AppState};

/// Creates the fleet routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/fleet/vehicles", get(list_vehicles))
        .route("/fleet/vehicles/due", get(due_for_service))
        .route(
            "/fleet/vehicles/{vehicle_id}",
            get(get_vehicle).put(update_vehicle),
        )
        .route("/fleet/vehicles/{vehicle_id}/service", post(mark_serviced))
        .route("/fleet/vehicles/{vehicle_id}/resync", post(resync_hours))
        .route("/fleet/vehicles/{vehicle_id}/month", get(vehicle_month))
        .route("/fleet/vehicles/{vehicle_id}/fuel", post(add_fuel))
        .route(
            "/fleet/vehicles/{vehicle_id}/fuel/{fuel_id}",
            delete(delete_fuel),
        )
        .route("/fleet/vehicles/{vehicle_id}/advances", post(add_advance))
        .route(
            "/fleet/vehicles/{vehicle_id}/advances/{advance_id}",
            delete(delete_advance),
        )
        .route("/fleet/work", get(list_work).post(add_work))
        .route("/fleet/work/summary", get(work_summary))
        .route("/fleet/work/{id}", delete(delete_work))
        .route("/fleet/work/{id}/paid", put(set_work_paid))
}

/// Query parameters for work listings.
#[derive(Debug, Default, Deserialize)]
pub struct WorkQuery {
    /// Month key; all months when absent (the summary defaults to this month).
    pub month: Option<String>,
    /// Vehicle filter.
    pub vehicle: Option<String>,
}

/// Request body for the paid flag.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaidRequest {
    /// Whether the client has paid.
    pub is_paid: bool,
}

/// GET `/fleet/vehicles` - Every vehicle with service progress.
async fn list_vehicles(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let interval = state.business.service_interval_hours;
    let vehicles: Vec<_> = state
        .fleet
        .list_vehicles()
        .await?
        .into_iter()
        .map(|v| {
            let service = FleetService::service_status(&v, interval);
            json!({ "vehicle": v, "service": service })
        })
        .collect();
    Ok(Json(json!({ "vehicles": vehicles })))
}

/// GET `/fleet/vehicles/due` - Vehicles past their service interval.
async fn due_for_service(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let due = state
        .fleet
        .due_for_service(state.business.service_interval_hours)
        .await?;
    Ok(Json(json!({ "due": due })))
}

/// GET `/fleet/vehicles/{vehicle_id}` - One vehicle with service progress.
async fn get_vehicle(
    State(state): State<AppState>,
    Path(vehicle_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let vehicle = state.fleet.vehicle(&vehicle_id).await?;
    let service = FleetService::service_status(&vehicle, state.business.service_interval_hours);
    Ok(Json(json!({ "vehicle": vehicle, "service": service })))
}

/// PUT `/fleet/vehicles/{vehicle_id}` - Set driver, salary or service cost.
async fn update_vehicle(
    State(state): State<AppState>,
    Path(vehicle_id): Path<String>,
    Json(update): Json<VehicleUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.fleet.update_vehicle(&vehicle_id, update).await?))
}

/// POST `/fleet/vehicles/{vehicle_id}/service` - Record a service now.
async fn mark_serviced(
    State(state): State<AppState>,
    Path(vehicle_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.fleet.mark_serviced(&vehicle_id).await?))
}

/// POST `/fleet/vehicles/{vehicle_id}/resync` - Rebuild running hours from the work log.
async fn resync_hours(
    State(state): State<AppState>,
    Path(vehicle_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (vehicle, drift) = state.fleet.resync(&vehicle_id).await?;
    Ok(Json(json!({ "vehicle": vehicle, "drift": drift })))
}

/// GET `/fleet/vehicles/{vehicle_id}/month?month=` - Monthly vehicle costs.
async fn vehicle_month(
    State(state): State<AppState>,
    Path(vehicle_id): Path<String>,
    Query(month): Query<MonthQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let month = month.resolve(&state.business)?;
    Ok(Json(state.fleet.vehicle_month(&vehicle_id, &month).await?))
}

/// POST `/fleet/vehicles/{vehicle_id}/fuel` - Record fuel bought.
async fn add_fuel(
    State(state): State<AppState>,
    Path(vehicle_id): Path<String>,
    Json(input): Json<NewFuelRecord>,
) -> Result<impl IntoResponse, ApiError> {
    let (vehicle, fuel, entry) = state.fleet.add_fuel(&vehicle_id, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "vehicle": vehicle, "fuel": fuel, "cashEntry": entry })),
    ))
}

/// DELETE `/fleet/vehicles/{vehicle_id}/fuel/{fuel_id}` - Remove a fuel record.
async fn delete_fuel(
    State(state): State<AppState>,
    Path((vehicle_id, fuel_id)): Path<(String, FuelRecordId)>,
) -> Result<impl IntoResponse, ApiError> {
    let (vehicle, warning) = state.fleet.delete_fuel(&vehicle_id, fuel_id).await?;
    Ok(Json(json!({ "vehicle": vehicle, "warning": warning })))
}

/// POST `/fleet/vehicles/{vehicle_id}/advances` - Pay the driver an advance.
async fn add_advance(
    State(state): State<AppState>,
    Path(vehicle_id): Path<String>,
    Json(input): Json<NewAdvance>,
) -> Result<impl IntoResponse, ApiError> {
    let (vehicle, advance, entry) = state.fleet.add_advance(&vehicle_id, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "vehicle": vehicle, "advance": advance, "cashEntry": entry })),
    ))
}

/// DELETE `/fleet/vehicles/{vehicle_id}/advances/{advance_id}` - Remove an advance.
async fn delete_advance(
    State(state): State<AppState>,
    Path((vehicle_id, advance_id)): Path<(String, AdvanceRecordId)>,
) -> Result<impl IntoResponse, ApiError> {
    let (vehicle, warning) = state.fleet.delete_advance(&vehicle_id, advance_id).await?;
    Ok(Json(json!({ "vehicle": vehicle, "warning": warning })))
}

/// GET `/fleet/work?month=&vehicle=` - Work log, newest first.
async fn list_work(
    State(state): State<AppState>,
    Query(query): Query<WorkQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let month = query
        .month
        .as_deref()
        .map(|key| resolve_month(Some(key), &state.business))
        .transpose()?;
    let entries = state
        .fleet
        .list_work(month.as_ref(), query.vehicle.as_deref())
        .await?;
    Ok(Json(json!({ "entries": entries })))
}

/// POST `/fleet/work` - Log a job.
async fn add_work(
    State(state): State<AppState>,
    Json(input): Json<NewWorkEntry>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = state.fleet.add_work(input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET `/fleet/work/summary?month=&vehicle=` - Hours and billing for a month.
async fn work_summary(
    State(state): State<AppState>,
    Query(query): Query<WorkQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let month = resolve_month(query.month.as_deref(), &state.business)?;
    Ok(Json(
        state
            .fleet
            .work_summary(&month, query.vehicle.as_deref())
            .await?,
    ))
}

/// DELETE `/fleet/work/{id}` - Remove a job and its hours.
async fn delete_work(
    State(state): State<AppState>,
    Path(id): Path<WorkEntryId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.fleet.delete_work(id).await?))
}

/// PUT `/fleet/work/{id}/paid` - Mark a job paid or unpaid.
async fn set_work_paid(
    State(state): State<AppState>,
    Path(id): Path<WorkEntryId>,
    Json(body): Json<PaidRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.fleet.set_work_paid(id, body.is_paid).await?))
}
