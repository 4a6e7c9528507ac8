//! Backup routes: export, restore and reset.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use serde_json::Value;

use crate::extractors::ConfirmQuery;
use crate::{ApiError, AppState};

/// Creates the backup routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/backup", get(export_backup))
        .route("/backup/restore", post(restore_backup))
        .route("/backup/reset", post(reset_all))
}

/// GET `/backup` - Download a snapshot of all data.
async fn export_backup(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let now = Utc::now();
    let snapshot = state.backup.export(now).await?;
    let filename = format!(
        "attachment; filename=\"sitebook-backup-{}.json\"",
        now.format("%Y-%m-%d")
    );
    Ok((
        [(header::CONTENT_DISPOSITION, filename)],
        Json(snapshot.to_json()),
    ))
}

/// POST `/backup/restore?confirm=true` - Replace all data with an uploaded snapshot.
async fn restore_backup(
    State(state): State<AppState>,
    Query(confirm): Query<ConfirmQuery>,
    Json(upload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state
        .backup
        .restore(&upload, confirm.confirmation())
        .await?;
    Ok(Json(report))
}

/// POST `/backup/reset?confirm=true` - Erase everything.
async fn reset_all(
    State(state): State<AppState>,
    Query(confirm): Query<ConfirmQuery>,
) -> Result<impl IntoResponse, ApiError> {
    state.backup.reset_all(confirm.confirmation()).await?;
    Ok(StatusCode::NO_CONTENT)
}
