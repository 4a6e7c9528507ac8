//! Dashboard and assistant routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;

use crate::extractors::{MonthQuery, resolve_month};
use crate::{ApiError, AppState};

/// Creates the dashboard routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(month_overview))
        .route("/assistant", post(ask_assistant))
}

/// Request body for the assistant.
#[derive(Debug, Deserialize)]
pub struct AssistantRequest {
    /// The operator's message.
    pub message: String,
    /// Month to answer about; the current month when absent.
    #[serde(default)]
    pub month: Option<String>,
}

/// GET `/dashboard?month=` - Key figures for a month.
async fn month_overview(
    State(state): State<AppState>,
    Query(month): Query<MonthQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let month = month.resolve(&state.business)?;
    let overview = state
        .dashboard
        .overview(&month, state.business.service_interval_hours)
        .await?;
    Ok(Json(overview))
}

/// POST `/assistant` - Answer a question about the month.
async fn ask_assistant(
    State(state): State<AppState>,
    Json(request): Json<AssistantRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let month = resolve_month(request.month.as_deref(), &state.business)?;
    let reply = state
        .dashboard
        .ask(
            &request.message,
            &month,
            state.business.service_interval_hours,
            &state.business.name,
        )
        .await?;
    Ok(Json(reply))
}
