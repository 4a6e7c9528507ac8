//! Cashbook routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};
use serde_json::json;
use sitebook_core::cashbook::NewCashEntry;
use sitebook_shared::types::{CashEntryId, PageRequest};

use crate::extractors::{ConfirmQuery, MonthQuery, resolve_month};
use crate::{ApiError, AppState};

/// Creates the cashbook routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cashbook", get(list_entries).post(create_entry))
        .route("/cashbook/summary", get(month_summary))
        .route("/cashbook/{id}", delete(delete_entry))
}

/// GET `/cashbook?month=&page=&per_page=` - Entries newest first, one page at a time.
///
/// Without `month` every entry is listed.
async fn list_entries(
    State(state): State<AppState>,
    Query(month): Query<MonthQuery>,
    Query(page): Query<PageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = match month.month.as_deref() {
        Some(key) => {
            let month = resolve_month(Some(key), &state.business)?;
            state.cashbook.month(&month).await?
        }
        None => state.cashbook.list().await?,
    };
    Ok(Json(page.paginate(entries)))
}

/// POST `/cashbook` - Record a manual entry.
async fn create_entry(
    State(state): State<AppState>,
    Json(input): Json<NewCashEntry>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = state.cashbook.create(input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET `/cashbook/summary?month=` - Income, expense and net for a month.
async fn month_summary(
    State(state): State<AppState>,
    Query(month): Query<MonthQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let month = month.resolve(&state.business)?;
    Ok(Json(state.cashbook.summary(&month).await?))
}

/// DELETE `/cashbook/{id}?confirm=true` - Delete an entry.
async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<CashEntryId>,
    Query(confirm): Query<ConfirmQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let source = state.cashbook.delete(id, confirm.confirmation()).await?;
    Ok(Json(json!({ "deleted": id, "mirrorOf": source })))
}
