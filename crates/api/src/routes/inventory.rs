//! Inventory routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde_json::json;
use sitebook_core::inventory::{InventoryService, NewInventoryItem, StockChange};
use sitebook_shared::types::InventoryItemId;

use crate::extractors::ConfirmQuery;
use crate::{ApiError, AppState};

/// Creates the inventory routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/inventory/items", get(list_items).post(create_item))
        .route("/inventory/items/{id}", delete(delete_item))
        .route("/inventory/items/{id}/add", post(add_stock))
        .route("/inventory/items/{id}/remove", post(remove_stock))
        .route("/inventory/low-stock", get(low_stock))
        .route("/inventory/valuation", get(valuation))
        .route("/inventory/log", get(stock_log))
}

/// GET `/inventory/items` - Items with a low-stock flag.
async fn list_items(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let items: Vec<_> = state
        .inventory
        .list()?
        .into_iter()
        .map(|item| {
            let low = InventoryService::is_low(&item);
            json!({ "item": item, "low": low })
        })
        .collect();
    Ok(Json(json!({ "items": items })))
}

/// POST `/inventory/items` - Register an item with opening stock.
async fn create_item(
    State(state): State<AppState>,
    Json(input): Json<NewInventoryItem>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state.inventory.create(input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// POST `/inventory/items/{id}/add` - Receive stock.
async fn add_stock(
    State(state): State<AppState>,
    Path(id): Path<InventoryItemId>,
    Json(change): Json<StockChange>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.inventory.add_stock(id, change).await?))
}

/// POST `/inventory/items/{id}/remove` - Issue stock.
async fn remove_stock(
    State(state): State<AppState>,
    Path(id): Path<InventoryItemId>,
    Json(change): Json<StockChange>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.inventory.remove_stock(id, change).await?))
}

/// DELETE `/inventory/items/{id}?confirm=true` - Remove an item.
async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<InventoryItemId>,
    Query(confirm): Query<ConfirmQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let removed = state.inventory.delete(id, confirm.confirmation()).await?;
    Ok(Json(json!({ "deleted": removed })))
}

/// GET `/inventory/low-stock` - Items to reorder.
async fn low_stock(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(json!({ "items": state.inventory.low_stock()? })))
}

/// GET `/inventory/valuation` - Stock value.
async fn valuation(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.inventory.valuation()?))
}

/// GET `/inventory/log` - Recent movements, newest first.
async fn stock_log(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(json!({ "movements": state.inventory.log()? })))
}
