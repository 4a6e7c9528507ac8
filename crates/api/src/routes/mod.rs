//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod backup;
pub mod cashbook;
pub mod dashboard;
pub mod fleet;
pub mod health;
pub mod inventory;
pub mod invoices;
pub mod labor;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(invoices::routes())
        .merge(cashbook::routes())
        .merge(fleet::routes())
        .merge(labor::routes())
        .merge(inventory::routes())
        .merge(dashboard::routes())
        .merge(backup::routes())
}
