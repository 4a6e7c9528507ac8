//! Health check endpoints.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;
use sitebook_core::collections::{BILL_SEQUENCE_DOC, META, doc_path};
use tracing::warn;

use crate::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Whether the document store answered.
    pub store: &'static str,
}

/// Health check handler.
///
/// Reads one small document so a dead store shows up as `503`.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let store_ok = match state.store.read_once(&doc_path(META, BILL_SEQUENCE_DOC)).await {
        Ok(_) => true,
        Err(e) => {
            warn!(error = %e, "Health check could not reach the store");
            false
        }
    };

    let (code, status, store) = if store_ok {
        (StatusCode::OK, "healthy", "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded", "unavailable")
    };
    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            store,
        }),
    )
}

/// Creates health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
