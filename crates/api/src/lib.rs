//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST API routes under `/api/v1`
//! - Query extractors for months, paging and confirmation
//! - Error responses built from `AppError`

pub mod error;
pub mod extractors;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use sitebook_db::migration::{Migrator, MigratorTrait};
use sitebook_db::{
    BackupRepository, CachedStore, CashbookRepository, DashboardRepository, DocumentStore,
    FleetRepository, InventoryRepository, InvoiceRepository, LaborRepository, LocalStore,
    SqlDocumentStore, StoreError, connect,
};
use sitebook_shared::{AppConfig, BusinessConfig};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The document store behind every repository.
    pub store: Arc<dyn DocumentStore>,
    /// Invoices and their payments.
    pub invoices: InvoiceRepository,
    /// Cashbook ledger.
    pub cashbook: CashbookRepository,
    /// Vehicles and work entries.
    pub fleet: FleetRepository,
    /// Workers, attendance and pay.
    pub labor: LaborRepository,
    /// Stock items. Shared so that its mutation lock covers every request.
    pub inventory: InventoryRepository,
    /// Month overview and assistant.
    pub dashboard: DashboardRepository,
    /// Export, restore and reset.
    pub backup: BackupRepository,
    /// Business settings.
    pub business: Arc<BusinessConfig>,
    /// Tasks that run until [`AppState::shutdown`].
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

/// Failures while bringing the stores up.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// Database connection, migration or local store file.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppState {
    /// Builds every repository over the given stores.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, local: LocalStore, business: BusinessConfig) -> Self {
        Self {
            invoices: InvoiceRepository::new(store.clone()),
            cashbook: CashbookRepository::new(store.clone()),
            fleet: FleetRepository::new(store.clone()),
            labor: LaborRepository::new(store.clone()),
            inventory: InventoryRepository::with_log_limit(local.clone(), business.stock_log_limit),
            dashboard: DashboardRepository::new(store.clone(), local.clone()),
            backup: BackupRepository::new(store.clone(), local),
            business: Arc::new(business),
            store,
            tasks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Connects and migrates the database, opens the local store and starts
    /// the cache invalidator.
    ///
    /// # Errors
    ///
    /// Returns an error if the database or the local store file cannot be
    /// opened.
    pub async fn load(config: &AppConfig) -> Result<Self, StartupError> {
        let db = connect(&config.database).await.map_err(StoreError::from)?;
        Migrator::up(&db, None).await.map_err(StoreError::from)?;
        info!("Document tables ready");

        let cached = CachedStore::new(Arc::new(SqlDocumentStore::new(db)));
        let invalidator = cached.spawn_invalidator();

        let local = LocalStore::open(&config.local_store.path).await?;
        info!(path = %config.local_store.path, "Local store opened");

        let state = Self::new(Arc::new(cached), local, config.business.clone());
        state.tasks.lock().await.push(invalidator);
        Ok(state)
    }

    /// Stops background tasks. Safe to call more than once.
    pub async fn shutdown(&self) {
        let tasks = std::mem::take(&mut *self.tasks.lock().await);
        let stopped = tasks.len();
        for task in tasks {
            task.abort();
            let _ = task.await;
        }
        info!(stopped, "Background tasks stopped");
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitebook_core::payroll::NewWorker;
    use sitebook_shared::config::{DatabaseConfig, LocalStoreConfig, ServerConfig};

    fn config(dir: &tempfile::TempDir) -> AppConfig {
        AppConfig {
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
                min_connections: 1,
            },
            business: BusinessConfig::default(),
            local_store: LocalStoreConfig {
                path: dir.path().join("local.json").to_string_lossy().into_owned(),
            },
        }
    }

    #[tokio::test]
    async fn test_load_then_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::load(&config(&dir)).await.unwrap();
        assert_eq!(state.tasks.lock().await.len(), 1);

        let worker = state
            .labor
            .create_worker(NewWorker {
                name: "Suresh".to_string(),
                role: String::new(),
                daily_rate: rust_decimal::Decimal::from(500),
                phone: String::new(),
            })
            .await
            .unwrap();
        assert_eq!(state.labor.list_workers().await.unwrap()[0].id, worker.id);

        state.shutdown().await;
        assert!(state.tasks.lock().await.is_empty());
        state.shutdown().await;
    }

    #[tokio::test]
    async fn test_load_reports_unreadable_local_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("local.json"), b"[1]").unwrap();
        assert!(matches!(
            AppState::load(&config(&dir)).await,
            Err(StartupError::Store(StoreError::Serialization(_)))
        ));
    }
}
