//! Storage layer for `SiteBook`.
//!
//! This crate provides:
//! - The [`DocumentStore`] boundary with SQL, in-memory and cached backends
//! - The local key-value store for inventory
//! - Repositories that load records, run `sitebook-core` rules and write back
//! - Database migrations for the SQL backend

pub mod entities;
pub mod migration;
pub mod repositories;
pub mod store;

pub use repositories::{
    BackupRepository, CashbookRepository, DashboardRepository, FleetRepository,
    InventoryRepository, InvoiceRepository, LaborRepository, RepositoryError, RestoreReport,
};
pub use store::{CachedStore, DocumentStore, LocalStore, MemoryStore, SqlDocumentStore, StoreError};

use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use sitebook_shared::config::DatabaseConfig;
use tracing::info;

/// Establishes a connection pool to the configured database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    info!(backend = ?db.get_database_backend(), "Database connected");
    Ok(db)
}
