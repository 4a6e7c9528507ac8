//! Repository abstractions for data access.
//!
//! Repositories run the I/O side of every operation: they read documents,
//! hand them to the pure services in `sitebook-core`, and write the result
//! back through the [`DocumentStore`](crate::store::DocumentStore).

pub mod backup;
pub mod cashbook;
pub mod dashboard;
mod document;
pub mod error;
pub mod fleet;
pub mod inventory;
pub mod invoice;
pub mod labor;

pub use backup::{BackupRepository, RestoreReport};
pub use cashbook::CashbookRepository;
pub use dashboard::DashboardRepository;
pub use error::RepositoryError;
pub use fleet::FleetRepository;
pub use inventory::InventoryRepository;
pub use invoice::InvoiceRepository;
pub use labor::LaborRepository;

use crate::store::StoreError;

/// Attempts for a write that lost a precondition race.
pub(crate) const MAX_ATTEMPTS: usize = 3;

/// True when the write failed because the document moved underneath it.
pub(crate) fn is_contention(e: &RepositoryError) -> bool {
    matches!(e, RepositoryError::Store(StoreError::PreconditionFailed(_)))
}
