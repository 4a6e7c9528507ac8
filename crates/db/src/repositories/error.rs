//! Repository error type.

use sitebook_core::backup::BackupError;
use sitebook_core::cashbook::CashbookError;
use sitebook_core::fleet::FleetError;
use sitebook_core::inventory::InventoryError;
use sitebook_core::invoice::InvoiceError;
use sitebook_core::payroll::PayrollError;
use sitebook_shared::AppError;
use sitebook_shared::types::Confirmation;

use crate::store::StoreError;

/// Error types for repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Invoice rule violated.
    #[error(transparent)]
    Invoice(#[from] InvoiceError),

    /// Cashbook rule violated.
    #[error(transparent)]
    Cashbook(#[from] CashbookError),

    /// Fleet rule violated.
    #[error(transparent)]
    Fleet(#[from] FleetError),

    /// Payroll rule violated.
    #[error(transparent)]
    Payroll(#[from] PayrollError),

    /// Inventory rule violated.
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    /// Snapshot rejected.
    #[error(transparent)]
    Backup(#[from] BackupError),

    /// Record absent.
    #[error("{0} not found")]
    NotFound(String),

    /// Destructive action attempted without confirmation.
    #[error("Confirmation required to {0}")]
    ConfirmationRequired(&'static str),

    /// Someone else changed the record first.
    #[error("{0}")]
    Conflict(String),

    /// Stored document could not be decoded.
    #[error("Unreadable document '{path}': {source}")]
    Corrupt {
        /// Document path.
        path: String,
        /// Decode failure.
        source: serde_json::Error,
    },

    /// Document store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<serde_json::Error> for RepositoryError {
    fn from(e: serde_json::Error) -> Self {
        Self::Store(StoreError::Serialization(e))
    }
}

/// Fails unless the operator confirmed `action`.
pub(crate) fn require_confirmation(
    confirm: Confirmation,
    action: &'static str,
) -> Result<(), RepositoryError> {
    if confirm.is_confirmed() {
        Ok(())
    } else {
        Err(RepositoryError::ConfirmationRequired(action))
    }
}

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        let message = e.to_string();
        match e {
            RepositoryError::Invoice(InvoiceError::PaymentNotFound(_))
            | RepositoryError::Cashbook(CashbookError::EntryNotFound(_))
            | RepositoryError::Fleet(
                FleetError::FuelRecordNotFound(_)
                | FleetError::AdvanceNotFound(_)
                | FleetError::WorkEntryNotFound(_),
            )
            | RepositoryError::Inventory(InventoryError::ItemNotFound(_))
            | RepositoryError::NotFound(_) => Self::NotFound(message),
            RepositoryError::Invoice(_)
            | RepositoryError::Cashbook(_)
            | RepositoryError::Fleet(_)
            | RepositoryError::Payroll(_)
            | RepositoryError::Inventory(_)
            | RepositoryError::Backup(_)
            | RepositoryError::Store(StoreError::InvalidPath(_)) => Self::Validation(message),
            RepositoryError::ConfirmationRequired(_) => Self::ConfirmationRequired(message),
            RepositoryError::Conflict(_) | RepositoryError::Store(StoreError::PreconditionFailed(_)) => {
                Self::Conflict(message)
            }
            RepositoryError::Corrupt { .. }
            | RepositoryError::Store(StoreError::InvalidDocument(_) | StoreError::Serialization(_)) => {
                Self::Internal(message)
            }
            RepositoryError::Store(StoreError::Database(_) | StoreError::Io(_)) => {
                Self::Store(message)
            }
        }
    }
}
