//! Cashbook error types.

use rust_decimal::Decimal;
use sitebook_shared::types::CashEntryId;
use thiserror::Error;

/// Cashbook-related errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CashbookError {
    /// Amount is zero or negative.
    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    /// Category missing.
    #[error("Category is required")]
    MissingCategory,

    /// Date is not `YYYY-MM-DD`.
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    /// No entry with this id.
    #[error("Cashbook entry not found: {0}")]
    EntryNotFound(CashEntryId),
}
