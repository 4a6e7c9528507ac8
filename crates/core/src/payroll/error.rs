//! Payroll error types.

use rust_decimal::Decimal;
use thiserror::Error;

/// Payroll-related errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayrollError {
    /// Worker name missing.
    #[error("Worker name is required")]
    MissingName,

    /// Daily rate below zero.
    #[error("Daily rate cannot be negative")]
    NegativeRate,

    /// Advance or bonus amount at or below zero.
    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    /// Date is not `YYYY-MM-DD`.
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}
