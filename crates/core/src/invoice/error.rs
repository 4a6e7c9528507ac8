//! Invoice error types.

use rust_decimal::Decimal;
use sitebook_shared::types::PaymentId;
use thiserror::Error;

/// Invoice-related errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvoiceError {
    /// Payment attempted before the invoice has a persisted identity.
    #[error("Invoice must be saved before a payment can be recorded")]
    Unsaved,

    /// Payment amount is zero or negative.
    #[error("Payment amount must be positive, got {0}")]
    NonPositivePayment(Decimal),

    /// Client name missing.
    #[error("Client name is required")]
    MissingClientName,

    /// No billed lines.
    #[error("Invoice must have at least one item")]
    NoItems,

    /// GST rate outside 0..=100.
    #[error("GST rate must be between 0 and 100, got {0}")]
    InvalidGstRate(Decimal),

    /// Discount below zero.
    #[error("Discount cannot be negative")]
    NegativeDiscount,

    /// Legacy advance below zero.
    #[error("Advance cannot be negative")]
    NegativeAdvance,

    /// A line has a negative quantity or rate.
    #[error("Item {line} has a negative quantity or rate")]
    NegativeItemValue {
        /// One-based line number.
        line: usize,
    },

    /// Date is not `YYYY-MM-DD`.
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    /// Bill number zero.
    #[error("Bill number must be positive")]
    InvalidBillNumber,

    /// No payment with this id on the invoice.
    #[error("Payment not found: {0}")]
    PaymentNotFound(PaymentId),
}
