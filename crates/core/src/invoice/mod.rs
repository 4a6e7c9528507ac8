//! Invoice reconciliation engine.
//!
//! Totals, the payment ledger, settlement, bill numbering and the printed
//! amount in words. Recording a payment also produces a mirrored cashbook
//! entry; see [`crate::cashbook::CashbookMirror`].

pub mod error;
pub mod service;
pub mod types;
pub mod words;

#[cfg(test)]
mod service_props;

pub use error::InvoiceError;
pub use service::{InvoiceService, SETTLEMENT_NOTE};
pub use types::{
    Client, Invoice, InvoiceDraft, InvoiceStatement, InvoiceStatus, InvoiceTotals, LineItem,
    Payment, PaymentInput,
};
pub use words::{WORDS_OVERFLOW, amount_to_words, rupees_in_words};
