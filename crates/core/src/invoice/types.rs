//! Invoice data types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sitebook_shared::types::{InvoiceId, PaymentId};

use crate::cashbook::PaymentMode;
use crate::window::Dated;

/// Billing party.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Client {
    /// Client name (required).
    pub name: String,
    /// Postal address.
    pub address: String,
    /// GST identification number.
    pub gstin: String,
    /// Contact number.
    pub mobile: String,
}

/// One billed line.
///
/// `amount` is stored for display only and is recomputed from the
/// quantities and rate on every write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LineItem {
    /// Work date.
    pub date: String,
    /// Vehicle used.
    pub vehicle_ref: String,
    /// Description of the work or material.
    pub description: String,
    /// Volume in brass; takes precedence over trips when positive.
    pub brass_qty: Decimal,
    /// Number of trips.
    pub trip_qty: Decimal,
    /// Rate per brass or per trip.
    pub rate: Decimal,
    /// Derived line amount.
    pub amount: Decimal,
}

/// A payment received against an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// Stable payment ID. Nil when stored before ids existed, until
    /// `InvoiceService::assign_missing_ids` derives one.
    #[serde(default = "PaymentId::nil")]
    pub id: PaymentId,
    /// ISO date received.
    pub date: String,
    /// Amount received.
    pub amount: Decimal,
    /// Payment mode.
    #[serde(default)]
    pub mode: PaymentMode,
    /// Free-text note.
    #[serde(default)]
    pub note: String,
}

/// Payment as entered by the operator.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInput {
    /// ISO date received.
    pub date: String,
    /// Amount received.
    pub amount: Decimal,
    /// Payment mode.
    #[serde(default)]
    pub mode: PaymentMode,
    /// Note.
    #[serde(default)]
    pub note: String,
}

/// A bill issued to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    /// Persisted identity. `None` until the invoice has been created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<InvoiceId>,
    /// Sequential bill number.
    #[serde(default)]
    pub bill_no: u64,
    /// ISO invoice date.
    pub date: String,
    /// ISO due date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// Billed client.
    #[serde(default)]
    pub client: Client,
    /// Billed lines, in order.
    #[serde(default)]
    pub items: Vec<LineItem>,
    /// Whether GST is charged.
    #[serde(default)]
    pub is_gst: bool,
    /// GST percent.
    #[serde(default)]
    pub gst_rate: Decimal,
    /// Flat discount.
    #[serde(default)]
    pub discount: Decimal,
    /// Legacy scalar prior payment.
    #[serde(default)]
    pub advances: Decimal,
    /// Payments received, in order.
    #[serde(default)]
    pub payments: Vec<Payment>,
}

impl Dated for Invoice {
    fn date(&self) -> &str {
        &self.date
    }
}

/// Invoice content as submitted for create or update.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDraft {
    /// Bill number; assigned from the sequence when absent on create.
    #[serde(default)]
    pub bill_no: Option<u64>,
    /// ISO invoice date.
    pub date: String,
    /// ISO due date.
    #[serde(default)]
    pub due_date: Option<String>,
    /// Billed client.
    pub client: Client,
    /// Billed lines.
    pub items: Vec<LineItem>,
    /// Whether GST is charged.
    #[serde(default)]
    pub is_gst: bool,
    /// GST percent.
    #[serde(default)]
    pub gst_rate: Decimal,
    /// Flat discount.
    #[serde(default)]
    pub discount: Decimal,
    /// Legacy scalar prior payment.
    #[serde(default)]
    pub advances: Decimal,
}

/// Breakdown of an invoice total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceTotals {
    /// Sum of line amounts.
    pub subtotal: Decimal,
    /// GST charged.
    pub gst: Decimal,
    /// Discount applied.
    pub discount: Decimal,
    /// Rounded grand total, never negative.
    pub total: Decimal,
}

/// Payment state derived from the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    /// Nothing received.
    Unpaid,
    /// Something received, balance outstanding.
    Partial,
    /// Balance at or below zero.
    Paid,
}

/// An invoice with every derived figure.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceStatement {
    /// The invoice, with line amounts recomputed.
    pub invoice: Invoice,
    /// Total breakdown.
    pub totals: InvoiceTotals,
    /// Legacy advance plus payments.
    pub total_paid: Decimal,
    /// Total minus paid; negative when overpaid.
    pub balance: Decimal,
    /// Payment state.
    pub status: InvoiceStatus,
    /// Total in words for the printed bill.
    pub amount_in_words: String,
}
