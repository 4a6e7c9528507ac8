//! Cashbook data types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sitebook_shared::types::CashEntryId;

use crate::window::{Dated, MonthKey};

/// Direction of a cashbook entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// Money in.
    Income,
    /// Money out.
    Expense,
}

/// Settlement state of a cashbook entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryStatus {
    /// Cash has moved.
    #[default]
    Paid,
    /// Recorded but not yet settled.
    Pending,
}

/// How money changed hands.
///
/// Stored as its display string. Modes outside the known set keep their
/// original text so older records survive a rewrite unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentMode {
    /// Cash.
    #[default]
    Cash,
    /// UPI transfer.
    Upi,
    /// Bank transfer (NEFT/RTGS/IMPS).
    BankTransfer,
    /// Cheque.
    Cheque,
    /// Any other mode, as written.
    Other(String),
}

impl PaymentMode {
    /// The stored and displayed name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Cash => "Cash",
            Self::Upi => "UPI",
            Self::BankTransfer => "Bank Transfer",
            Self::Cheque => "Cheque",
            Self::Other(mode) => mode,
        }
    }
}

impl From<String> for PaymentMode {
    fn from(mode: String) -> Self {
        match mode.as_str() {
            "Cash" => Self::Cash,
            "UPI" => Self::Upi,
            "Bank Transfer" => Self::BankTransfer,
            "Cheque" => Self::Cheque,
            _ => Self::Other(mode),
        }
    }
}

impl From<PaymentMode> for String {
    fn from(mode: PaymentMode) -> Self {
        match mode {
            PaymentMode::Other(mode) => mode,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of record a mirrored entry was generated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MirrorKind {
    /// A payment recorded against an invoice.
    InvoicePayment,
    /// A fuel purchase logged for a vehicle.
    FuelPurchase,
    /// An advance paid to a vehicle's driver.
    DriverAdvance,
}

impl MirrorKind {
    /// Cashbook category used for entries of this kind.
    #[must_use]
    pub const fn category(self) -> &'static str {
        match self {
            Self::InvoicePayment => "Invoice Payment",
            Self::FuelPurchase => "Fuel",
            Self::DriverAdvance => "Driver Advance",
        }
    }
}

/// Back-reference from a mirrored entry to the record that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorRef {
    /// Source kind.
    pub kind: MirrorKind,
    /// Owning record (invoice id or vehicle id).
    pub record: String,
    /// Sub-record (payment, fuel or advance id).
    pub detail: String,
}

/// A cashbook ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashEntry {
    /// Entry ID (the document key).
    #[serde(default)]
    pub id: CashEntryId,
    /// ISO date.
    pub date: String,
    /// Income or expense.
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Category, e.g. "Fuel".
    #[serde(default)]
    pub category: String,
    /// Site or vehicle reference.
    #[serde(default)]
    pub site: String,
    /// Who paid or was paid.
    #[serde(default)]
    pub payee: String,
    /// Amount, always positive.
    pub amount: Decimal,
    /// Payment mode.
    #[serde(default)]
    pub mode: PaymentMode,
    /// Free-text note.
    #[serde(default)]
    pub note: String,
    /// Settlement state.
    #[serde(default)]
    pub status: EntryStatus,
    /// When the entry was written.
    #[serde(default)]
    pub timestamp: DateTime<Utc>,
    /// Originating record for mirrored entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<MirrorRef>,
}

impl Dated for CashEntry {
    fn date(&self) -> &str {
        &self.date
    }
}

/// Input for a manual cashbook entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCashEntry {
    /// ISO date.
    pub date: String,
    /// Income or expense.
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Category.
    pub category: String,
    /// Site or vehicle reference.
    #[serde(default)]
    pub site: String,
    /// Payee.
    #[serde(default)]
    pub payee: String,
    /// Amount.
    pub amount: Decimal,
    /// Payment mode.
    #[serde(default)]
    pub mode: PaymentMode,
    /// Note.
    #[serde(default)]
    pub note: String,
    /// Settlement state.
    #[serde(default)]
    pub status: EntryStatus,
}

/// Fields of a mirrored entry supplied by the originating module.
#[derive(Debug, Clone)]
pub struct MirrorInput {
    /// ISO date of the financial event.
    pub date: String,
    /// Site, vehicle or client reference.
    pub site: String,
    /// Counterparty.
    pub payee: String,
    /// Amount.
    pub amount: Decimal,
    /// Payment mode.
    pub mode: PaymentMode,
    /// Human-readable note pointing at the source record.
    pub note: String,
    /// The source record.
    pub source: MirrorRef,
}

/// A delete left mirrored cashbook entries behind.
///
/// Mirrors are never removed with their source. The operator reconciles by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyWarning {
    /// The deleted record.
    pub source: MirrorRef,
    /// Cashbook entries still referencing it.
    pub orphaned_entries: Vec<CashEntryId>,
    /// Operator-facing message.
    pub message: String,
}

/// Cashbook totals for one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashbookSummary {
    /// Month covered.
    pub month: MonthKey,
    /// Sum of income entries.
    pub income: Decimal,
    /// Sum of expense entries.
    pub expense: Decimal,
    /// Income minus expense.
    pub net: Decimal,
    /// Sum of entries still pending, of either kind.
    pub pending: Decimal,
    /// Expense totals per category.
    pub expense_by_category: BTreeMap<String, Decimal>,
    /// Income totals per category.
    pub income_by_category: BTreeMap<String, Decimal>,
    /// Number of entries in the month.
    pub count: usize,
}
