//! Dashboard data types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cashbook::CashEntry;
use crate::fleet::{VehicleAggregate, WorkEntry};
use crate::inventory::InventoryItem;
use crate::invoice::Invoice;
use crate::window::MonthKey;

/// Collections the overview is computed from.
#[derive(Debug, Clone, Copy)]
pub struct DashboardInputs<'a> {
    /// Cashbook entries.
    pub cashbook: &'a [CashEntry],
    /// All invoices.
    pub invoices: &'a [Invoice],
    /// Fleet work entries.
    pub work: &'a [WorkEntry],
    /// Vehicle aggregates.
    pub vehicles: &'a [VehicleAggregate],
    /// Inventory items.
    pub items: &'a [InventoryItem],
    /// Service interval in running hours.
    pub service_interval: Decimal,
}

/// Key figures for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthOverview {
    /// Month covered.
    pub month: MonthKey,
    /// Cashbook income.
    pub income: Decimal,
    /// Cashbook expense.
    pub expense: Decimal,
    /// Net cash profit.
    pub net: Decimal,
    /// Cashbook entries still pending.
    pub pending: Decimal,
    /// Invoices dated in the month.
    pub invoice_count: usize,
    /// Sum of their totals.
    pub invoiced: Decimal,
    /// Positive balances across all invoices.
    pub outstanding: Decimal,
    /// Fleet work billed in the month.
    pub work_billed: Decimal,
    /// Of which unpaid.
    pub unpaid_work: Decimal,
    /// Items at or below reorder level.
    pub low_stock_count: usize,
    /// Vehicles due for service.
    pub service_due: Vec<String>,
}
