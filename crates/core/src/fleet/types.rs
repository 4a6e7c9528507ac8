//! Fleet data types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sitebook_shared::types::{AdvanceRecordId, FuelRecordId, WorkEntryId};

use crate::cashbook::PaymentMode;
use crate::window::{Dated, MonthKey};

/// A fuel purchase for one vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelRecord {
    /// Record ID; nil on records stored before ids existed.
    #[serde(default = "FuelRecordId::nil")]
    pub id: FuelRecordId,
    /// ISO purchase date.
    pub date: String,
    /// Litres bought.
    #[serde(default)]
    pub litres: Decimal,
    /// Amount paid.
    pub cost: Decimal,
}

impl Dated for FuelRecord {
    fn date(&self) -> &str {
        &self.date
    }
}

/// An advance paid to a vehicle's driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceRecord {
    /// Record ID; nil on records stored before ids existed.
    #[serde(default = "AdvanceRecordId::nil")]
    pub id: AdvanceRecordId,
    /// ISO date paid.
    pub date: String,
    /// Amount paid.
    pub amount: Decimal,
    /// Reason given.
    #[serde(default)]
    pub reason: String,
}

impl Dated for AdvanceRecord {
    fn date(&self) -> &str {
        &self.date
    }
}

/// Per-vehicle aggregate document.
///
/// `total_running_hours` is a counter kept in step with work entries;
/// `FleetService::resync` rebuilds it from the entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VehicleAggregate {
    /// Vehicle name or number, also the document key.
    pub vehicle_id: String,
    /// Running-hour counter.
    pub total_running_hours: Decimal,
    /// Counter value at the last service.
    pub last_service_hours: Decimal,
    /// Assigned driver.
    pub driver: String,
    /// Driver's monthly salary.
    pub salary: Decimal,
    /// Maintenance cost booked against the vehicle.
    pub service_cost: Decimal,
    /// Advances paid to the driver.
    pub advance_history: Vec<AdvanceRecord>,
    /// Fuel purchases.
    pub fuel_history: Vec<FuelRecord>,
}

/// Editable vehicle details. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleUpdate {
    /// Assigned driver.
    pub driver: Option<String>,
    /// Monthly salary.
    pub salary: Option<Decimal>,
    /// Maintenance cost.
    pub service_cost: Option<Decimal>,
}

/// A logged job for a vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkEntry {
    /// Entry ID.
    #[serde(default)]
    pub id: WorkEntryId,
    /// ISO work date.
    pub date: String,
    /// Vehicle used.
    pub vehicle_ref: String,
    /// Client served.
    #[serde(default)]
    pub client: String,
    /// `HH:MM-HH:MM` as entered.
    #[serde(default)]
    pub time_range: String,
    /// Running hours added to the vehicle counter.
    #[serde(default)]
    pub hours: Decimal,
    /// Amount billed for the job.
    #[serde(default)]
    pub amount: Decimal,
    /// Whether the client has paid.
    #[serde(default)]
    pub is_paid: bool,
}

impl Dated for WorkEntry {
    fn date(&self) -> &str {
        &self.date
    }
}

/// Work entry as submitted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkEntry {
    /// ISO work date.
    pub date: String,
    /// Vehicle used.
    pub vehicle_ref: String,
    /// Client served.
    #[serde(default)]
    pub client: String,
    /// `HH:MM-HH:MM`; used to derive hours when they are not given.
    #[serde(default)]
    pub time_range: String,
    /// Explicit running hours.
    #[serde(default)]
    pub hours: Option<Decimal>,
    /// Amount billed.
    #[serde(default)]
    pub amount: Decimal,
    /// Paid already.
    #[serde(default)]
    pub is_paid: bool,
}

/// Fuel purchase as submitted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFuelRecord {
    /// ISO purchase date.
    pub date: String,
    /// Litres bought.
    #[serde(default)]
    pub litres: Decimal,
    /// Amount paid.
    pub cost: Decimal,
    /// How it was paid; carried to the mirrored cashbook entry.
    #[serde(default)]
    pub mode: PaymentMode,
}

/// Driver advance as submitted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAdvance {
    /// ISO date paid.
    pub date: String,
    /// Amount paid.
    pub amount: Decimal,
    /// Reason.
    #[serde(default)]
    pub reason: String,
    /// How it was paid.
    #[serde(default)]
    pub mode: PaymentMode,
}

/// One vehicle's costs for a month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleMonth {
    /// Vehicle.
    pub vehicle_id: String,
    /// Month covered.
    pub month: MonthKey,
    /// Fuel spend in the month.
    pub fuel_cost: Decimal,
    /// Fuel litres in the month.
    pub fuel_litres: Decimal,
    /// Driver advances in the month.
    pub advance_total: Decimal,
    /// Monthly salary.
    pub salary: Decimal,
    /// Maintenance cost.
    pub maintenance_cost: Decimal,
    /// Fuel, salary and maintenance combined.
    pub total_cost: Decimal,
}

/// Progress towards the next service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    /// Hours run since the last service.
    pub hours_since_service: Decimal,
    /// Share of the interval used, in percent (one decimal place).
    pub percent_used: Decimal,
    /// True once the interval has been reached.
    pub due: bool,
}

/// Work totals for a month, optionally for one vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkSummary {
    /// Month covered.
    pub month: MonthKey,
    /// Vehicle filter, if any.
    pub vehicle: Option<String>,
    /// Number of jobs.
    pub entries: usize,
    /// Running hours.
    pub hours: Decimal,
    /// Amount billed.
    pub billed: Decimal,
    /// Amount billed but unpaid.
    pub unpaid: Decimal,
}
