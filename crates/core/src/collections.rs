//! Names of the top-level collections in the document tree.

/// Invoices, keyed by invoice id.
pub const INVOICES: &str = "invoices";
/// Cashbook ledger entries.
pub const CASHBOOK: &str = "cashbook";
/// Fleet work entries.
pub const FLEET_ENTRIES: &str = "fleet_entries";
/// Per-vehicle aggregates, keyed by vehicle id.
pub const FLEET_VEHICLES: &str = "fleet_vehicles";
/// Worker registry.
pub const WORKERS: &str = "workers";
/// Attendance, keyed by ISO date.
pub const ATTENDANCE: &str = "attendance";
/// Advance events, keyed by worker id.
pub const LABOR_ADVANCES: &str = "labor_advances";
/// Bonus events, keyed by worker id.
pub const LABOR_BONUSES: &str = "labor_bonuses";
/// Saved clients.
pub const CLIENTS: &str = "clients";
/// Business profile shown on invoices.
pub const BUSINESS_PROFILE: &str = "business_profile";
/// Counters such as the bill sequence.
pub const META: &str = "meta";

/// Document holding the highest bill number handed out.
pub const BILL_SEQUENCE_DOC: &str = "billSequence";

/// Local store key holding the inventory item list.
pub const INVENTORY_KEY: &str = "inventory";
/// Local store key holding the stock movement log, newest first.
pub const STOCK_LOG_KEY: &str = "stock_log";

/// Collections a backup snapshot may contain.
pub const KNOWN_COLLECTIONS: &[&str] = &[
    INVOICES,
    CASHBOOK,
    FLEET_ENTRIES,
    FLEET_VEHICLES,
    WORKERS,
    ATTENDANCE,
    LABOR_ADVANCES,
    LABOR_BONUSES,
    CLIENTS,
    BUSINESS_PROFILE,
    META,
];

/// Builds a `collection/id` document path.
#[must_use]
pub fn doc_path(collection: &str, id: impl std::fmt::Display) -> String {
    format!("{collection}/{id}")
}
