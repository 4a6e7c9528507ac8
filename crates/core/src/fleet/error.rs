//! Fleet error types.

use rust_decimal::Decimal;
use sitebook_shared::types::{AdvanceRecordId, FuelRecordId, WorkEntryId};
use thiserror::Error;

/// Fleet-related errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FleetError {
    /// Vehicle reference missing.
    #[error("Vehicle is required")]
    MissingVehicle,

    /// Amount is zero or negative.
    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    /// Negative hours, litres, salary or cost.
    #[error("{0} cannot be negative")]
    Negative(&'static str),

    /// Time range is not `HH:MM-HH:MM`.
    #[error("Invalid time range '{0}', expected HH:MM-HH:MM")]
    InvalidTimeRange(String),

    /// Date is not `YYYY-MM-DD`.
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    /// No fuel record with this id on the vehicle.
    #[error("Fuel record not found: {0}")]
    FuelRecordNotFound(FuelRecordId),

    /// No advance with this id on the vehicle.
    #[error("Advance not found: {0}")]
    AdvanceNotFound(AdvanceRecordId),

    /// No work entry with this id.
    #[error("Work entry not found: {0}")]
    WorkEntryNotFound(WorkEntryId),
}
