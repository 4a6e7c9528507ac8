//! Fleet cost and service aggregation.

pub mod error;
pub mod service;
pub mod types;


pub use error::FleetError;
pub use service::FleetService;
pub use types::{
    AdvanceRecord, FuelRecord, NewAdvance, NewFuelRecord, NewWorkEntry, ServiceStatus,
    VehicleAggregate, VehicleMonth, VehicleUpdate, WorkEntry, WorkSummary,
};
