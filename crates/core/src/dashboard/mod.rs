//! Dashboard month overview.
//!
//! Pulls one month of cashbook, invoice and fleet figures together with the
//! current stock and service alerts.

pub mod service;
pub mod types;

pub use service::DashboardService;
pub use types::{DashboardInputs, MonthOverview};
