//! Core business logic for SiteBook.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here. Callers pass
//! in "now" and "today" so every function stays deterministic.
//!
//! # Modules
//!
//! - `window` - Month window reducer shared by every aggregator
//! - `invoice` - Invoice totals, payment ledger, bill numbers, amount in words
//! - `cashbook` - Cashbook entries, cross-module mirroring, monthly summary
//! - `payroll` - Attendance muster and monthly pay
//! - `fleet` - Vehicle costs, running-hour counter, service status
//! - `inventory` - Stock items and the movement log
//! - `dashboard` - Month overview across modules
//! - `assistant` - Rule-based chat replies
//! - `backup` - Snapshot validation for restore

pub mod assistant;
pub mod backup;
pub mod cashbook;
pub mod collections;
pub mod dashboard;
pub mod fleet;
pub mod inventory;
pub mod invoice;
pub mod payroll;
pub mod window;
