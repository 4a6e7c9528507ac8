//! Shared types, errors, and configuration for SiteBook.
//!
//! This crate provides common types used across all other crates:
//! - Rupee amounts with decimal precision
//! - Typed IDs for type-safe document references
//! - Pagination over in-memory collection projections
//! - Operator confirmation for destructive actions
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, BusinessConfig};
pub use error::{AppError, AppResult};
