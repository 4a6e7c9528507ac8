//! Stock items and the capped movement log.

pub mod error;
pub mod service;
pub mod types;

pub use error::InventoryError;
pub use service::{DEFAULT_LOG_LIMIT, InventoryService};
pub use types::{
    InventoryItem, MovementKind, NewInventoryItem, StockChange, StockMovement, StockValuation,
};
