//! Inventory error types.

use rust_decimal::Decimal;
use sitebook_shared::types::InventoryItemId;
use thiserror::Error;

/// Inventory-related errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    /// Item name missing.
    #[error("Item name is required")]
    MissingName,

    /// Stock change of zero or less.
    #[error("Quantity must be positive, got {0}")]
    NonPositiveQuantity(Decimal),

    /// Negative opening quantity, reorder level or price.
    #[error("{0} cannot be negative")]
    Negative(&'static str),

    /// Removal larger than the stock on hand.
    #[error("Cannot remove {requested}, only {available} in stock")]
    InsufficientStock {
        /// Quantity on hand.
        available: Decimal,
        /// Quantity requested.
        requested: Decimal,
    },

    /// No item with this id.
    #[error("Inventory item not found: {0}")]
    ItemNotFound(InventoryItemId),
}
