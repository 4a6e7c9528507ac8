//! Inventory data types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sitebook_shared::types::{InventoryItemId, StockMovementId};

/// A stocked material or part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    /// Item ID.
    pub id: InventoryItemId,
    /// Name.
    pub name: String,
    /// Category.
    #[serde(default)]
    pub category: String,
    /// Quantity on hand.
    #[serde(default)]
    pub qty: Decimal,
    /// Unit of measure.
    #[serde(default)]
    pub unit: String,
    /// Reorder threshold.
    #[serde(default)]
    pub min_reorder_level: Decimal,
    /// Price per unit.
    #[serde(default)]
    pub unit_price: Decimal,
}

/// Item as submitted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInventoryItem {
    /// Name.
    pub name: String,
    /// Category.
    #[serde(default)]
    pub category: String,
    /// Opening quantity.
    #[serde(default)]
    pub qty: Decimal,
    /// Unit of measure.
    #[serde(default)]
    pub unit: String,
    /// Reorder threshold.
    #[serde(default)]
    pub min_reorder_level: Decimal,
    /// Price per unit.
    #[serde(default)]
    pub unit_price: Decimal,
}

/// What a stock movement did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementKind {
    /// Item registered with its opening quantity.
    Created,
    /// Stock received.
    Added,
    /// Stock issued.
    Removed,
}

/// One entry in the stock movement log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    /// Movement ID.
    pub id: StockMovementId,
    /// Item moved.
    pub item_id: InventoryItemId,
    /// Item name at the time.
    pub item_name: String,
    /// Movement kind.
    pub kind: MovementKind,
    /// Quantity moved.
    pub qty: Decimal,
    /// Quantity on hand afterwards.
    pub balance_after: Decimal,
    /// Optional note.
    #[serde(default)]
    pub note: String,
    /// When it happened.
    pub timestamp: DateTime<Utc>,
}

/// Stock received or issued.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockChange {
    /// Quantity moved.
    pub qty: Decimal,
    /// Optional note.
    #[serde(default)]
    pub note: String,
}

/// Value of stock on hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockValuation {
    /// Sum of qty times unit price.
    pub total_value: Decimal,
    /// Number of items.
    pub item_count: usize,
    /// Items at or below their reorder level.
    pub low_stock_count: usize,
    /// Value per category.
    pub by_category: BTreeMap<String, Decimal>,
}
