//! Inventory service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sitebook_shared::types::{InventoryItemId, StockMovementId};

use super::error::InventoryError;
use super::types::{
    InventoryItem, MovementKind, NewInventoryItem, StockChange, StockMovement, StockValuation,
};

/// Default number of movements kept in the log.
pub const DEFAULT_LOG_LIMIT: usize = 50;

/// Inventory service.
pub struct InventoryService;

impl InventoryService {
    /// Registers an item and the `Created` movement for its opening stock.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError` for an empty name or negative figures.
    pub fn create(
        input: NewInventoryItem,
        now: DateTime<Utc>,
    ) -> Result<(InventoryItem, StockMovement), InventoryError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(InventoryError::MissingName);
        }
        if input.qty < Decimal::ZERO {
            return Err(InventoryError::Negative("Quantity"));
        }
        if input.min_reorder_level < Decimal::ZERO {
            return Err(InventoryError::Negative("Reorder level"));
        }
        if input.unit_price < Decimal::ZERO {
            return Err(InventoryError::Negative("Unit price"));
        }

        let item = InventoryItem {
            id: InventoryItemId::new(),
            name,
            category: input.category.trim().to_string(),
            qty: input.qty,
            unit: input.unit.trim().to_string(),
            min_reorder_level: input.min_reorder_level,
            unit_price: input.unit_price,
        };
        let movement = Self::movement(&item, MovementKind::Created, item.qty, String::new(), now);
        Ok((item, movement))
    }

    /// Receives stock.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::NonPositiveQuantity` for a quantity at or below zero.
    pub fn add_stock(
        item: &mut InventoryItem,
        change: StockChange,
        now: DateTime<Utc>,
    ) -> Result<StockMovement, InventoryError> {
        if change.qty <= Decimal::ZERO {
            return Err(InventoryError::NonPositiveQuantity(change.qty));
        }
        item.qty += change.qty;
        Ok(Self::movement(item, MovementKind::Added, change.qty, change.note, now))
    }

    /// Issues stock.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::NonPositiveQuantity` for a quantity at or below
    /// zero, or `InsufficientStock` when removing more than is on hand.
    pub fn remove_stock(
        item: &mut InventoryItem,
        change: StockChange,
        now: DateTime<Utc>,
    ) -> Result<StockMovement, InventoryError> {
        if change.qty <= Decimal::ZERO {
            return Err(InventoryError::NonPositiveQuantity(change.qty));
        }
        if change.qty > item.qty {
            return Err(InventoryError::InsufficientStock {
                available: item.qty,
                requested: change.qty,
            });
        }
        item.qty -= change.qty;
        Ok(Self::movement(item, MovementKind::Removed, change.qty, change.note, now))
    }

    /// Puts a movement at the head of the log and drops the oldest past `limit`.
    pub fn push_log(log: &mut Vec<StockMovement>, movement: StockMovement, limit: usize) {
        log.insert(0, movement);
        log.truncate(limit);
    }

    /// Items at or below their reorder level.
    #[must_use]
    pub fn low_stock(items: &[InventoryItem]) -> Vec<&InventoryItem> {
        items.iter().filter(|i| Self::is_low(i)).collect()
    }

    /// True when the item is at or below its reorder level.
    #[must_use]
    pub fn is_low(item: &InventoryItem) -> bool {
        item.qty <= item.min_reorder_level
    }

    /// Stock value overall and per category.
    #[must_use]
    pub fn valuation(items: &[InventoryItem]) -> StockValuation {
        let mut valuation = StockValuation {
            total_value: Decimal::ZERO,
            item_count: items.len(),
            low_stock_count: 0,
            by_category: std::collections::BTreeMap::new(),
        };

        for item in items {
            let value = item.qty * item.unit_price;
            valuation.total_value += value;
            *valuation
                .by_category
                .entry(item.category.clone())
                .or_insert(Decimal::ZERO) += value;
            if Self::is_low(item) {
                valuation.low_stock_count += 1;
            }
        }

        valuation
    }

    fn movement(
        item: &InventoryItem,
        kind: MovementKind,
        qty: Decimal,
        note: String,
        now: DateTime<Utc>,
    ) -> StockMovement {
        StockMovement {
            id: StockMovementId::new(),
            item_id: item.id,
            item_name: item.name.clone(),
            kind,
            qty,
            balance_after: item.qty,
            note: note.trim().to_string(),
            timestamp: now,
        }
    }
}
