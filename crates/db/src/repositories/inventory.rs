//! Inventory repository over the local store.
//!
//! Items and the stock log live under two local keys. Every change rewrites
//! both with one file write while holding the repository's mutation lock, so
//! the log always agrees with the quantities.

use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use sitebook_core::collections::{INVENTORY_KEY, STOCK_LOG_KEY};
use sitebook_core::inventory::{
    DEFAULT_LOG_LIMIT, InventoryError, InventoryItem, InventoryService, NewInventoryItem,
    StockChange, StockMovement, StockValuation,
};
use sitebook_shared::types::{Confirmation, InventoryItemId};
use tokio::sync::Mutex;
use tracing::info;

use super::error::{RepositoryError, require_confirmation};
use crate::store::LocalStore;

/// Inventory repository.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    local: LocalStore,
    log_limit: usize,
    lock: Arc<Mutex<()>>,
}

impl InventoryRepository {
    /// Creates a repository keeping the default number of log entries.
    #[must_use]
    pub fn new(local: LocalStore) -> Self {
        Self::with_log_limit(local, DEFAULT_LOG_LIMIT)
    }

    /// Creates a repository keeping `log_limit` log entries.
    #[must_use]
    pub fn with_log_limit(local: LocalStore, log_limit: usize) -> Self {
        Self {
            local,
            log_limit: log_limit.max(1),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Every item, by name.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Corrupt`] when the stored list is unreadable.
    pub fn list(&self) -> Result<Vec<InventoryItem>, RepositoryError> {
        let mut items = self.items()?;
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    /// Items at or below their reorder level.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Corrupt`] when the stored list is unreadable.
    pub fn low_stock(&self) -> Result<Vec<InventoryItem>, RepositoryError> {
        Ok(InventoryService::low_stock(&self.items()?)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Stock value overall and per category.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Corrupt`] when the stored list is unreadable.
    pub fn valuation(&self) -> Result<StockValuation, RepositoryError> {
        Ok(InventoryService::valuation(&self.items()?))
    }

    /// Recent stock movements, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Corrupt`] when the stored log is unreadable.
    pub fn log(&self) -> Result<Vec<StockMovement>, RepositoryError> {
        read_local(&self.local, STOCK_LOG_KEY)
    }

    /// Registers an item with its opening stock.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid details or a failed write.
    pub async fn create(&self, input: NewInventoryItem) -> Result<InventoryItem, RepositoryError> {
        let _guard = self.lock.lock().await;
        let (item, movement) = InventoryService::create(input, Utc::now())?;

        let mut items = self.items()?;
        items.push(item.clone());
        self.save(&items, movement).await?;

        info!(item_id = %item.id, name = %item.name, qty = %item.qty, "Inventory item created");
        Ok(item)
    }

    /// Receives stock into an item.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown item, a non-positive quantity, or a
    /// failed write.
    pub async fn add_stock(&self, id: InventoryItemId, change: StockChange) -> Result<InventoryItem, RepositoryError> {
        self.change_stock(id, |item| InventoryService::add_stock(item, change, Utc::now()))
            .await
    }

    /// Issues stock from an item.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown item, a bad quantity, more than is on
    /// hand, or a failed write.
    pub async fn remove_stock(&self, id: InventoryItemId, change: StockChange) -> Result<InventoryItem, RepositoryError> {
        self.change_stock(id, |item| InventoryService::remove_stock(item, change, Utc::now()))
            .await
    }

    /// Deletes an item. Its log entries stay.
    ///
    /// # Errors
    ///
    /// Returns an error without confirmation, for an unknown item, or if the
    /// write fails.
    pub async fn delete(&self, id: InventoryItemId, confirm: Confirmation) -> Result<InventoryItem, RepositoryError> {
        require_confirmation(confirm, "delete an inventory item")?;
        let _guard = self.lock.lock().await;

        let mut items = self.items()?;
        let index = position(&items, id)?;
        let removed = items.remove(index);
        self.local.set(INVENTORY_KEY, &items).await?;

        info!(item_id = %id, name = %removed.name, "Inventory item deleted");
        Ok(removed)
    }

    async fn change_stock<F>(&self, id: InventoryItemId, apply: F) -> Result<InventoryItem, RepositoryError>
    where
        F: FnOnce(&mut InventoryItem) -> Result<StockMovement, InventoryError>,
    {
        let _guard = self.lock.lock().await;

        let mut items = self.items()?;
        let index = position(&items, id)?;
        let movement = apply(&mut items[index])?;
        let item = items[index].clone();

        info!(item_id = %id, kind = ?movement.kind, qty = %movement.qty, balance = %movement.balance_after, "Stock moved");
        self.save(&items, movement).await?;
        Ok(item)
    }

    fn items(&self) -> Result<Vec<InventoryItem>, RepositoryError> {
        stored_items(&self.local)
    }

    async fn save(&self, items: &[InventoryItem], movement: StockMovement) -> Result<(), RepositoryError> {
        let mut log = self.log()?;
        InventoryService::push_log(&mut log, movement, self.log_limit);
        self.local
            .set_many(vec![
                (INVENTORY_KEY.to_string(), serde_json::to_value(items)?),
                (STOCK_LOG_KEY.to_string(), serde_json::to_value(&log)?),
            ])
            .await?;
        Ok(())
    }
}

fn position(items: &[InventoryItem], id: InventoryItemId) -> Result<usize, RepositoryError> {
    items
        .iter()
        .position(|i| i.id == id)
        .ok_or_else(|| InventoryError::ItemNotFound(id).into())
}

/// Stored inventory items, shared with the dashboard.
pub(crate) fn stored_items(local: &LocalStore) -> Result<Vec<InventoryItem>, RepositoryError> {
    read_local(local, INVENTORY_KEY)
}

fn read_local<T: DeserializeOwned + Default>(local: &LocalStore, key: &str) -> Result<T, RepositoryError> {
    local
        .get_or_default(key)
        .map_err(|source| RepositoryError::Corrupt {
            path: format!("local/{key}"),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use sitebook_core::inventory::MovementKind;

    fn cement(qty: Decimal) -> NewInventoryItem {
        NewInventoryItem {
            name: "Cement".to_string(),
            category: "Material".to_string(),
            qty,
            unit: "bag".to_string(),
            min_reorder_level: dec!(10),
            unit_price: dec!(380),
        }
    }

    fn change(qty: Decimal) -> StockChange {
        StockChange {
            qty,
            note: String::new(),
        }
    }

    #[tokio::test]
    async fn test_stock_moves_are_logged_newest_first() {
        let repo = InventoryRepository::new(LocalStore::in_memory());
        let item = repo.create(cement(dec!(20))).await.unwrap();

        repo.add_stock(item.id, change(dec!(5))).await.unwrap();
        let item = repo.remove_stock(item.id, change(dec!(18))).await.unwrap();
        assert_eq!(item.qty, dec!(7));

        let log = repo.log().unwrap();
        assert_eq!(log.len(), 3);
        assert_eq!(log[0].kind, MovementKind::Removed);
        assert_eq!(log[0].balance_after, dec!(7));
        assert_eq!(log[2].kind, MovementKind::Created);

        assert_eq!(repo.low_stock().unwrap(), vec![item]);
        assert_eq!(repo.valuation().unwrap().total_value, dec!(2660));
    }

    #[tokio::test]
    async fn test_overdraw_changes_nothing() {
        let repo = InventoryRepository::new(LocalStore::in_memory());
        let item = repo.create(cement(dec!(3))).await.unwrap();

        assert!(matches!(
            repo.remove_stock(item.id, change(dec!(4))).await,
            Err(RepositoryError::Inventory(InventoryError::InsufficientStock { .. }))
        ));
        assert_eq!(repo.list().unwrap()[0].qty, dec!(3));
        assert_eq!(repo.log().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_log_is_capped() {
        let repo = InventoryRepository::with_log_limit(LocalStore::in_memory(), 3);
        let item = repo.create(cement(dec!(1))).await.unwrap();
        for _ in 0..5 {
            repo.add_stock(item.id, change(dec!(1))).await.unwrap();
        }
        let log = repo.log().unwrap();
        assert_eq!(log.len(), 3);
        assert_eq!(log[0].balance_after, dec!(6));
    }

    #[tokio::test]
    async fn test_delete_needs_confirmation() {
        let repo = InventoryRepository::new(LocalStore::in_memory());
        let item = repo.create(cement(dec!(1))).await.unwrap();

        assert!(matches!(
            repo.delete(item.id, Confirmation::Unconfirmed).await,
            Err(RepositoryError::ConfirmationRequired(_))
        ));
        repo.delete(item.id, Confirmation::Confirmed).await.unwrap();
        assert!(repo.list().unwrap().is_empty());
        assert!(matches!(
            repo.add_stock(item.id, change(dec!(1))).await,
            Err(RepositoryError::Inventory(InventoryError::ItemNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_receipts_all_land() {
        let repo = InventoryRepository::new(LocalStore::in_memory());
        let item = repo.create(cement(dec!(0))).await.unwrap();

        let (a, b, c) = tokio::join!(
            repo.add_stock(item.id, change(dec!(1))),
            repo.add_stock(item.id, change(dec!(2))),
            repo.add_stock(item.id, change(dec!(3))),
        );
        a.unwrap();
        b.unwrap();
        c.unwrap();
        assert_eq!(repo.list().unwrap()[0].qty, dec!(6));
    }

    #[tokio::test]
    async fn test_unreadable_items_are_never_overwritten() {
        let local = LocalStore::in_memory();
        let stored = json!([{ "id": 7, "name": "Cement", "qty": "20" }]);
        local.set(INVENTORY_KEY, &stored).await.unwrap();
        let repo = InventoryRepository::new(local.clone());

        assert!(matches!(repo.list(), Err(RepositoryError::Corrupt { ref path, .. }) if path == "local/inventory"));
        assert!(matches!(
            repo.create(cement(dec!(5))).await,
            Err(RepositoryError::Corrupt { .. })
        ));
        assert_eq!(local.get(INVENTORY_KEY), Some(stored));
        assert_eq!(local.get(STOCK_LOG_KEY), None);
    }

    #[tokio::test]
    async fn test_unreadable_log_blocks_stock_moves() {
        let local = LocalStore::in_memory();
        let repo = InventoryRepository::new(local.clone());
        let item = repo.create(cement(dec!(5))).await.unwrap();
        local.set(STOCK_LOG_KEY, &json!({ "entries": [] })).await.unwrap();

        assert!(matches!(
            repo.add_stock(item.id, change(dec!(1))).await,
            Err(RepositoryError::Corrupt { .. })
        ));
        assert_eq!(repo.list().unwrap()[0].qty, dec!(5));
        assert_eq!(local.get(STOCK_LOG_KEY), Some(json!({ "entries": [] })));
    }
}
