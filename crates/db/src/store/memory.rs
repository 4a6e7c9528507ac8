//! In-process document store.
//!
//! Used by tests and by single-user deployments that do not need durability.
//! A commit holds the write lock for its whole duration, so batches are atomic.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use sitebook_core::backup::SnapshotTree;
use tokio::sync::{RwLock, broadcast};

use super::{
    CHANGE_FEED_CAPACITY, ChangeEvent, DocumentStore, StoreError, Subscription, WriteBatch,
    WriteOp, merged, new_document_id, split_path,
};

/// Document store held in memory.
#[derive(Debug)]
pub struct MemoryStore {
    tree: RwLock<SnapshotTree>,
    changes: broadcast::Sender<ChangeEvent>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            tree: RwLock::new(SnapshotTree::new()),
            changes,
        }
    }

    fn notify(&self, events: Vec<ChangeEvent>) {
        for event in events {
            // No receivers is fine.
            let _ = self.changes.send(event);
        }
    }
}

fn upserted(collection: &str, id: &str) -> ChangeEvent {
    ChangeEvent::Upserted {
        collection: collection.to_string(),
        id: id.to_string(),
    }
}

fn deleted(collection: &str, id: &str) -> ChangeEvent {
    ChangeEvent::Deleted {
        collection: collection.to_string(),
        id: id.to_string(),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn read_once(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let (collection, id) = split_path(path)?;
        let tree = self.tree.read().await;
        Ok(tree.get(collection).and_then(|docs| docs.get(id)).cloned())
    }

    async fn read_collection(&self, collection: &str) -> Result<Vec<(String, Value)>, StoreError> {
        let tree = self.tree.read().await;
        Ok(tree
            .get(collection)
            .map(|docs| docs.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }

    async fn append(&self, collection: &str, document: Value) -> Result<String, StoreError> {
        let id = new_document_id();
        let path = format!("{collection}/{id}");
        split_path(&path)?;
        if !document.is_object() {
            return Err(StoreError::InvalidDocument(path));
        }

        self.tree
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), document);
        self.notify(vec![upserted(collection, &id)]);
        Ok(id)
    }

    async fn write(&self, path: &str, partial: Value) -> Result<(), StoreError> {
        let (collection, id) = split_path(path)?;
        if !partial.is_object() {
            return Err(StoreError::InvalidDocument(path.to_string()));
        }

        {
            let mut tree = self.tree.write().await;
            let docs = tree.entry(collection.to_string()).or_default();
            let next = merged(docs.remove(id), &partial);
            docs.insert(id.to_string(), next);
        }
        self.notify(vec![upserted(collection, id)]);
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        let (collection, id) = split_path(path)?;
        let removed = {
            let mut tree = self.tree.write().await;
            tree.get_mut(collection)
                .and_then(|docs| docs.remove(id))
                .is_some()
        };
        if removed {
            self.notify(vec![deleted(collection, id)]);
        }
        Ok(())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        batch.validate()?;

        let mut events = Vec::with_capacity(batch.ops().len());
        {
            let mut tree = self.tree.write().await;

            for pre in batch.preconditions() {
                let (collection, id) = split_path(&pre.path)?;
                let current = tree.get(collection).and_then(|docs| docs.get(id));
                if current != pre.expected.as_ref() {
                    return Err(StoreError::PreconditionFailed(pre.path.clone()));
                }
            }

            for op in batch.ops() {
                let (collection, id) = split_path(op.path())?;
                match op {
                    WriteOp::Set { document, .. } => {
                        tree.entry(collection.to_string())
                            .or_default()
                            .insert(id.to_string(), document.clone());
                        events.push(upserted(collection, id));
                    }
                    WriteOp::Merge { partial, .. } => {
                        let docs = tree.entry(collection.to_string()).or_default();
                        let next = merged(docs.remove(id), partial);
                        docs.insert(id.to_string(), next);
                        events.push(upserted(collection, id));
                    }
                    WriteOp::Delete { .. } => {
                        if let Some(docs) = tree.get_mut(collection) {
                            docs.remove(id);
                        }
                        events.push(deleted(collection, id));
                    }
                }
            }
        }

        self.notify(events);
        Ok(())
    }

    async fn export_tree(&self) -> Result<SnapshotTree, StoreError> {
        Ok(self.tree.read().await.clone())
    }

    async fn replace_tree(&self, tree: SnapshotTree) -> Result<(), StoreError> {
        let cleaned: SnapshotTree = tree
            .into_iter()
            .map(|(name, docs)| {
                let docs: BTreeMap<String, Value> =
                    docs.into_iter().filter(|(_, v)| v.is_object()).collect();
                (name, docs)
            })
            .collect();
        *self.tree.write().await = cleaned;
        self.notify(vec![ChangeEvent::Reset]);
        Ok(())
    }

    fn subscribe(&self, collection: &str) -> Subscription {
        Subscription::new(collection, self.changes.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ALL_COLLECTIONS;
    use serde_json::json;

    #[tokio::test]
    async fn test_append_and_read() {
        let store = MemoryStore::new();
        let id = store.append("cashbook", json!({ "amount": "10" })).await.unwrap();

        let doc = store.read_once(&format!("cashbook/{id}")).await.unwrap();
        assert_eq!(doc, Some(json!({ "amount": "10" })));
        assert_eq!(store.read_collection("cashbook").await.unwrap().len(), 1);
        assert!(store.read_collection("invoices").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_merges_and_creates() {
        let store = MemoryStore::new();
        store.write("fleet_vehicles/JCB", json!({ "driver": "Ramesh" })).await.unwrap();
        store.write("fleet_vehicles/JCB", json!({ "salary": "15000" })).await.unwrap();

        let doc = store.read_once("fleet_vehicles/JCB").await.unwrap().unwrap();
        assert_eq!(doc, json!({ "driver": "Ramesh", "salary": "15000" }));
    }

    #[tokio::test]
    async fn test_failed_precondition_writes_nothing() {
        let store = MemoryStore::new();
        store.write("invoices/a", json!({ "billNo": 1 })).await.unwrap();

        let mut batch = WriteBatch::new();
        batch
            .expect("invoices/a", Some(json!({ "billNo": 2 })))
            .merge("invoices/a", json!({ "payments": [] }));
        batch.append("cashbook", json!({ "amount": "5" }));

        let result = store.commit(batch).await;
        assert!(matches!(result, Err(StoreError::PreconditionFailed(p)) if p == "invoices/a"));
        assert!(store.read_collection("cashbook").await.unwrap().is_empty());
        assert_eq!(
            store.read_once("invoices/a").await.unwrap(),
            Some(json!({ "billNo": 1 }))
        );
    }

    #[tokio::test]
    async fn test_commit_applies_all_ops() {
        let store = MemoryStore::new();
        store.write("invoices/a", json!({ "billNo": 1 })).await.unwrap();

        let mut batch = WriteBatch::new();
        batch
            .expect("invoices/a", Some(json!({ "billNo": 1 })))
            .expect("meta/none", None)
            .merge("invoices/a", json!({ "paid": true }))
            .delete("invoices/missing");
        let id = batch.append("cashbook", json!({ "amount": "5" }));
        store.commit(batch).await.unwrap();

        assert_eq!(
            store.read_once("invoices/a").await.unwrap(),
            Some(json!({ "billNo": 1, "paid": true }))
        );
        assert!(store.read_once(&format!("cashbook/{id}")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_subscription_filters_collection() {
        let store = MemoryStore::new();
        let mut cashbook = store.subscribe("cashbook");
        let mut all = store.subscribe(ALL_COLLECTIONS);

        store.write("invoices/a", json!({})).await.unwrap();
        let id = store.append("cashbook", json!({})).await.unwrap();

        assert_eq!(
            cashbook.next().await,
            Some(ChangeEvent::Upserted {
                collection: "cashbook".to_string(),
                id
            })
        );
        assert!(matches!(
            all.next().await,
            Some(ChangeEvent::Upserted { collection, .. }) if collection == "invoices"
        ));
    }

    #[tokio::test]
    async fn test_replace_tree_resets() {
        let store = MemoryStore::new();
        store.write("workers/w1", json!({ "name": "A" })).await.unwrap();
        let mut sub = store.subscribe("workers");

        let mut tree = SnapshotTree::new();
        tree.insert(
            "invoices".to_string(),
            BTreeMap::from([("i1".to_string(), json!({ "billNo": 3 }))]),
        );
        store.replace_tree(tree.clone()).await.unwrap();

        assert_eq!(sub.next().await, Some(ChangeEvent::Reset));
        assert_eq!(store.export_tree().await.unwrap(), tree);
    }
}
