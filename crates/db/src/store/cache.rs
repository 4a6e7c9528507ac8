//! Collection read caching using Moka.
//!
//! Reports and the dashboard read whole collections many times per request
//! burst. [`CachedStore`] keeps the last read of each collection and drops it
//! whenever the collection changes.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use serde_json::Value;
use sitebook_core::backup::SnapshotTree;
use tokio::task::JoinHandle;
use tracing::debug;

use super::{
    ALL_COLLECTIONS, ChangeEvent, DocumentStore, StoreError, Subscription, WriteBatch,
    split_path,
};

/// Default cache capacity (number of collections).
const DEFAULT_CACHE_CAPACITY: u64 = 64;

/// Default time-to-live for cached collections (2 minutes).
const DEFAULT_TTL_SECS: u64 = 120;

type Documents = Arc<Vec<(String, Value)>>;

/// Read-through cache in front of another store.
#[derive(Clone)]
pub struct CachedStore {
    inner: Arc<dyn DocumentStore>,
    cache: Cache<String, Documents>,
    // Bumped on every invalidation; a read that raced a write is not cached.
    generation: Arc<AtomicU64>,
}

impl CachedStore {
    /// Wraps `inner` with default settings.
    #[must_use]
    pub fn new(inner: Arc<dyn DocumentStore>) -> Self {
        Self::with_config(inner, DEFAULT_CACHE_CAPACITY, DEFAULT_TTL_SECS)
    }

    /// Wraps `inner` with a custom capacity and TTL.
    #[must_use]
    pub fn with_config(inner: Arc<dyn DocumentStore>, max_capacity: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self {
            inner,
            cache,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of cached collections.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Runs pending cache maintenance.
    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }

    async fn invalidate(&self, collection: &str) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cache.invalidate(collection).await;
    }

    /// Caches a read taken at generation `before`. An invalidation that
    /// lands between the check and the insert evicts the entry again.
    async fn remember(&self, collection: &str, docs: &[(String, Value)], before: u64) {
        if self.generation.load(Ordering::SeqCst) != before {
            return;
        }
        self.cache
            .insert(collection.to_string(), Arc::new(docs.to_vec()))
            .await;
        if self.generation.load(Ordering::SeqCst) != before {
            debug!(collection, "Collection changed while caching, evicting");
            self.cache.invalidate(collection).await;
        }
    }

    fn invalidate_all(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cache.invalidate_all();
    }

    /// Follows the inner store's change feed so writes made by other
    /// holders of the inner store also evict cached collections.
    pub fn spawn_invalidator(&self) -> JoinHandle<()> {
        let this = self.clone();
        let mut changes = self.inner.subscribe(ALL_COLLECTIONS);
        tokio::spawn(async move {
            while let Some(event) = changes.next().await {
                match event {
                    ChangeEvent::Upserted { collection, .. }
                    | ChangeEvent::Deleted { collection, .. } => {
                        this.invalidate(&collection).await;
                    }
                    ChangeEvent::Reset => this.invalidate_all(),
                }
            }
            debug!("Change feed closed, cache invalidator stopped");
        })
    }
}

impl std::fmt::Debug for CachedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedStore")
            .field("entries", &self.cache.entry_count())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DocumentStore for CachedStore {
    async fn read_once(&self, path: &str) -> Result<Option<Value>, StoreError> {
        self.inner.read_once(path).await
    }

    async fn read_collection(&self, collection: &str) -> Result<Vec<(String, Value)>, StoreError> {
        if let Some(cached) = self.cache.get(collection).await {
            return Ok((*cached).clone());
        }

        let before = self.generation.load(Ordering::SeqCst);
        let docs = self.inner.read_collection(collection).await?;
        self.remember(collection, &docs, before).await;
        Ok(docs)
    }

    async fn append(&self, collection: &str, document: Value) -> Result<String, StoreError> {
        let result = self.inner.append(collection, document).await;
        self.invalidate(collection).await;
        result
    }

    async fn write(&self, path: &str, partial: Value) -> Result<(), StoreError> {
        let (collection, _) = split_path(path)?;
        let result = self.inner.write(path, partial).await;
        self.invalidate(collection).await;
        result
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        let (collection, _) = split_path(path)?;
        let result = self.inner.delete(path).await;
        self.invalidate(collection).await;
        result
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut touched: Vec<String> = batch
            .ops()
            .iter()
            .filter_map(|op| split_path(op.path()).ok())
            .map(|(collection, _)| collection.to_string())
            .collect();
        touched.sort();
        touched.dedup();

        let result = self.inner.commit(batch).await;
        for collection in &touched {
            self.invalidate(collection).await;
        }
        result
    }

    async fn export_tree(&self) -> Result<SnapshotTree, StoreError> {
        self.inner.export_tree().await
    }

    async fn replace_tree(&self, tree: SnapshotTree) -> Result<(), StoreError> {
        let result = self.inner.replace_tree(tree).await;
        self.invalidate_all();
        result
    }

    fn subscribe(&self, collection: &str) -> Subscription {
        self.inner.subscribe(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, MockDocumentStore};
    use serde_json::json;

    #[tokio::test]
    async fn test_second_read_hits_cache() {
        let mut inner = MockDocumentStore::new();
        inner
            .expect_read_collection()
            .times(1)
            .returning(|_| Ok(vec![("a".to_string(), json!({ "billNo": 1 }))]));
        let store = CachedStore::new(Arc::new(inner));

        let first = store.read_collection("invoices").await.unwrap();
        let second = store.read_collection("invoices").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_write_invalidates_collection() {
        let store = CachedStore::new(Arc::new(MemoryStore::new()));
        assert!(store.read_collection("cashbook").await.unwrap().is_empty());

        store.append("cashbook", json!({ "amount": "10" })).await.unwrap();
        assert_eq!(store.read_collection("cashbook").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_commit_invalidates_touched_collections() {
        let store = CachedStore::new(Arc::new(MemoryStore::new()));
        store.read_collection("invoices").await.unwrap();
        store.read_collection("cashbook").await.unwrap();

        let mut batch = WriteBatch::new();
        batch.set("invoices/a", json!({ "billNo": 1 }));
        batch.append("cashbook", json!({ "amount": "5" }));
        store.commit(batch).await.unwrap();

        assert_eq!(store.read_collection("invoices").await.unwrap().len(), 1);
        assert_eq!(store.read_collection("cashbook").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_inner_write_still_invalidates() {
        let mut inner = MockDocumentStore::new();
        inner
            .expect_read_collection()
            .times(2)
            .returning(|_| Ok(Vec::new()));
        inner
            .expect_write()
            .returning(|path, _| Err(StoreError::PreconditionFailed(path.to_string())));
        let store = CachedStore::new(Arc::new(inner));

        store.read_collection("workers").await.unwrap();
        assert!(store.write("workers/w1", json!({})).await.is_err());
        store.read_collection("workers").await.unwrap();
    }

    #[tokio::test]
    async fn test_read_from_an_older_generation_is_not_cached() {
        let store = CachedStore::new(Arc::new(MemoryStore::new()));
        let docs = vec![("a".to_string(), json!({ "billNo": 1 }))];

        let before = store.generation.load(Ordering::SeqCst);
        store.invalidate("invoices").await;
        store.remember("invoices", &docs, before).await;
        store.run_pending_tasks().await;
        assert_eq!(store.entry_count(), 0);

        let current = store.generation.load(Ordering::SeqCst);
        store.remember("invoices", &docs, current).await;
        store.run_pending_tasks().await;
        assert_eq!(store.entry_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_reads_racing_writes_never_leave_stale_entries() {
        let store = CachedStore::new(Arc::new(MemoryStore::new()));

        for n in 0..100 {
            let reader = store.clone();
            let writer = store.clone();
            let read = tokio::spawn(async move { reader.read_collection("workers").await });
            let write = tokio::spawn(async move {
                writer.write(&format!("workers/w{n}"), json!({ "n": n })).await
            });
            read.await.unwrap().unwrap();
            write.await.unwrap().unwrap();

            assert_eq!(store.read_collection("workers").await.unwrap().len(), n + 1);
        }
    }

    #[tokio::test]
    async fn test_invalidator_follows_inner_writes() {
        let inner = Arc::new(MemoryStore::new());
        let store = CachedStore::new(inner.clone());
        let handle = store.spawn_invalidator();

        store.read_collection("workers").await.unwrap();
        let mut feed = inner.subscribe("workers");
        inner.write("workers/w1", json!({ "name": "A" })).await.unwrap();
        feed.next().await;
        tokio::task::yield_now().await;

        // The invalidator runs concurrently; poll until it has caught up.
        let mut seen = 0;
        for _ in 0..50 {
            seen = store.read_collection("workers").await.unwrap().len();
            if seen == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(seen, 1);
        handle.abort();
    }
}
