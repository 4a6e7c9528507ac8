//! Document store boundary.
//!
//! The store is a tree of collections of JSON documents addressed by
//! `collection/id` paths. It enforces no schema; validation belongs to the
//! core services. Multi-path writes go through [`DocumentStore::commit`],
//! which applies a [`WriteBatch`] atomically and checks its preconditions
//! first.

pub mod cache;
pub mod local;
pub mod memory;
pub mod sql;

use async_trait::async_trait;
use serde_json::{Map, Value};
use sitebook_core::backup::SnapshotTree;
use thiserror::Error;
use tokio::sync::broadcast;

pub use cache::CachedStore;
pub use local::LocalStore;
pub use memory::MemoryStore;
pub use sql::SqlDocumentStore;

/// Subscribe to every collection.
pub const ALL_COLLECTIONS: &str = "*";

/// Capacity of the change feed before slow subscribers lag.
pub(crate) const CHANGE_FEED_CAPACITY: usize = 256;

/// Document store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Path is not `collection/id`.
    #[error("Invalid document path '{0}'")]
    InvalidPath(String),

    /// Written value is not a JSON object.
    #[error("Document at '{0}' must be a JSON object")]
    InvalidDocument(String),

    /// A batch precondition did not hold; nothing was written.
    #[error("Document '{0}' changed concurrently")]
    PreconditionFailed(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Local store file error.
    #[error("Local store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored value could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A change delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// Document created or updated.
    Upserted {
        /// Collection.
        collection: String,
        /// Document id.
        id: String,
    },
    /// Document removed.
    Deleted {
        /// Collection.
        collection: String,
        /// Document id.
        id: String,
    },
    /// Everything may have changed (full restore, or the subscriber lagged).
    Reset,
}

impl ChangeEvent {
    fn touches(&self, collection: &str) -> bool {
        match self {
            Self::Upserted { collection: c, .. } | Self::Deleted { collection: c, .. } => {
                collection == ALL_COLLECTIONS || c == collection
            }
            Self::Reset => true,
        }
    }
}

/// A live change feed for one collection (or all of them).
#[derive(Debug)]
pub struct Subscription {
    collection: String,
    rx: broadcast::Receiver<ChangeEvent>,
}

impl Subscription {
    pub(crate) fn new(collection: &str, rx: broadcast::Receiver<ChangeEvent>) -> Self {
        Self {
            collection: collection.to_string(),
            rx,
        }
    }

    /// Waits for the next change to the subscribed collection.
    ///
    /// A subscriber that fell behind receives `Reset` and should reload.
    /// Returns `None` once the store is dropped.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.touches(&self.collection) => return Some(event),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => return Some(ChangeEvent::Reset),
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// One write inside a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Replace (or create) the document.
    Set {
        /// Target path.
        path: String,
        /// New document.
        document: Value,
    },
    /// Shallow-merge fields into the document, creating it if absent.
    Merge {
        /// Target path.
        path: String,
        /// Fields to set.
        partial: Value,
    },
    /// Remove the document.
    Delete {
        /// Target path.
        path: String,
    },
}

impl WriteOp {
    /// The path this op writes.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Set { path, .. } | Self::Merge { path, .. } | Self::Delete { path } => path,
        }
    }
}

/// Expected current state of a document for a batch to apply.
#[derive(Debug, Clone, PartialEq)]
pub struct Precondition {
    /// Checked path.
    pub path: String,
    /// Expected document; `None` means it must not exist.
    pub expected: Option<Value>,
}

/// An atomic multi-path write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
    preconditions: Vec<Precondition>,
}

impl WriteBatch {
    /// An empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the document at `path`.
    pub fn set(&mut self, path: impl Into<String>, document: Value) -> &mut Self {
        self.ops.push(WriteOp::Set {
            path: path.into(),
            document,
        });
        self
    }

    /// Shallow-merges `partial` into the document at `path`.
    pub fn merge(&mut self, path: impl Into<String>, partial: Value) -> &mut Self {
        self.ops.push(WriteOp::Merge {
            path: path.into(),
            partial,
        });
        self
    }

    /// Adds a document under a fresh id and returns the id.
    pub fn append(&mut self, collection: &str, document: Value) -> String {
        let id = new_document_id();
        self.ops.push(WriteOp::Set {
            path: format!("{collection}/{id}"),
            document,
        });
        id
    }

    /// Removes the document at `path`.
    pub fn delete(&mut self, path: impl Into<String>) -> &mut Self {
        self.ops.push(WriteOp::Delete { path: path.into() });
        self
    }

    /// Requires the document at `path` to equal `expected` when the batch commits.
    pub fn expect(&mut self, path: impl Into<String>, expected: Option<Value>) -> &mut Self {
        self.preconditions.push(Precondition {
            path: path.into(),
            expected,
        });
        self
    }

    /// True if the batch writes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Writes in order.
    #[must_use]
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Preconditions.
    #[must_use]
    pub fn preconditions(&self) -> &[Precondition] {
        &self.preconditions
    }

    /// Checks every path and document shape before anything is applied.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` for a malformed path or a non-object document.
    pub fn validate(&self) -> Result<(), StoreError> {
        for pre in &self.preconditions {
            split_path(&pre.path)?;
        }
        for op in &self.ops {
            split_path(op.path())?;
            match op {
                WriteOp::Set { path, document: v } | WriteOp::Merge { path, partial: v } => {
                    if !v.is_object() {
                        return Err(StoreError::InvalidDocument(path.clone()));
                    }
                }
                WriteOp::Delete { .. } => {}
            }
        }
        Ok(())
    }
}

/// The document store contract.
///
/// Every method reports backend failures as `StoreError`; nothing is
/// reported as written before the backend has accepted it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads one document.
    async fn read_once(&self, path: &str) -> Result<Option<Value>, StoreError>;

    /// Reads every document in a collection as `(id, document)` pairs, ordered by id.
    async fn read_collection(&self, collection: &str) -> Result<Vec<(String, Value)>, StoreError>;

    /// Adds a document under a generated id and returns the id.
    async fn append(&self, collection: &str, document: Value) -> Result<String, StoreError>;

    /// Shallow-merges `partial` into the document at `path`, creating it if absent.
    async fn write(&self, path: &str, partial: Value) -> Result<(), StoreError>;

    /// Removes a document. Removing an absent document is not an error.
    async fn delete(&self, path: &str) -> Result<(), StoreError>;

    /// Applies a batch atomically after checking its preconditions.
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;

    /// Every collection and document.
    async fn export_tree(&self) -> Result<SnapshotTree, StoreError>;

    /// Replaces the whole tree.
    async fn replace_tree(&self, tree: SnapshotTree) -> Result<(), StoreError>;

    /// Live changes to `collection` (or [`ALL_COLLECTIONS`]).
    fn subscribe(&self, collection: &str) -> Subscription;
}

/// Splits `collection/id`.
///
/// # Errors
///
/// Returns `StoreError::InvalidPath` unless the path has exactly two non-empty segments.
pub fn split_path(path: &str) -> Result<(&str, &str), StoreError> {
    match path.split_once('/') {
        Some((collection, id))
            if !collection.is_empty() && !id.is_empty() && !id.contains('/') =>
        {
            Ok((collection, id))
        }
        _ => Err(StoreError::InvalidPath(path.to_string())),
    }
}

/// Generates a time-ordered document id.
#[must_use]
pub fn new_document_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// Shallow-merges `partial` into `target`; both must be objects.
pub(crate) fn merge_into(target: &mut Map<String, Value>, partial: &Value) {
    if let Some(fields) = partial.as_object() {
        for (key, value) in fields {
            target.insert(key.clone(), value.clone());
        }
    }
}

/// Applies a shallow merge to an optional current document.
pub(crate) fn merged(current: Option<Value>, partial: &Value) -> Value {
    let mut base = match current {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    merge_into(&mut base, partial);
    Value::Object(base)
}
