//! Document store over a SQL table via `SeaORM`.
//!
//! Runs on SQLite for a single-site install and on Postgres for shared ones.
//! Batches run inside one database transaction; on Postgres the rows named by
//! preconditions are read `FOR UPDATE`. A precondition that a row is absent
//! claims the key with an insert-only write, since there is no row to lock.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::Value;
use sitebook_core::backup::SnapshotTree;
use tokio::sync::broadcast;
use tracing::debug;

use super::{
    CHANGE_FEED_CAPACITY, ChangeEvent, DocumentStore, StoreError, Subscription, WriteBatch,
    WriteOp, merged, new_document_id, split_path,
};
use crate::entities::documents;

/// SQL-backed document store.
#[derive(Debug, Clone)]
pub struct SqlDocumentStore {
    db: DatabaseConnection,
    changes: broadcast::Sender<ChangeEvent>,
}

impl SqlDocumentStore {
    /// Wraps a migrated connection.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self { db, changes }
    }

    /// The underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    fn notify(&self, events: Vec<ChangeEvent>) {
        for event in events {
            let _ = self.changes.send(event);
        }
    }
}

async fn find<C: ConnectionTrait>(
    conn: &C,
    collection: &str,
    id: &str,
    lock: bool,
) -> Result<Option<Value>, StoreError> {
    let mut query = documents::Entity::find()
        .filter(documents::Column::Collection.eq(collection))
        .filter(documents::Column::DocId.eq(id));
    if lock && conn.get_database_backend() == DbBackend::Postgres {
        query = query.lock_exclusive();
    }
    Ok(query.one(conn).await?.map(|row| row.body))
}

async fn upsert<C: ConnectionTrait>(
    conn: &C,
    collection: &str,
    id: &str,
    body: Value,
) -> Result<(), StoreError> {
    let row = documents::ActiveModel {
        collection: Set(collection.to_string()),
        doc_id: Set(id.to_string()),
        body: Set(body),
        updated_at: Set(Utc::now()),
    };
    documents::Entity::insert(row)
        .on_conflict(
            OnConflict::columns([documents::Column::Collection, documents::Column::DocId])
                .update_columns([documents::Column::Body, documents::Column::UpdatedAt])
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

/// Inserts an empty placeholder unless the key exists. Returns whether the
/// row was created by this call.
async fn claim<C: ConnectionTrait>(conn: &C, collection: &str, id: &str) -> Result<bool, StoreError> {
    let row = documents::ActiveModel {
        collection: Set(collection.to_string()),
        doc_id: Set(id.to_string()),
        body: Set(Value::Object(serde_json::Map::new())),
        updated_at: Set(Utc::now()),
    };
    let inserted = documents::Entity::insert(row)
        .on_conflict(
            OnConflict::columns([documents::Column::Collection, documents::Column::DocId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    Ok(inserted == 1)
}

async fn remove<C: ConnectionTrait>(conn: &C, collection: &str, id: &str) -> Result<u64, StoreError> {
    let result = documents::Entity::delete_by_id((collection.to_string(), id.to_string()))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

#[async_trait]
impl DocumentStore for SqlDocumentStore {
    async fn read_once(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let (collection, id) = split_path(path)?;
        find(&self.db, collection, id, false).await
    }

    async fn read_collection(&self, collection: &str) -> Result<Vec<(String, Value)>, StoreError> {
        let rows = documents::Entity::find()
            .filter(documents::Column::Collection.eq(collection))
            .order_by_asc(documents::Column::DocId)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|row| (row.doc_id, row.body)).collect())
    }

    async fn append(&self, collection: &str, document: Value) -> Result<String, StoreError> {
        let id = new_document_id();
        let path = format!("{collection}/{id}");
        split_path(&path)?;
        if !document.is_object() {
            return Err(StoreError::InvalidDocument(path));
        }

        upsert(&self.db, collection, &id, document).await?;
        self.notify(vec![ChangeEvent::Upserted {
            collection: collection.to_string(),
            id: id.clone(),
        }]);
        Ok(id)
    }

    async fn write(&self, path: &str, partial: Value) -> Result<(), StoreError> {
        let (collection, id) = split_path(path)?;
        if !partial.is_object() {
            return Err(StoreError::InvalidDocument(path.to_string()));
        }

        let txn = self.db.begin().await?;
        let current = find(&txn, collection, id, true).await?;
        upsert(&txn, collection, id, merged(current, &partial)).await?;
        txn.commit().await?;

        self.notify(vec![ChangeEvent::Upserted {
            collection: collection.to_string(),
            id: id.to_string(),
        }]);
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        let (collection, id) = split_path(path)?;
        if remove(&self.db, collection, id).await? > 0 {
            self.notify(vec![ChangeEvent::Deleted {
                collection: collection.to_string(),
                id: id.to_string(),
            }]);
        }
        Ok(())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        batch.validate()?;

        let txn = self.db.begin().await?;

        let mut claimed = Vec::new();
        for pre in batch.preconditions() {
            let (collection, id) = split_path(&pre.path)?;
            let current = find(&txn, collection, id, true).await?;
            let held = match (&current, &pre.expected) {
                (None, None) => claim(&txn, collection, id).await?,
                _ => current == pre.expected,
            };
            if !held {
                debug!(path = %pre.path, "Batch precondition failed");
                return Err(StoreError::PreconditionFailed(pre.path.clone()));
            }
            if current.is_none() {
                claimed.push(pre.path.as_str());
            }
        }

        let mut events = Vec::with_capacity(batch.ops().len());
        for op in batch.ops() {
            let (collection, id) = split_path(op.path())?;
            match op {
                WriteOp::Set { document, .. } => {
                    upsert(&txn, collection, id, document.clone()).await?;
                    events.push(ChangeEvent::Upserted {
                        collection: collection.to_string(),
                        id: id.to_string(),
                    });
                }
                WriteOp::Merge { partial, .. } => {
                    let current = find(&txn, collection, id, true).await?;
                    upsert(&txn, collection, id, merged(current, partial)).await?;
                    events.push(ChangeEvent::Upserted {
                        collection: collection.to_string(),
                        id: id.to_string(),
                    });
                }
                WriteOp::Delete { .. } => {
                    remove(&txn, collection, id).await?;
                    events.push(ChangeEvent::Deleted {
                        collection: collection.to_string(),
                        id: id.to_string(),
                    });
                }
            }
        }

        for path in claimed {
            if !batch.ops().iter().any(|op| op.path() == path) {
                let (collection, id) = split_path(path)?;
                remove(&txn, collection, id).await?;
            }
        }

        txn.commit().await?;
        self.notify(events);
        Ok(())
    }

    async fn export_tree(&self) -> Result<SnapshotTree, StoreError> {
        let rows = documents::Entity::find()
            .order_by_asc(documents::Column::Collection)
            .order_by_asc(documents::Column::DocId)
            .all(&self.db)
            .await?;

        let mut tree = SnapshotTree::new();
        for row in rows {
            tree.entry(row.collection)
                .or_default()
                .insert(row.doc_id, row.body);
        }
        Ok(tree)
    }

    async fn replace_tree(&self, tree: SnapshotTree) -> Result<(), StoreError> {
        let txn = self.db.begin().await?;
        documents::Entity::delete_many().exec(&txn).await?;

        let mut written = 0usize;
        for (collection, docs) in tree {
            for (id, body) in docs {
                if body.is_object() && split_path(&format!("{collection}/{id}")).is_ok() {
                    upsert(&txn, &collection, &id, body).await?;
                    written += 1;
                }
            }
        }
        txn.commit().await?;

        debug!(documents = written, "Document tree replaced");
        self.notify(vec![ChangeEvent::Reset]);
        Ok(())
    }

    fn subscribe(&self, collection: &str) -> Subscription {
        Subscription::new(collection, self.changes.subscribe())
    }
}
