//! Full-tree JSON snapshots.
//!
//! Shape: one top-level key per collection holding `{ docId: document }`,
//! plus `local` (the local fallback store) and `exportedAt`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::error::BackupError;
use crate::collections::{INVENTORY_KEY, KNOWN_COLLECTIONS, STOCK_LOG_KEY};
use crate::inventory::{InventoryItem, StockMovement};

/// Top-level key holding the local store's values.
pub const LOCAL_KEY: &str = "local";

/// Top-level key holding the export time.
pub const EXPORTED_AT_KEY: &str = "exportedAt";

/// Collection name to documents by id.
pub type SnapshotTree = BTreeMap<String, BTreeMap<String, Value>>;

/// A backup of both stores.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// When the snapshot was taken.
    pub exported_at: DateTime<Utc>,
    /// Document store collections.
    pub collections: SnapshotTree,
    /// Local store values by key.
    pub local: BTreeMap<String, Value>,
}

impl Snapshot {
    /// The snapshot as a single JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut root = Map::new();
        for (name, docs) in &self.collections {
            let docs: Map<String, Value> = docs.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            root.insert(name.clone(), Value::Object(docs));
        }
        root.insert(
            LOCAL_KEY.to_string(),
            Value::Object(self.local.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
        );
        root.insert(
            EXPORTED_AT_KEY.to_string(),
            Value::String(self.exported_at.to_rfc3339()),
        );
        Value::Object(root)
    }
}

/// A snapshot accepted for restore.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSnapshot {
    /// Known collections found.
    pub collections: SnapshotTree,
    /// Local store values, if the snapshot carried them.
    pub local: Option<BTreeMap<String, Value>>,
    /// Top-level keys that were not recognised and will not be restored.
    pub ignored: Vec<String>,
}

/// Checks an uploaded snapshot before a destructive restore.
///
/// At least one known collection must be present, and every known collection
/// must be an object whose values are objects. The local inventory and stock
/// log, when present, must decode as the lists the inventory reads.
///
/// # Errors
///
/// Returns `BackupError` if the snapshot is not acceptable.
pub fn validate_snapshot(value: &Value) -> Result<ValidatedSnapshot, BackupError> {
    let root = value.as_object().ok_or(BackupError::NotAnObject)?;

    let mut collections = SnapshotTree::new();
    let mut ignored = Vec::new();
    let mut local = None;

    for (key, body) in root {
        if key == EXPORTED_AT_KEY {
            continue;
        }
        if key == LOCAL_KEY {
            let values = body.as_object().ok_or(BackupError::MalformedLocal)?;
            check_local::<Vec<InventoryItem>>(values, INVENTORY_KEY)?;
            check_local::<Vec<StockMovement>>(values, STOCK_LOG_KEY)?;
            local = Some(values.iter().map(|(k, v)| (k.clone(), v.clone())).collect());
            continue;
        }
        if !KNOWN_COLLECTIONS.contains(&key.as_str()) {
            ignored.push(key.clone());
            continue;
        }

        let docs = body
            .as_object()
            .ok_or_else(|| BackupError::MalformedCollection(key.clone()))?;
        if docs.values().any(|d| !d.is_object()) {
            return Err(BackupError::MalformedCollection(key.clone()));
        }
        collections.insert(
            key.clone(),
            docs.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        );
    }

    if collections.is_empty() {
        return Err(BackupError::NoKnownCollections);
    }

    Ok(ValidatedSnapshot {
        collections,
        local,
        ignored,
    })
}

fn check_local<T: DeserializeOwned>(values: &Map<String, Value>, key: &str) -> Result<(), BackupError> {
    match values.get(key) {
        Some(value) => T::deserialize(value)
            .map(|_| ())
            .map_err(|e| BackupError::MalformedLocalValue {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accepts_known_collection() {
        let value = json!({
            "invoices": { "a": { "billNo": 1 } },
            "somethingElse": [1, 2],
            "exportedAt": "2025-05-01T00:00:00Z"
        });
        let snapshot = validate_snapshot(&value).unwrap();
        assert_eq!(snapshot.collections.len(), 1);
        assert_eq!(snapshot.ignored, vec!["somethingElse".to_string()]);
        assert!(snapshot.local.is_none());
    }

    #[test]
    fn test_empty_known_collection_counts() {
        let snapshot = validate_snapshot(&json!({ "cashbook": {} })).unwrap();
        assert!(snapshot.collections["cashbook"].is_empty());
    }

    #[test]
    fn test_rejects_without_known_collections() {
        assert_eq!(
            validate_snapshot(&json!({ "foo": {}, "local": {} })),
            Err(BackupError::NoKnownCollections)
        );
        assert_eq!(validate_snapshot(&json!([1, 2])), Err(BackupError::NotAnObject));
    }

    #[test]
    fn test_rejects_malformed_collection() {
        assert_eq!(
            validate_snapshot(&json!({ "workers": { "w1": 5 } })),
            Err(BackupError::MalformedCollection("workers".to_string()))
        );
        assert_eq!(
            validate_snapshot(&json!({ "workers": [] })),
            Err(BackupError::MalformedCollection("workers".to_string()))
        );
    }

    #[test]
    fn test_rejects_unreadable_local_inventory() {
        let err = validate_snapshot(&json!({
            "cashbook": {},
            "local": { "inventory": [{ "id": 7, "name": "Cement" }] }
        }))
        .unwrap_err();
        assert!(matches!(err, BackupError::MalformedLocalValue { ref key, .. } if key == "inventory"));

        assert!(matches!(
            validate_snapshot(&json!({ "cashbook": {}, "local": { "stock_log": "none" } })),
            Err(BackupError::MalformedLocalValue { .. })
        ));

        let snapshot = validate_snapshot(&json!({
            "cashbook": {},
            "local": {
                "inventory": [{ "id": "8c2d7f1e-9c8a-4a55-9d43-0f6a1c2b3d4e", "name": "Cement", "qty": "20" }],
                "theme": "dark"
            }
        }))
        .unwrap();
        assert_eq!(snapshot.local.map(|l| l.len()), Some(2));
    }

    #[test]
    fn test_export_shape_validates() {
        let mut collections = SnapshotTree::new();
        collections.insert(
            "workers".to_string(),
            BTreeMap::from([("w1".to_string(), json!({ "name": "Suresh" }))]),
        );
        let snapshot = Snapshot {
            exported_at: Utc::now(),
            collections,
            local: BTreeMap::from([("inventory".to_string(), json!([]))]),
        };

        let restored = validate_snapshot(&snapshot.to_json()).unwrap();
        assert_eq!(restored.collections, snapshot.collections);
        assert_eq!(restored.local, Some(snapshot.local));
        assert!(restored.ignored.is_empty());
    }
}
