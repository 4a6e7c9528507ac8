//! Backup, restore and reset of both stores.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sitebook_core::backup::{Snapshot, SnapshotTree, validate_snapshot};
use sitebook_shared::types::Confirmation;
use tracing::{info, warn};

use super::error::{RepositoryError, require_confirmation};
use crate::store::{DocumentStore, LocalStore};

/// What a restore replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreReport {
    /// Collections written.
    pub collections: usize,
    /// Documents written across all collections.
    pub documents: usize,
    /// Whether the local store was replaced.
    pub local_restored: bool,
    /// Top-level keys that were skipped.
    pub ignored: Vec<String>,
}

/// Backup repository.
#[derive(Clone)]
pub struct BackupRepository {
    store: Arc<dyn DocumentStore>,
    local: LocalStore,
}

impl BackupRepository {
    /// Creates a new backup repository.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, local: LocalStore) -> Self {
        Self { store, local }
    }

    /// Snapshot of every collection and the local store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn export(&self, now: DateTime<Utc>) -> Result<Snapshot, RepositoryError> {
        let collections = self.store.export_tree().await?;
        let snapshot = Snapshot {
            exported_at: now,
            collections,
            local: self.local.snapshot(),
        };
        info!(
            collections = snapshot.collections.len(),
            local_keys = snapshot.local.len(),
            "Backup exported"
        );
        Ok(snapshot)
    }

    /// Replaces all data with an uploaded snapshot.
    ///
    /// The snapshot is checked before confirmation is considered, so a bad
    /// upload is reported as such. The local store is only replaced when the
    /// snapshot carries a `local` section.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid snapshot, a missing confirmation, or a
    /// failed write.
    pub async fn restore(&self, upload: &Value, confirm: Confirmation) -> Result<RestoreReport, RepositoryError> {
        let validated = validate_snapshot(upload)?;
        require_confirmation(confirm, "restore a backup over all current data")?;

        if !validated.ignored.is_empty() {
            warn!(ignored = ?validated.ignored, "Snapshot keys not restored");
        }

        let report = RestoreReport {
            collections: validated.collections.len(),
            documents: validated.collections.values().map(|docs| docs.len()).sum(),
            local_restored: validated.local.is_some(),
            ignored: validated.ignored,
        };

        self.store.replace_tree(validated.collections).await?;
        if let Some(local) = validated.local {
            self.local.replace_all(local).await?;
        }

        info!(
            collections = report.collections,
            documents = report.documents,
            local_restored = report.local_restored,
            "Backup restored"
        );
        Ok(report)
    }

    /// Deletes everything in both stores.
    ///
    /// # Errors
    ///
    /// Returns an error without confirmation or if a write fails.
    pub async fn reset_all(&self, confirm: Confirmation) -> Result<(), RepositoryError> {
        require_confirmation(confirm, "erase all data")?;

        self.store.replace_tree(SnapshotTree::new()).await?;
        self.local.replace_all(std::collections::BTreeMap::new()).await?;

        warn!("All data erased");
        Ok(())
    }
}
