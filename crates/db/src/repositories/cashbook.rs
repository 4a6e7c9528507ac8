//! Cashbook repository.

use std::sync::Arc;

use chrono::Utc;
use sitebook_core::cashbook::{
    CashEntry, CashbookError, CashbookMirror, CashbookService, CashbookSummary,
    ConsistencyWarning, MirrorRef, NewCashEntry,
};
use sitebook_core::collections::{CASHBOOK, doc_path};
use sitebook_core::window::MonthKey;
use sitebook_shared::types::{CashEntryId, Confirmation};
use tracing::{info, warn};

use super::document::{decode_all, to_document};
use super::error::{RepositoryError, require_confirmation};
use crate::store::{DocumentStore, StoreError};

/// Cashbook repository.
#[derive(Clone)]
pub struct CashbookRepository {
    store: Arc<dyn DocumentStore>,
}

impl CashbookRepository {
    /// Creates a new cashbook repository.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Every entry, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn list(&self) -> Result<Vec<CashEntry>, RepositoryError> {
        let mut entries = load_entries(self.store.as_ref()).await?;
        CashbookService::sort_newest_first(&mut entries);
        Ok(entries)
    }

    /// Entries dated in `month`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn month(&self, month: &MonthKey) -> Result<Vec<CashEntry>, RepositoryError> {
        let entries = load_entries(self.store.as_ref()).await?;
        Ok(CashbookService::month_entries(&entries, month))
    }

    /// Totals for `month`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn summary(&self, month: &MonthKey) -> Result<CashbookSummary, RepositoryError> {
        let entries = load_entries(self.store.as_ref()).await?;
        Ok(CashbookService::month_summary(&entries, month))
    }

    /// Records a manual entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry is invalid or the write fails.
    pub async fn create(&self, input: NewCashEntry) -> Result<CashEntry, RepositoryError> {
        let mut entry = CashbookService::prepare_entry(input, Utc::now())?;

        let key = self
            .store
            .append(CASHBOOK, to_document(&entry, "id")?)
            .await?;
        entry.id = key
            .parse::<CashEntryId>()
            .map_err(|_| StoreError::InvalidPath(doc_path(CASHBOOK, &key)))?;

        info!(entry_id = %entry.id, kind = ?entry.kind, amount = %entry.amount, "Cashbook entry recorded");
        Ok(entry)
    }

    /// Deletes an entry.
    ///
    /// Deleting a mirrored entry leaves its source record untouched.
    ///
    /// # Errors
    ///
    /// Returns an error without confirmation, if the entry does not exist, or
    /// if the store fails.
    pub async fn delete(
        &self,
        id: CashEntryId,
        confirm: Confirmation,
    ) -> Result<Option<MirrorRef>, RepositoryError> {
        require_confirmation(confirm, "delete a cashbook entry")?;

        let path = doc_path(CASHBOOK, id);
        let Some(body) = self.store.read_once(&path).await? else {
            return Err(CashbookError::EntryNotFound(id).into());
        };
        let source = body
            .get("source")
            .cloned()
            .and_then(|s| serde_json::from_value::<MirrorRef>(s).ok());

        self.store.delete(&path).await?;
        if let Some(source) = &source {
            warn!(entry_id = %id, kind = ?source.kind, record = %source.record, "Deleted a mirrored cashbook entry; its source record is unchanged");
        } else {
            info!(entry_id = %id, "Cashbook entry deleted");
        }
        Ok(source)
    }
}

/// Reads and decodes the whole cashbook.
pub(crate) async fn load_entries(store: &dyn DocumentStore) -> Result<Vec<CashEntry>, RepositoryError> {
    let docs = store.read_collection(CASHBOOK).await?;
    Ok(decode_all(CASHBOOK, docs, "id"))
}

/// Builds and logs the warning for a deleted mirror source.
pub(crate) async fn orphan_warning(
    store: &dyn DocumentStore,
    source: MirrorRef,
) -> Result<ConsistencyWarning, RepositoryError> {
    let entries = load_entries(store).await?;
    Ok(warn_orphans(&entries, source))
}

/// Same as [`orphan_warning`] over an already loaded cashbook.
pub(crate) fn warn_orphans(entries: &[CashEntry], source: MirrorRef) -> ConsistencyWarning {
    let orphans: Vec<CashEntryId> = CashbookMirror::mirrors_of(entries, &source)
        .map(|e| e.id)
        .collect();
    let warning = CashbookMirror::orphan_warning(source, orphans);
    warn!(
        kind = ?warning.source.kind,
        record = %warning.source.record,
        detail = %warning.source.detail,
        orphans = warning.orphaned_entries.len(),
        "{}",
        warning.message
    );
    warning
}
