//! Invoice repository.
//!
//! Every multi-document change (a payment plus its cashbook mirror, a new
//! invoice plus the bill sequence) is one [`WriteBatch`] guarded by a
//! precondition on the document it was computed from.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde_json::{Value, json};
use sitebook_core::cashbook::{CashEntry, CashbookMirror, ConsistencyWarning, MirrorKind, MirrorRef};
use sitebook_core::collections::{BILL_SEQUENCE_DOC, CASHBOOK, INVOICES, META, doc_path};
use sitebook_core::invoice::{
    Invoice, InvoiceDraft, InvoiceError, InvoiceService, InvoiceStatement, PaymentInput,
};
use sitebook_shared::types::{Confirmation, InvoiceId, PaymentId};
use tracing::{debug, info};

use super::cashbook::{load_entries, orphan_warning, warn_orphans};
use super::document::{decode_all, from_document, to_document};
use super::error::{RepositoryError, require_confirmation};
use super::{MAX_ATTEMPTS, is_contention};
use crate::store::{DocumentStore, WriteBatch};

/// Field of the bill sequence document holding the last number issued.
const LAST_BILL_FIELD: &str = "last";

/// Invoice repository.
#[derive(Clone)]
pub struct InvoiceRepository {
    store: Arc<dyn DocumentStore>,
}

impl InvoiceRepository {
    /// Creates a new invoice repository.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Every invoice, highest bill number first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn list(&self) -> Result<Vec<Invoice>, RepositoryError> {
        let docs = self.store.read_collection(INVOICES).await?;
        let mut invoices = decode_invoices(docs);
        invoices.sort_by(|a, b| b.bill_no.cmp(&a.bill_no).then(b.date.cmp(&a.date)));
        Ok(invoices)
    }

    /// Finds an invoice by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if it does not exist.
    pub async fn get(&self, id: InvoiceId) -> Result<Invoice, RepositoryError> {
        self.load(id).await.map(|(_, invoice)| invoice)
    }

    /// The invoice with its totals, balance and status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if it does not exist.
    pub async fn statement(&self, id: InvoiceId) -> Result<InvoiceStatement, RepositoryError> {
        let invoice = self.get(id).await?;
        Ok(InvoiceService::statement(&invoice))
    }

    /// The bill number the next invoice would get.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn next_bill_number(&self) -> Result<u64, RepositoryError> {
        let invoices = self.list().await?;
        let sequence = self.store.read_once(&sequence_path()).await?;
        Ok(next_number(&invoices, sequence.as_ref()))
    }

    /// Saves a new invoice.
    ///
    /// Without an explicit bill number the next free one is taken. The bill
    /// sequence document is advanced in the same batch; if another writer got
    /// there first the number is recomputed and the save retried.
    ///
    /// # Errors
    ///
    /// Returns an error if the draft is invalid, the bill number is taken, or
    /// the store fails.
    pub async fn create(&self, draft: InvoiceDraft) -> Result<Invoice, RepositoryError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_create(draft.clone()).await {
                Err(e) if is_contention(&e) && attempt < MAX_ATTEMPTS => {
                    debug!(attempt, "Bill sequence moved, retrying invoice save");
                }
                Err(e) if is_contention(&e) => {
                    return Err(RepositoryError::Conflict(
                        "Bill number was taken by another save, try again".to_string(),
                    ));
                }
                other => return other,
            }
        }
    }

    async fn try_create(&self, draft: InvoiceDraft) -> Result<Invoice, RepositoryError> {
        let invoices = self.list().await?;
        let sequence = self.store.read_once(&sequence_path()).await?;

        let bill_no = match draft.bill_no {
            Some(n) => {
                ensure_unique(&invoices, n, None)?;
                n
            }
            None => next_number(&invoices, sequence.as_ref()),
        };

        let id = InvoiceId::new();
        let mut invoice = InvoiceService::from_draft(draft, bill_no)?;
        invoice.id = Some(id);

        let issued = last_issued(sequence.as_ref()).max(bill_no);
        let mut batch = WriteBatch::new();
        batch
            .expect(sequence_path(), sequence)
            .set(sequence_path(), json!({ LAST_BILL_FIELD: issued }))
            .set(doc_path(INVOICES, id), to_document(&invoice, "id")?);
        self.store.commit(batch).await?;

        info!(invoice_id = %id, bill_no, total = %InvoiceService::total(&invoice), "Invoice created");
        Ok(invoice)
    }

    /// Replaces an invoice's editable fields, keeping its payments.
    ///
    /// # Errors
    ///
    /// Returns an error if the invoice does not exist, the draft is invalid,
    /// the new bill number is taken, or the invoice changed concurrently.
    pub async fn update(&self, id: InvoiceId, draft: InvoiceDraft) -> Result<Invoice, RepositoryError> {
        let (current, existing) = self.load(id).await?;

        let bill_no = draft.bill_no.unwrap_or(existing.bill_no);
        if bill_no != existing.bill_no {
            ensure_unique(&self.list().await?, bill_no, Some(id))?;
        }
        let invoice = InvoiceService::apply_draft(existing, draft, bill_no)?;

        let path = doc_path(INVOICES, id);
        let mut batch = WriteBatch::new();
        batch
            .expect(path.clone(), Some(current))
            .set(path, to_document(&invoice, "id")?);
        self.commit_or_conflict(batch).await?;

        info!(invoice_id = %id, bill_no, "Invoice updated");
        Ok(invoice)
    }

    /// Records a payment against `invoice` and mirrors it into the cashbook.
    ///
    /// The invoice must already be saved; an unsaved invoice or a
    /// non-positive amount is rejected before anything is read or written.
    /// The payment and its Income entry land in one atomic write.
    ///
    /// # Errors
    ///
    /// Returns an error if the payment is invalid, the invoice is gone, or the
    /// store fails.
    pub async fn record_payment(
        &self,
        invoice: &Invoice,
        input: PaymentInput,
    ) -> Result<(Invoice, CashEntry), RepositoryError> {
        let payment = InvoiceService::validate_payment(invoice, input)?;
        let id = invoice.id.ok_or(InvoiceError::Unsaved)?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            let (current, mut stored) = self.load(id).await?;
            let entry = CashbookMirror::invoice_payment(&stored, &payment, Utc::now())?;
            stored.payments.push(payment.clone());

            match self.commit_payment(id, current, &stored, &entry).await {
                Err(e) if is_contention(&e) && attempt < MAX_ATTEMPTS => {
                    debug!(invoice_id = %id, attempt, "Invoice changed during payment, retrying");
                }
                Err(e) => return Err(e),
                Ok(()) => {
                    info!(
                        invoice_id = %id,
                        payment_id = %payment.id,
                        amount = %payment.amount,
                        cash_entry_id = %entry.id,
                        "Payment recorded"
                    );
                    return Ok((stored, entry));
                }
            }
        }
    }

    /// Pays off whatever is left, dated `today`.
    ///
    /// Returns `None` when nothing is due.
    ///
    /// # Errors
    ///
    /// Returns an error if the invoice is gone or the store fails.
    pub async fn mark_fully_settled(
        &self,
        id: InvoiceId,
        today: NaiveDate,
    ) -> Result<Option<(Invoice, CashEntry)>, RepositoryError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let (current, mut stored) = self.load(id).await?;
            let Some(payment) = InvoiceService::settlement_payment(&stored, today)? else {
                debug!(invoice_id = %id, "Nothing due, settlement skipped");
                return Ok(None);
            };
            let entry = CashbookMirror::invoice_payment(&stored, &payment, Utc::now())?;
            stored.payments.push(payment.clone());

            match self.commit_payment(id, current, &stored, &entry).await {
                Err(e) if is_contention(&e) && attempt < MAX_ATTEMPTS => {
                    debug!(invoice_id = %id, attempt, "Invoice changed during settlement, retrying");
                }
                Err(e) => return Err(e),
                Ok(()) => {
                    info!(invoice_id = %id, amount = %payment.amount, "Invoice settled in full");
                    return Ok(Some((stored, entry)));
                }
            }
        }
    }

    /// Removes a payment.
    ///
    /// Its cashbook mirror is left in place and reported in the warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the invoice or payment does not exist, or the
    /// invoice changed concurrently.
    pub async fn delete_payment(
        &self,
        id: InvoiceId,
        payment_id: PaymentId,
    ) -> Result<(Invoice, ConsistencyWarning), RepositoryError> {
        let (current, mut invoice) = self.load(id).await?;
        InvoiceService::remove_payment(&mut invoice, payment_id)?;

        let path = doc_path(INVOICES, id);
        let mut batch = WriteBatch::new();
        batch
            .expect(path.clone(), Some(current))
            .merge(path, json!({ "payments": invoice.payments }));
        self.commit_or_conflict(batch).await?;

        let warning = orphan_warning(
            self.store.as_ref(),
            MirrorRef {
                kind: MirrorKind::InvoicePayment,
                record: id.to_string(),
                detail: payment_id.to_string(),
            },
        )
        .await?;
        Ok((invoice, warning))
    }

    /// Deletes an invoice.
    ///
    /// Returns one warning per payment whose cashbook mirror stays behind.
    ///
    /// # Errors
    ///
    /// Returns an error without confirmation, if the invoice does not exist,
    /// or if the store fails.
    pub async fn delete(
        &self,
        id: InvoiceId,
        confirm: Confirmation,
    ) -> Result<Vec<ConsistencyWarning>, RepositoryError> {
        require_confirmation(confirm, "delete an invoice")?;
        let (_, invoice) = self.load(id).await?;

        self.store.delete(&doc_path(INVOICES, id)).await?;
        info!(invoice_id = %id, bill_no = invoice.bill_no, "Invoice deleted");

        if invoice.payments.is_empty() {
            return Ok(Vec::new());
        }

        let entries = load_entries(self.store.as_ref()).await?;
        let record = id.to_string();
        let mirrored =
            CashbookMirror::mirrors_of_record(&entries, MirrorKind::InvoicePayment, &record).count();
        debug!(invoice_id = %id, mirrored, "Mirrored entries left in cashbook");

        let warnings = invoice
            .payments
            .iter()
            .map(|payment| {
                warn_orphans(
                    &entries,
                    MirrorRef {
                        kind: MirrorKind::InvoicePayment,
                        record: record.clone(),
                        detail: payment.id.to_string(),
                    },
                )
            })
            .collect();
        Ok(warnings)
    }

    async fn load(&self, id: InvoiceId) -> Result<(Value, Invoice), RepositoryError> {
        let path = doc_path(INVOICES, id);
        let Some(body) = self.store.read_once(&path).await? else {
            return Err(RepositoryError::NotFound(format!("Invoice {id}")));
        };
        let mut invoice = from_document(INVOICES, &id.to_string(), body.clone(), "id")?;
        InvoiceService::assign_missing_ids(&mut invoice);
        Ok((body, invoice))
    }

    async fn commit_payment(
        &self,
        id: InvoiceId,
        current: Value,
        invoice: &Invoice,
        entry: &CashEntry,
    ) -> Result<(), RepositoryError> {
        let path = doc_path(INVOICES, id);
        let mut batch = WriteBatch::new();
        batch
            .expect(path.clone(), Some(current))
            .merge(path, json!({ "payments": invoice.payments }))
            .set(doc_path(CASHBOOK, entry.id), to_document(entry, "id")?);
        self.store.commit(batch).await?;
        Ok(())
    }

    async fn commit_or_conflict(&self, batch: WriteBatch) -> Result<(), RepositoryError> {
        match self.store.commit(batch).await {
            Ok(()) => Ok(()),
            Err(e) => {
                let e = RepositoryError::from(e);
                if is_contention(&e) {
                    Err(RepositoryError::Conflict(
                        "Invoice was changed by someone else, reload and try again".to_string(),
                    ))
                } else {
                    Err(e)
                }
            }
        }
    }
}

/// Decodes stored invoices, giving legacy payments their derived ids.
pub(crate) fn decode_invoices(docs: Vec<(String, Value)>) -> Vec<Invoice> {
    let mut invoices: Vec<Invoice> = decode_all(INVOICES, docs, "id");
    for invoice in &mut invoices {
        InvoiceService::assign_missing_ids(invoice);
    }
    invoices
}

fn sequence_path() -> String {
    doc_path(META, BILL_SEQUENCE_DOC)
}

fn last_issued(sequence: Option<&Value>) -> u64 {
    sequence
        .and_then(|doc| doc.get(LAST_BILL_FIELD))
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

fn next_number(invoices: &[Invoice], sequence: Option<&Value>) -> u64 {
    InvoiceService::next_bill_number(invoices).max(last_issued(sequence) + 1)
}

fn ensure_unique(
    invoices: &[Invoice],
    bill_no: u64,
    except: Option<InvoiceId>,
) -> Result<(), RepositoryError> {
    let taken = invoices
        .iter()
        .any(|i| i.bill_no == bill_no && (except.is_none() || i.id != except));
    if taken {
        return Err(RepositoryError::Conflict(format!(
            "Bill number {bill_no} is already used"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests;
