use std::sync::atomic::{AtomicUsize, Ordering};

use rust_decimal_macros::dec;
use sitebook_core::cashbook::{EntryKind, PaymentMode};
use sitebook_core::invoice::{Client, InvoiceStatus, LineItem, SETTLEMENT_NOTE};
use sitebook_shared::AppError;

use super::*;
use crate::store::{MemoryStore, MockDocumentStore, StoreError};

fn draft() -> InvoiceDraft {
    InvoiceDraft {
        bill_no: None,
        date: "2025-05-02".to_string(),
        due_date: None,
        client: Client {
            name: "Patil Constructions".to_string(),
            ..Client::default()
        },
        items: vec![LineItem {
            vehicle_ref: "JCB".to_string(),
            trip_qty: dec!(2),
            rate: dec!(2500),
            ..LineItem::default()
        }],
        is_gst: true,
        gst_rate: dec!(18),
        discount: dec!(0),
        advances: dec!(0),
    }
}

fn payment(amount: rust_decimal::Decimal) -> PaymentInput {
    PaymentInput {
        date: "2025-05-10".to_string(),
        amount,
        mode: PaymentMode::Upi,
        note: String::new(),
    }
}

fn repo() -> (Arc<MemoryStore>, InvoiceRepository) {
    let store = Arc::new(MemoryStore::new());
    (store.clone(), InvoiceRepository::new(store))
}

#[tokio::test]
async fn test_create_numbers_bills_in_sequence() {
    let (store, repo) = repo();

    let first = repo.create(draft()).await.unwrap();
    let second = repo.create(draft()).await.unwrap();

    assert_eq!(first.bill_no, 1);
    assert_eq!(second.bill_no, 2);
    assert_eq!(InvoiceService::total(&first), dec!(5900));
    assert_eq!(
        store.read_once(&sequence_path()).await.unwrap(),
        Some(json!({ "last": 2 }))
    );
}

#[tokio::test]
async fn test_explicit_bill_number_moves_sequence() {
    let (_, repo) = repo();
    let mut manual = draft();
    manual.bill_no = Some(105);
    repo.create(manual.clone()).await.unwrap();

    assert_eq!(repo.next_bill_number().await.unwrap(), 106);
    assert!(matches!(
        repo.create(manual).await,
        Err(RepositoryError::Conflict(_))
    ));
}

#[tokio::test]
async fn test_concurrent_creates_get_distinct_numbers() {
    let (_, repo) = repo();
    let (a, b) = tokio::join!(repo.create(draft()), repo.create(draft()));

    let mut numbers = vec![a.unwrap().bill_no, b.unwrap().bill_no];
    numbers.sort_unstable();
    assert_eq!(numbers, vec![1, 2]);
}

#[tokio::test]
async fn test_create_retries_after_lost_race() {
    let mut store = MockDocumentStore::new();
    store.expect_read_collection().returning(|_| Ok(Vec::new()));
    store.expect_read_once().returning(|_| Ok(None));
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    store.expect_commit().times(2).returning(move |_| {
        if seen.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(StoreError::PreconditionFailed(sequence_path()))
        } else {
            Ok(())
        }
    });

    let repo = InvoiceRepository::new(Arc::new(store));
    let invoice = repo.create(draft()).await.unwrap();
    assert_eq!(invoice.bill_no, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_invalid_draft_writes_nothing() {
    let (store, repo) = repo();
    let mut bad = draft();
    bad.items.clear();

    assert!(matches!(
        repo.create(bad).await,
        Err(RepositoryError::Invoice(InvoiceError::NoItems))
    ));
    assert!(store.export_tree().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_payment_and_mirror_commit_together() {
    let (store, repo) = repo();
    let invoice = repo.create(draft()).await.unwrap();

    let (updated, entry) = repo.record_payment(&invoice, payment(dec!(2000))).await.unwrap();

    assert_eq!(InvoiceService::balance(&updated), dec!(3900));
    assert_eq!(InvoiceService::status(&updated), InvoiceStatus::Partial);
    assert_eq!(entry.kind, EntryKind::Income);
    assert_eq!(entry.amount, dec!(2000));
    assert_eq!(entry.payee, "Patil Constructions");
    assert_eq!(entry.note, format!("Bill #{} payment", invoice.bill_no));

    let stored = repo.get(invoice.id.unwrap()).await.unwrap();
    assert_eq!(stored.payments, updated.payments);
    let cashbook = load_entries(store.as_ref()).await.unwrap();
    assert_eq!(cashbook, vec![entry]);
}

#[tokio::test]
async fn test_unsaved_invoice_payment_touches_nothing() {
    // No expectations: any store call panics.
    let repo = InvoiceRepository::new(Arc::new(MockDocumentStore::new()));
    let unsaved = InvoiceService::from_draft(draft(), 1).unwrap();

    let err = repo
        .record_payment(&unsaved, payment(dec!(100)))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Invoice(InvoiceError::Unsaved)));
    assert_eq!(AppError::from(err).status_code(), 400);
}

#[tokio::test]
async fn test_non_positive_payment_touches_nothing() {
    let repo = InvoiceRepository::new(Arc::new(MockDocumentStore::new()));
    let mut saved = InvoiceService::from_draft(draft(), 1).unwrap();
    saved.id = Some(InvoiceId::new());

    let result = repo.record_payment(&saved, payment(dec!(0))).await;
    assert!(matches!(
        result,
        Err(RepositoryError::Invoice(InvoiceError::NonPositivePayment(_)))
    ));
}

#[tokio::test]
async fn test_store_failure_is_surfaced() {
    let (memory, repo) = repo();
    let invoice = repo.create(draft()).await.unwrap();
    let id = invoice.id.unwrap();
    let body = memory.read_once(&doc_path(INVOICES, id)).await.unwrap();

    let mut store = MockDocumentStore::new();
    store.expect_read_once().returning(move |_| Ok(body.clone()));
    store
        .expect_commit()
        .times(1)
        .returning(|_| Err(StoreError::Database(sea_orm::DbErr::Custom("offline".into()))));

    let failing = InvoiceRepository::new(Arc::new(store));
    let err = failing
        .record_payment(&invoice, payment(dec!(100)))
        .await
        .unwrap_err();
    let app = AppError::from(err);
    assert_eq!(app.status_code(), 503);
    assert!(app.is_retryable());
}

#[tokio::test]
async fn test_settle_pays_remaining_balance() {
    let (store, repo) = repo();
    let invoice = repo.create(draft()).await.unwrap();
    let id = invoice.id.unwrap();
    repo.record_payment(&invoice, payment(dec!(900))).await.unwrap();

    let today = NaiveDate::from_ymd_opt(2025, 5, 31).unwrap();
    let (settled, entry) = repo.mark_fully_settled(id, today).await.unwrap().unwrap();

    assert_eq!(InvoiceService::balance(&settled), dec!(0));
    let last = settled.payments.last().unwrap();
    assert_eq!(last.amount, dec!(5000));
    assert_eq!(last.note, SETTLEMENT_NOTE);
    assert_eq!(last.date, "2025-05-31");
    assert_eq!(last.mode, PaymentMode::Cash);
    assert_eq!(entry.amount, dec!(5000));

    assert!(repo.mark_fully_settled(id, today).await.unwrap().is_none());
    assert_eq!(load_entries(store.as_ref()).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_delete_payment_warns_about_mirror() {
    let (store, repo) = repo();
    let invoice = repo.create(draft()).await.unwrap();
    let id = invoice.id.unwrap();
    let (paid, entry) = repo.record_payment(&invoice, payment(dec!(1000))).await.unwrap();

    let (after, warning) = repo.delete_payment(id, paid.payments[0].id).await.unwrap();

    assert!(after.payments.is_empty());
    assert_eq!(warning.orphaned_entries, vec![entry.id]);
    assert_eq!(load_entries(store.as_ref()).await.unwrap().len(), 1);
    assert!(matches!(
        repo.delete_payment(id, paid.payments[0].id).await,
        Err(RepositoryError::Invoice(InvoiceError::PaymentNotFound(_)))
    ));
}

#[tokio::test]
async fn test_delete_invoice_needs_confirmation() {
    let (_, repo) = repo();
    let invoice = repo.create(draft()).await.unwrap();
    let id = invoice.id.unwrap();
    repo.record_payment(&invoice, payment(dec!(1000))).await.unwrap();
    repo.record_payment(&invoice, payment(dec!(500))).await.unwrap();

    assert!(matches!(
        repo.delete(id, Confirmation::Unconfirmed).await,
        Err(RepositoryError::ConfirmationRequired(_))
    ));
    assert!(repo.get(id).await.is_ok());

    let warnings = repo.delete(id, Confirmation::Confirmed).await.unwrap();
    assert_eq!(warnings.len(), 2);
    assert!(warnings.iter().all(|w| w.orphaned_entries.len() == 1));
    assert!(matches!(repo.get(id).await, Err(RepositoryError::NotFound(_))));
}

#[tokio::test]
async fn test_update_keeps_payments() {
    let (_, repo) = repo();
    let invoice = repo.create(draft()).await.unwrap();
    let id = invoice.id.unwrap();
    repo.record_payment(&invoice, payment(dec!(1000))).await.unwrap();

    let mut edit = draft();
    edit.discount = dec!(400);
    let updated = repo.update(id, edit).await.unwrap();

    assert_eq!(updated.bill_no, invoice.bill_no);
    assert_eq!(updated.payments.len(), 1);
    assert_eq!(InvoiceService::balance(&updated), dec!(4500));
}

#[tokio::test]
async fn test_legacy_document_without_payment_ids_loads() {
    let (store, repo) = repo();
    let id = InvoiceId::new();
    store
        .write(
            &doc_path(INVOICES, id),
            json!({
                "billNo": 7,
                "date": "2025-04-01",
                "client": { "name": "Old Client" },
                "items": [{ "tripQty": 1, "rate": 1000, "amount": 99 }],
                "advances": 200,
                "payments": [{ "date": "2025-04-02", "amount": "300" }]
            }),
        )
        .await
        .unwrap();

    let statement = repo.statement(id).await.unwrap();
    assert_eq!(statement.totals.total, dec!(1000));
    assert_eq!(statement.balance, dec!(500));
}

#[tokio::test]
async fn test_legacy_payments_keep_ids_and_modes_across_writes() {
    let (store, repo) = repo();
    let id = InvoiceId::new();
    let path = doc_path(INVOICES, id);
    store
        .write(
            &path,
            json!({
                "billNo": 8,
                "date": "2025-04-01",
                "client": { "name": "Old Client" },
                "items": [{ "tripQty": 1, "rate": 1000 }],
                "payments": [
                    { "date": "2025-04-02", "amount": "300", "mode": "NEFT" },
                    { "date": "2025-04-03", "amount": "100", "mode": "Cash" }
                ]
            }),
        )
        .await
        .unwrap();

    let first = repo.get(id).await.unwrap();
    let second = repo.get(id).await.unwrap();
    let legacy_id = first.payments[0].id;
    assert!(!legacy_id.is_nil());
    assert_eq!(legacy_id, second.payments[0].id);
    assert_ne!(legacy_id, first.payments[1].id);

    repo.record_payment(&first, payment(dec!(50))).await.unwrap();
    let stored = store.read_once(&path).await.unwrap().unwrap();
    assert_eq!(stored["payments"][0]["mode"], json!("NEFT"));
    assert_eq!(stored["payments"][0]["id"], json!(legacy_id.to_string()));

    let (updated, _) = repo.delete_payment(id, legacy_id).await.unwrap();
    assert_eq!(updated.payments.len(), 2);
    assert!(updated.payments.iter().all(|p| p.id != legacy_id));
    assert_eq!(updated.payments[0].mode, PaymentMode::Cash);
}
