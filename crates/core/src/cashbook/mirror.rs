//! Mirrored cashbook entries for financial events raised by other modules.

use chrono::{DateTime, Utc};
use sitebook_shared::types::CashEntryId;

use super::types::{
    CashEntry, ConsistencyWarning, EntryKind, EntryStatus, MirrorInput, MirrorKind, MirrorRef,
    PaymentMode,
};
use crate::fleet::{AdvanceRecord, FuelRecord, VehicleAggregate};
use crate::invoice::{Invoice, InvoiceError, Payment};

/// Builds the cashbook side of cross-module financial events.
pub struct CashbookMirror;

impl CashbookMirror {
    /// An Income entry for money received elsewhere.
    #[must_use]
    pub fn mirror_income(input: MirrorInput, now: DateTime<Utc>) -> CashEntry {
        Self::entry(EntryKind::Income, input, now)
    }

    /// An Expense entry for money paid elsewhere.
    #[must_use]
    pub fn mirror_expense(input: MirrorInput, now: DateTime<Utc>) -> CashEntry {
        Self::entry(EntryKind::Expense, input, now)
    }

    fn entry(kind: EntryKind, input: MirrorInput, now: DateTime<Utc>) -> CashEntry {
        CashEntry {
            id: CashEntryId::new(),
            date: input.date,
            kind,
            category: input.source.kind.category().to_string(),
            site: input.site,
            payee: input.payee,
            amount: input.amount,
            mode: input.mode,
            note: input.note,
            status: EntryStatus::Paid,
            timestamp: now,
            source: Some(input.source),
        }
    }

    /// Income entry for a payment received against a saved invoice.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::Unsaved` if the invoice has no persisted id.
    pub fn invoice_payment(
        invoice: &Invoice,
        payment: &Payment,
        now: DateTime<Utc>,
    ) -> Result<CashEntry, InvoiceError> {
        let invoice_id = invoice.id.ok_or(InvoiceError::Unsaved)?;

        let mut note = format!("Bill #{} payment", invoice.bill_no);
        if !payment.note.is_empty() {
            note.push_str(" - ");
            note.push_str(&payment.note);
        }
        let site = invoice
            .items
            .iter()
            .map(|i| i.vehicle_ref.as_str())
            .find(|v| !v.is_empty())
            .unwrap_or_default()
            .to_string();

        Ok(Self::mirror_income(
            MirrorInput {
                date: payment.date.clone(),
                site,
                payee: invoice.client.name.clone(),
                amount: payment.amount,
                mode: payment.mode.clone(),
                note,
                source: MirrorRef {
                    kind: MirrorKind::InvoicePayment,
                    record: invoice_id.to_string(),
                    detail: payment.id.to_string(),
                },
            },
            now,
        ))
    }

    /// Expense entry for a fuel purchase.
    #[must_use]
    pub fn fuel_purchase(
        vehicle: &VehicleAggregate,
        fuel: &FuelRecord,
        mode: PaymentMode,
        now: DateTime<Utc>,
    ) -> CashEntry {
        Self::mirror_expense(
            MirrorInput {
                date: fuel.date.clone(),
                site: vehicle.vehicle_id.clone(),
                payee: String::new(),
                amount: fuel.cost,
                mode,
                note: format!("Fuel for {}: {} L", vehicle.vehicle_id, fuel.litres.normalize()),
                source: MirrorRef {
                    kind: MirrorKind::FuelPurchase,
                    record: vehicle.vehicle_id.clone(),
                    detail: fuel.id.to_string(),
                },
            },
            now,
        )
    }

    /// Expense entry for an advance paid to the vehicle's driver.
    #[must_use]
    pub fn driver_advance(
        vehicle: &VehicleAggregate,
        advance: &AdvanceRecord,
        mode: PaymentMode,
        now: DateTime<Utc>,
    ) -> CashEntry {
        let mut note = format!("Driver advance for {}", vehicle.vehicle_id);
        if !advance.reason.is_empty() {
            note.push_str(" - ");
            note.push_str(&advance.reason);
        }

        Self::mirror_expense(
            MirrorInput {
                date: advance.date.clone(),
                site: vehicle.vehicle_id.clone(),
                payee: vehicle.driver.clone(),
                amount: advance.amount,
                mode,
                note,
                source: MirrorRef {
                    kind: MirrorKind::DriverAdvance,
                    record: vehicle.vehicle_id.clone(),
                    detail: advance.id.to_string(),
                },
            },
            now,
        )
    }

    /// Entries mirrored from `source`.
    pub fn mirrors_of<'a>(
        entries: &'a [CashEntry],
        source: &'a MirrorRef,
    ) -> impl Iterator<Item = &'a CashEntry> + 'a {
        entries
            .iter()
            .filter(move |e| e.source.as_ref() == Some(source))
    }

    /// Mirrors of any sub-record of `record` with the given kind.
    pub fn mirrors_of_record<'a>(
        entries: &'a [CashEntry],
        kind: MirrorKind,
        record: &'a str,
    ) -> impl Iterator<Item = &'a CashEntry> + 'a {
        entries.iter().filter(move |e| {
            e.source
                .as_ref()
                .is_some_and(|s| s.kind == kind && s.record == record)
        })
    }

    /// Warning for a deleted source whose mirrors stay in the cashbook.
    ///
    /// `orphans` lists the mirrored entries found; the warning is raised even
    /// when none are found, since older entries carry no back-reference.
    #[must_use]
    pub fn orphan_warning(source: MirrorRef, orphans: Vec<CashEntryId>) -> ConsistencyWarning {
        let what = match source.kind {
            MirrorKind::InvoicePayment => "invoice payment",
            MirrorKind::FuelPurchase => "fuel purchase",
            MirrorKind::DriverAdvance => "driver advance",
        };
        let message = if orphans.is_empty() {
            format!(
                "Deleted {what} may have a mirrored cashbook entry; check the cashbook and remove it by hand if needed"
            )
        } else {
            format!(
                "Deleted {what} still has {} mirrored cashbook entr{}; remove {} by hand if needed",
                orphans.len(),
                if orphans.len() == 1 { "y" } else { "ies" },
                if orphans.len() == 1 { "it" } else { "them" },
            )
        };

        ConsistencyWarning {
            source,
            orphaned_entries: orphans,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::{Client, LineItem};
    use rust_decimal_macros::dec;
    use sitebook_shared::types::{FuelRecordId, InvoiceId, PaymentId};

    fn saved_invoice() -> Invoice {
        Invoice {
            id: Some(InvoiceId::new()),
            bill_no: 101,
            date: "2025-05-03".to_string(),
            due_date: None,
            client: Client {
                name: "Patil Builders".to_string(),
                ..Client::default()
            },
            items: vec![LineItem {
                vehicle_ref: "JCB".to_string(),
                brass_qty: dec!(10),
                rate: dec!(500),
                ..LineItem::default()
            }],
            is_gst: false,
            gst_rate: dec!(0),
            discount: dec!(0),
            advances: dec!(0),
            payments: Vec::new(),
        }
    }

    fn payment(note: &str) -> Payment {
        Payment {
            id: PaymentId::new(),
            date: "2025-05-10".to_string(),
            amount: dec!(2000),
            mode: PaymentMode::Upi,
            note: note.to_string(),
        }
    }

    #[test]
    fn test_invoice_payment_mirror() {
        let invoice = saved_invoice();
        let payment = payment("cheque cleared");
        let entry = CashbookMirror::invoice_payment(&invoice, &payment, Utc::now()).unwrap();

        assert_eq!(entry.kind, EntryKind::Income);
        assert_eq!(entry.amount, dec!(2000));
        assert_eq!(entry.mode, PaymentMode::Upi);
        assert_eq!(entry.category, "Invoice Payment");
        assert_eq!(entry.site, "JCB");
        assert_eq!(entry.payee, "Patil Builders");
        assert_eq!(entry.note, "Bill #101 payment - cheque cleared");

        let source = entry.source.unwrap();
        assert_eq!(source.kind, MirrorKind::InvoicePayment);
        assert_eq!(source.detail, payment.id.to_string());
    }

    #[test]
    fn test_unsaved_invoice_produces_no_mirror() {
        let mut invoice = saved_invoice();
        invoice.id = None;
        assert_eq!(
            CashbookMirror::invoice_payment(&invoice, &payment(""), Utc::now()),
            Err(InvoiceError::Unsaved)
        );
    }

    #[test]
    fn test_fuel_mirror_and_lookup() {
        let vehicle = VehicleAggregate {
            vehicle_id: "JCB".to_string(),
            ..VehicleAggregate::default()
        };
        let fuel = FuelRecord {
            id: FuelRecordId::new(),
            date: "2025-05-03".to_string(),
            litres: dec!(40.0),
            cost: dec!(3800),
        };
        let entry = CashbookMirror::fuel_purchase(&vehicle, &fuel, PaymentMode::Cash, Utc::now());
        assert_eq!(entry.kind, EntryKind::Expense);
        assert_eq!(entry.category, "Fuel");
        assert_eq!(entry.note, "Fuel for JCB: 40 L");

        let source = entry.source.clone().unwrap();
        let entries = vec![entry];
        assert_eq!(CashbookMirror::mirrors_of(&entries, &source).count(), 1);
        assert_eq!(
            CashbookMirror::mirrors_of_record(&entries, MirrorKind::FuelPurchase, "JCB").count(),
            1
        );
        assert_eq!(
            CashbookMirror::mirrors_of_record(&entries, MirrorKind::DriverAdvance, "JCB").count(),
            0
        );
    }

    #[test]
    fn test_orphan_warning_message() {
        let source = MirrorRef {
            kind: MirrorKind::FuelPurchase,
            record: "JCB".to_string(),
            detail: "x".to_string(),
        };
        let warning = CashbookMirror::orphan_warning(source.clone(), vec![CashEntryId::new()]);
        assert_eq!(
            warning.message,
            "Deleted fuel purchase still has 1 mirrored cashbook entry; remove it by hand if needed"
        );

        let warning = CashbookMirror::orphan_warning(source, Vec::new());
        assert!(warning.orphaned_entries.is_empty());
        assert!(warning.message.starts_with("Deleted fuel purchase may have"));
    }
}
