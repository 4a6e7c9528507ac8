//! Property-based tests for InvoiceService.
//!
//! - Balance identity: balance == total - total paid
//! - Line amounts are a pure function of quantities and rate
//! - Totals never go negative and are whole rupees

use proptest::prelude::*;
use rust_decimal::Decimal;
use sitebook_shared::types::{InvoiceId, PaymentId};

use super::service::InvoiceService;
use super::types::{Client, Invoice, LineItem, Payment};
use crate::cashbook::PaymentMode;

/// Strategy for non-negative amounts with paise (0.00 to 99,999.99).
fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|paise| Decimal::new(paise, 2))
}

/// Strategy for small non-negative quantities with one decimal place.
fn quantity() -> impl Strategy<Value = Decimal> {
    (0i64..500i64).prop_map(|tenths| Decimal::new(tenths, 1))
}

fn line_item() -> impl Strategy<Value = LineItem> {
    (quantity(), quantity(), amount()).prop_map(|(brass_qty, trip_qty, rate)| LineItem {
        date: "2025-05-01".to_string(),
        vehicle_ref: "JCB".to_string(),
        description: "Work".to_string(),
        brass_qty,
        trip_qty,
        rate,
        amount: Decimal::ZERO,
    })
}

fn payment() -> impl Strategy<Value = Payment> {
    amount().prop_map(|amount| Payment {
        id: PaymentId::new(),
        date: "2025-05-20".to_string(),
        amount,
        mode: PaymentMode::Cash,
        note: String::new(),
    })
}

fn invoice() -> impl Strategy<Value = Invoice> {
    (
        proptest::collection::vec(line_item(), 0..6),
        any::<bool>(),
        (0i64..=100i64).prop_map(Decimal::from),
        amount(),
        amount(),
        proptest::collection::vec(payment(), 0..4),
    )
        .prop_map(|(items, is_gst, gst_rate, discount, advances, payments)| Invoice {
            id: Some(InvoiceId::new()),
            bill_no: 1,
            date: "2025-05-01".to_string(),
            due_date: None,
            client: Client {
                name: "Client".to_string(),
                ..Client::default()
            },
            items,
            is_gst,
            gst_rate,
            discount,
            advances,
            payments,
        })
}

proptest! {
    #[test]
    fn prop_balance_identity(inv in invoice()) {
        prop_assert_eq!(
            InvoiceService::balance(&inv),
            InvoiceService::total(&inv) - InvoiceService::total_paid(&inv)
        );
    }

    #[test]
    fn prop_balance_identity_legacy_advance_only(inv in invoice()) {
        let mut inv = inv;
        inv.payments.clear();
        prop_assert_eq!(InvoiceService::total_paid(&inv), inv.advances);
        prop_assert_eq!(InvoiceService::balance(&inv), InvoiceService::total(&inv) - inv.advances);
    }

    #[test]
    fn prop_item_amount_idempotent(item in line_item()) {
        let first = InvoiceService::item_amount(&item);
        let mut normalized = item.clone();
        normalized.amount = first;
        prop_assert_eq!(InvoiceService::item_amount(&normalized), first);
        prop_assert_eq!(InvoiceService::item_amount(&item), first);
    }

    #[test]
    fn prop_total_is_non_negative_whole_rupees(inv in invoice()) {
        let total = InvoiceService::total(&inv);
        prop_assert!(total >= Decimal::ZERO);
        prop_assert_eq!(total, total.trunc());
    }

    #[test]
    fn prop_settlement_clears_balance(inv in invoice()) {
        let today = chrono::NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let mut inv = inv;
        match InvoiceService::settlement_payment(&inv, today).unwrap() {
            Some(payment) => {
                prop_assert!(payment.amount > Decimal::ZERO);
                inv.payments.push(payment);
                prop_assert_eq!(InvoiceService::balance(&inv), Decimal::ZERO);
            }
            None => prop_assert!(InvoiceService::balance(&inv) <= Decimal::ZERO),
        }
    }
}
