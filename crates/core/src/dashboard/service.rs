//! Dashboard service.

use super::types::{DashboardInputs, MonthOverview};
use crate::cashbook::CashbookService;
use crate::fleet::FleetService;
use crate::inventory::InventoryService;
use crate::invoice::InvoiceService;
use crate::window::{MonthKey, MonthWindow};

/// Dashboard service.
pub struct DashboardService;

impl DashboardService {
    /// The month overview.
    #[must_use]
    pub fn month_overview(inputs: DashboardInputs<'_>, month: &MonthKey) -> MonthOverview {
        let cash = CashbookService::month_summary(inputs.cashbook, month);
        let window = MonthWindow::new(month.clone());
        let work = FleetService::work_summary(inputs.work, month, None);

        MonthOverview {
            month: month.clone(),
            income: cash.income,
            expense: cash.expense,
            net: cash.net,
            pending: cash.pending,
            invoice_count: window.count(inputs.invoices),
            invoiced: window.sum(inputs.invoices, InvoiceService::total),
            outstanding: InvoiceService::outstanding(inputs.invoices),
            work_billed: work.billed,
            unpaid_work: work.unpaid,
            low_stock_count: InventoryService::low_stock(inputs.items).len(),
            service_due: FleetService::due_for_service(inputs.vehicles, inputs.service_interval),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cashbook::{CashEntry, EntryKind, EntryStatus, PaymentMode};
    use crate::fleet::VehicleAggregate;
    use crate::invoice::{Client, Invoice, LineItem};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use sitebook_shared::types::{CashEntryId, InvoiceId};

    fn invoice(date: &str, rate: Decimal, advances: Decimal) -> Invoice {
        Invoice {
            id: Some(InvoiceId::new()),
            bill_no: 1,
            date: date.to_string(),
            due_date: None,
            client: Client::default(),
            items: vec![LineItem {
                trip_qty: dec!(1),
                rate,
                ..LineItem::default()
            }],
            is_gst: false,
            gst_rate: Decimal::ZERO,
            discount: Decimal::ZERO,
            advances,
            payments: Vec::new(),
        }
    }

    fn cash(date: &str, kind: EntryKind, amount: Decimal) -> CashEntry {
        CashEntry {
            id: CashEntryId::new(),
            date: date.to_string(),
            kind,
            category: "General".to_string(),
            site: String::new(),
            payee: String::new(),
            amount,
            mode: PaymentMode::Cash,
            note: String::new(),
            status: EntryStatus::Paid,
            timestamp: Utc::now(),
            source: None,
        }
    }

    #[test]
    fn test_month_overview() {
        let invoices = vec![
            invoice("2025-05-02", dec!(5000), dec!(1000)),
            invoice("2025-04-02", dec!(3000), dec!(3500)),
        ];
        let cashbook = vec![
            cash("2025-05-03", EntryKind::Income, dec!(1000)),
            cash("2025-05-04", EntryKind::Expense, dec!(400)),
        ];
        let vehicles = vec![VehicleAggregate {
            vehicle_id: "JCB".to_string(),
            total_running_hours: dec!(260),
            ..VehicleAggregate::default()
        }];

        let overview = DashboardService::month_overview(
            DashboardInputs {
                cashbook: &cashbook,
                invoices: &invoices,
                work: &[],
                vehicles: &vehicles,
                items: &[],
                service_interval: dec!(250),
            },
            &MonthKey::parse("2025-05").unwrap(),
        );

        assert_eq!(overview.net, dec!(600));
        assert_eq!(overview.invoice_count, 1);
        assert_eq!(overview.invoiced, dec!(5000));
        assert_eq!(overview.outstanding, dec!(4000));
        assert_eq!(overview.service_due, vec!["JCB".to_string()]);
        assert_eq!(overview.low_stock_count, 0);
    }
}
