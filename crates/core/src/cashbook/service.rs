//! Cashbook service: manual entries and monthly totals.

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sitebook_shared::types::CashEntryId;

use super::error::CashbookError;
use super::types::{CashEntry, CashbookSummary, EntryKind, EntryStatus, NewCashEntry};
use crate::window::{MonthKey, MonthWindow, parse_iso_date};

/// Cashbook service.
pub struct CashbookService;

impl CashbookService {
    /// Validates a manual entry.
    ///
    /// # Errors
    ///
    /// Returns `CashbookError` for a bad date, empty category or non-positive amount.
    pub fn prepare_entry(
        input: NewCashEntry,
        now: DateTime<Utc>,
    ) -> Result<CashEntry, CashbookError> {
        if parse_iso_date(&input.date).is_none() {
            return Err(CashbookError::InvalidDate(input.date));
        }
        let category = input.category.trim().to_string();
        if category.is_empty() {
            return Err(CashbookError::MissingCategory);
        }
        if input.amount <= Decimal::ZERO {
            return Err(CashbookError::NonPositiveAmount(input.amount));
        }

        Ok(CashEntry {
            id: CashEntryId::new(),
            date: input.date,
            kind: input.kind,
            category,
            site: input.site.trim().to_string(),
            payee: input.payee.trim().to_string(),
            amount: input.amount,
            mode: input.mode,
            note: input.note.trim().to_string(),
            status: input.status,
            timestamp: now,
            source: None,
        })
    }

    /// Income, expense, net and per-category totals for a month.
    ///
    /// Income and expense include pending entries; `pending` reports how much
    /// of the month is still unsettled.
    #[must_use]
    pub fn month_summary(entries: &[CashEntry], month: &MonthKey) -> CashbookSummary {
        let window = MonthWindow::new(month.clone());
        let by_kind = window.group_sum(entries, |e| e.kind, |e| e.amount);
        let income = by_kind.get(&EntryKind::Income).copied().unwrap_or_default();
        let expense = by_kind.get(&EntryKind::Expense).copied().unwrap_or_default();

        let of_kind = |kind: EntryKind| {
            move |e: &CashEntry| {
                if e.kind == kind {
                    e.amount
                } else {
                    Decimal::ZERO
                }
            }
        };
        let mut income_by_category =
            window.group_sum(entries, |e| e.category.clone(), of_kind(EntryKind::Income));
        let mut expense_by_category =
            window.group_sum(entries, |e| e.category.clone(), of_kind(EntryKind::Expense));
        income_by_category.retain(|_, v| !v.is_zero());
        expense_by_category.retain(|_, v| !v.is_zero());

        CashbookSummary {
            month: month.clone(),
            income,
            expense,
            net: income - expense,
            pending: window.sum(entries, |e| {
                if e.status == EntryStatus::Pending {
                    e.amount
                } else {
                    Decimal::ZERO
                }
            }),
            expense_by_category,
            income_by_category,
            count: window.count(entries),
        }
    }

    /// Entries in the month, newest first.
    #[must_use]
    pub fn month_entries(entries: &[CashEntry], month: &MonthKey) -> Vec<CashEntry> {
        let mut selected: Vec<CashEntry> = MonthWindow::new(month.clone())
            .filter(entries)
            .cloned()
            .collect();
        Self::sort_newest_first(&mut selected);
        selected
    }

    /// Sorts by date then write time, newest first.
    pub fn sort_newest_first(entries: &mut [CashEntry]) {
        entries.sort_by_key(|e| Reverse((e.date.clone(), e.timestamp)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cashbook::PaymentMode;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn entry(date: &str, kind: EntryKind, category: &str, amount: Decimal) -> CashEntry {
        CashEntry {
            id: CashEntryId::new(),
            date: date.to_string(),
            kind,
            category: category.to_string(),
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

    fn new_entry(amount: Decimal, category: &str) -> NewCashEntry {
        NewCashEntry {
            date: "2025-05-05".to_string(),
            kind: EntryKind::Expense,
            category: category.to_string(),
            site: String::new(),
            payee: "Shop".to_string(),
            amount,
            mode: PaymentMode::Cash,
            note: String::new(),
            status: EntryStatus::Paid,
        }
    }

    #[test]
    fn test_month_summary() {
        let mut pending = entry("2025-05-20", EntryKind::Expense, "Fuel", dec!(500));
        pending.status = EntryStatus::Pending;
        let entries = vec![
            entry("2025-05-01", EntryKind::Income, "Invoice Payment", dec!(10000)),
            entry("2025-05-03", EntryKind::Expense, "Fuel", dec!(3800)),
            entry("2025-05-04", EntryKind::Expense, "Salary", dec!(2000)),
            pending,
            entry("2025-06-01", EntryKind::Income, "Invoice Payment", dec!(99999)),
            entry("2025-13-05", EntryKind::Income, "Invoice Payment", dec!(77777)),
        ];

        let summary = CashbookService::month_summary(&entries, &MonthKey::parse("2025-05").unwrap());
        assert_eq!(summary.income, dec!(10000));
        assert_eq!(summary.expense, dec!(6300));
        assert_eq!(summary.net, dec!(3700));
        assert_eq!(summary.pending, dec!(500));
        assert_eq!(summary.count, 4);
        assert_eq!(summary.expense_by_category.get("Fuel"), Some(&dec!(4300)));
        assert_eq!(summary.expense_by_category.get("Salary"), Some(&dec!(2000)));
        assert_eq!(summary.income_by_category.len(), 1);
    }

    #[test]
    fn test_prepare_entry_validation() {
        assert_eq!(
            CashbookService::prepare_entry(new_entry(dec!(0), "Fuel"), Utc::now()),
            Err(CashbookError::NonPositiveAmount(dec!(0)))
        );
        assert_eq!(
            CashbookService::prepare_entry(new_entry(dec!(10), " "), Utc::now()),
            Err(CashbookError::MissingCategory)
        );

        let entry = CashbookService::prepare_entry(new_entry(dec!(10), "Tea"), Utc::now()).unwrap();
        assert!(entry.source.is_none());
        assert_eq!(entry.category, "Tea");
    }

    #[test]
    fn test_month_entries_newest_first() {
        let entries = vec![
            entry("2025-05-01", EntryKind::Income, "A", dec!(1)),
            entry("2025-05-09", EntryKind::Income, "B", dec!(1)),
            entry("2025-04-30", EntryKind::Income, "C", dec!(1)),
        ];
        let listed = CashbookService::month_entries(&entries, &MonthKey::parse("2025-05").unwrap());
        let categories: Vec<_> = listed.iter().map(|e| e.category.as_str()).collect();
        assert_eq!(categories, vec!["B", "A"]);
    }

    #[test]
    fn test_entry_serializes_type_field() {
        let json = serde_json::to_value(entry("2025-05-01", EntryKind::Income, "A", dec!(1))).unwrap();
        assert_eq!(json["type"], "Income");
        assert_eq!(json["status"], "Paid");
        assert!(json.get("source").is_none());
    }

    #[test]
    fn test_unknown_mode_keeps_its_text() {
        let json = serde_json::json!({
            "date": "2025-05-01",
            "type": "Expense",
            "amount": "120",
            "mode": "Wallet"
        });
        let entry: CashEntry = serde_json::from_value(json).unwrap();
        assert_eq!(entry.mode, PaymentMode::Other("Wallet".to_string()));
        assert_eq!(entry.status, EntryStatus::Paid);

        let written = serde_json::to_value(&entry).unwrap();
        assert_eq!(written["mode"], "Wallet");
    }

    #[rstest]
    #[case("Cash", PaymentMode::Cash)]
    #[case("UPI", PaymentMode::Upi)]
    #[case("Bank Transfer", PaymentMode::BankTransfer)]
    #[case("Cheque", PaymentMode::Cheque)]
    fn test_known_modes_use_display_names(#[case] text: &str, #[case] mode: PaymentMode) {
        let parsed: PaymentMode = serde_json::from_value(serde_json::json!(text)).unwrap();
        assert_eq!(parsed, mode);
        assert_eq!(serde_json::to_value(&mode).unwrap(), text);
    }
}
