//! Invoice reconciliation service.
//!
//! Every derived figure (line amounts, totals, balance) is computed from the
//! stored quantities and payments. Stored `amount` fields are never trusted.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sitebook_shared::types::{PaymentId, round_to_rupee};

use super::error::InvoiceError;
use super::types::{
    Client, Invoice, InvoiceDraft, InvoiceStatement, InvoiceStatus, InvoiceTotals, LineItem, Payment,
    PaymentInput,
};
use super::words::rupees_in_words;
use crate::cashbook::PaymentMode;
use crate::window::parse_iso_date;

/// Note written on a settlement payment.
pub const SETTLEMENT_NOTE: &str = "Full Settlement";

/// Invoice reconciliation service.
///
/// Pure functions only; persistence is the repository's job.
pub struct InvoiceService;

impl InvoiceService {
    /// Line amount: rate times brass quantity, or trip quantity when brass is zero.
    #[must_use]
    pub fn item_amount(item: &LineItem) -> Decimal {
        let qty = if item.brass_qty > Decimal::ZERO {
            item.brass_qty
        } else {
            item.trip_qty
        };
        qty * item.rate
    }

    /// Overwrites every stored line amount with the computed one.
    pub fn normalize_items(invoice: &mut Invoice) {
        for item in &mut invoice.items {
            item.amount = Self::item_amount(item);
        }
    }

    /// Subtotal, GST, discount and the rounded total.
    ///
    /// The total is clamped at zero before rounding half-up to whole rupees.
    #[must_use]
    pub fn totals(invoice: &Invoice) -> InvoiceTotals {
        let subtotal: Decimal = invoice.items.iter().map(Self::item_amount).sum();
        let gst = if invoice.is_gst {
            subtotal * invoice.gst_rate / Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };
        let total = round_to_rupee((subtotal + gst - invoice.discount).max(Decimal::ZERO));

        InvoiceTotals {
            subtotal,
            gst,
            discount: invoice.discount,
            total,
        }
    }

    /// Rounded grand total.
    #[must_use]
    pub fn total(invoice: &Invoice) -> Decimal {
        Self::totals(invoice).total
    }

    /// Legacy advance plus the sum of recorded payments.
    #[must_use]
    pub fn total_paid(invoice: &Invoice) -> Decimal {
        invoice.advances + invoice.payments.iter().map(|p| p.amount).sum::<Decimal>()
    }

    /// Total minus paid. Negative when the client overpaid.
    #[must_use]
    pub fn balance(invoice: &Invoice) -> Decimal {
        Self::total(invoice) - Self::total_paid(invoice)
    }

    /// Payment state; an invoice is paid once its balance is at or below zero.
    #[must_use]
    pub fn status(invoice: &Invoice) -> InvoiceStatus {
        if Self::balance(invoice) <= Decimal::ZERO {
            InvoiceStatus::Paid
        } else if Self::total_paid(invoice) > Decimal::ZERO {
            InvoiceStatus::Partial
        } else {
            InvoiceStatus::Unpaid
        }
    }

    /// The invoice with line amounts recomputed and every derived figure.
    #[must_use]
    pub fn statement(invoice: &Invoice) -> InvoiceStatement {
        let mut invoice = invoice.clone();
        Self::normalize_items(&mut invoice);
        let totals = Self::totals(&invoice);
        let total_paid = Self::total_paid(&invoice);

        InvoiceStatement {
            status: Self::status(&invoice),
            balance: totals.total - total_paid,
            amount_in_words: rupees_in_words(totals.total),
            totals,
            total_paid,
            invoice,
        }
    }

    /// Sum of positive balances across invoices.
    #[must_use]
    pub fn outstanding(invoices: &[Invoice]) -> Decimal {
        invoices
            .iter()
            .map(Self::balance)
            .filter(|b| *b > Decimal::ZERO)
            .sum()
    }

    /// One more than the highest bill number in use, or 1 when there are none.
    #[must_use]
    pub fn next_bill_number(invoices: &[Invoice]) -> u64 {
        invoices.iter().map(|i| i.bill_no).max().unwrap_or(0) + 1
    }

    /// Checks invoice content before any write.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError` for a missing client name, no items, a GST rate
    /// outside 0..=100, a negative discount/advance/quantity/rate or a bad date.
    pub fn validate(invoice: &Invoice) -> Result<(), InvoiceError> {
        if invoice.client.name.trim().is_empty() {
            return Err(InvoiceError::MissingClientName);
        }
        if invoice.items.is_empty() {
            return Err(InvoiceError::NoItems);
        }
        if invoice.gst_rate < Decimal::ZERO || invoice.gst_rate > Decimal::ONE_HUNDRED {
            return Err(InvoiceError::InvalidGstRate(invoice.gst_rate));
        }
        if invoice.discount < Decimal::ZERO {
            return Err(InvoiceError::NegativeDiscount);
        }
        if invoice.advances < Decimal::ZERO {
            return Err(InvoiceError::NegativeAdvance);
        }
        if invoice.bill_no == 0 {
            return Err(InvoiceError::InvalidBillNumber);
        }
        check_date(&invoice.date)?;
        if let Some(due) = &invoice.due_date {
            check_date(due)?;
        }

        for (index, item) in invoice.items.iter().enumerate() {
            if item.brass_qty < Decimal::ZERO
                || item.trip_qty < Decimal::ZERO
                || item.rate < Decimal::ZERO
            {
                return Err(InvoiceError::NegativeItemValue { line: index + 1 });
            }
        }

        Ok(())
    }

    /// Applies a draft onto an invoice, keeping its id and payments.
    ///
    /// Line amounts are recomputed and the result validated.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError` if the resulting invoice is invalid.
    pub fn apply_draft(
        mut invoice: Invoice,
        draft: InvoiceDraft,
        bill_no: u64,
    ) -> Result<Invoice, InvoiceError> {
        invoice.bill_no = bill_no;
        invoice.date = draft.date;
        invoice.due_date = draft.due_date.filter(|d| !d.is_empty());
        invoice.client = draft.client;
        invoice.items = draft.items;
        invoice.is_gst = draft.is_gst;
        invoice.gst_rate = draft.gst_rate;
        invoice.discount = draft.discount;
        invoice.advances = draft.advances;

        Self::normalize_items(&mut invoice);
        Self::validate(&invoice)?;
        Ok(invoice)
    }

    /// A fresh, unsaved invoice built from a draft.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError` if the draft is invalid.
    pub fn from_draft(draft: InvoiceDraft, bill_no: u64) -> Result<Invoice, InvoiceError> {
        let empty = Invoice {
            id: None,
            bill_no,
            date: String::new(),
            due_date: None,
            client: Client::default(),
            items: Vec::new(),
            is_gst: false,
            gst_rate: Decimal::ZERO,
            discount: Decimal::ZERO,
            advances: Decimal::ZERO,
            payments: Vec::new(),
        };
        Self::apply_draft(empty, draft, bill_no)
    }

    /// Turns operator input into a payment for `invoice`.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::Unsaved` if the invoice has no persisted id,
    /// `NonPositivePayment` for an amount at or below zero, or `InvalidDate`.
    pub fn validate_payment(invoice: &Invoice, input: PaymentInput) -> Result<Payment, InvoiceError> {
        if invoice.id.is_none() {
            return Err(InvoiceError::Unsaved);
        }
        if input.amount <= Decimal::ZERO {
            return Err(InvoiceError::NonPositivePayment(input.amount));
        }
        check_date(&input.date)?;

        Ok(Payment {
            id: PaymentId::new(),
            date: input.date,
            amount: input.amount,
            mode: input.mode,
            note: input.note.trim().to_string(),
        })
    }

    /// The payment that clears the remaining balance, or `None` if nothing is due.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::Unsaved` if the invoice has no persisted id.
    pub fn settlement_payment(
        invoice: &Invoice,
        today: NaiveDate,
    ) -> Result<Option<Payment>, InvoiceError> {
        if invoice.id.is_none() {
            return Err(InvoiceError::Unsaved);
        }

        let remaining = Self::balance(invoice);
        if remaining <= Decimal::ZERO {
            return Ok(None);
        }

        Ok(Some(Payment {
            id: PaymentId::new(),
            date: today.format("%Y-%m-%d").to_string(),
            amount: remaining,
            mode: PaymentMode::Cash,
            note: SETTLEMENT_NOTE.to_string(),
        }))
    }

    /// Gives every id-less payment a deterministic id.
    ///
    /// The id depends only on the invoice and the payment's position, so it is
    /// the same on every read until the list is written back with it.
    /// An unsaved invoice has nothing to derive from and is left as is.
    pub fn assign_missing_ids(invoice: &mut Invoice) {
        let Some(invoice_id) = invoice.id else {
            return;
        };
        let owner = invoice_id.to_string();
        for (index, payment) in invoice.payments.iter_mut().enumerate() {
            if payment.id.is_nil() {
                payment.id = PaymentId::derived(&owner, index);
            }
        }
    }

    /// Removes the payment with `payment_id` and returns it.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::PaymentNotFound` if no payment has that id.
    pub fn remove_payment(
        invoice: &mut Invoice,
        payment_id: PaymentId,
    ) -> Result<Payment, InvoiceError> {
        let index = invoice
            .payments
            .iter()
            .position(|p| p.id == payment_id)
            .ok_or(InvoiceError::PaymentNotFound(payment_id))?;
        Ok(invoice.payments.remove(index))
    }
}

fn check_date(date: &str) -> Result<(), InvoiceError> {
    parse_iso_date(date)
        .map(|_| ())
        .ok_or_else(|| InvoiceError::InvalidDate(date.to_string()))
}
