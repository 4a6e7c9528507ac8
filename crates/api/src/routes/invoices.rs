//! Invoice routes: bills, payments, settlement and amount in words.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use sitebook_core::invoice::{InvoiceDraft, InvoiceService, PaymentInput, rupees_in_words};
use sitebook_core::window::parse_iso_date;
use sitebook_shared::AppError;
use sitebook_shared::types::{InvoiceId, PaymentId};
use tracing::info;

use crate::extractors::ConfirmQuery;
use crate::{ApiError, AppState};

/// Creates the invoice routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/invoices", get(list_invoices).post(create_invoice))
        .route("/invoices/next-bill-number", get(next_bill_number))
        .route("/invoices/outstanding", get(outstanding))
        .route(
            "/invoices/{id}",
            get(get_invoice).put(update_invoice).delete(delete_invoice),
        )
        .route("/invoices/{id}/payments", post(record_payment))
        .route("/invoices/{id}/payments/{payment_id}", delete(delete_payment))
        .route("/invoices/{id}/settle", post(settle_invoice))
        .route("/amount-in-words", get(amount_in_words))
}

/// Request body for settling an invoice.
#[derive(Debug, Default, Deserialize)]
pub struct SettleRequest {
    /// Date of the settling payment; today when absent.
    pub date: Option<String>,
}

/// Query parameters for amount in words.
#[derive(Debug, Deserialize)]
pub struct WordsQuery {
    /// Rupee amount.
    pub amount: Decimal,
}

/// GET `/invoices` - Every invoice with its balance.
async fn list_invoices(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let invoices = state.invoices.list().await?;
    let statements: Vec<_> = invoices.iter().map(InvoiceService::statement).collect();
    Ok(Json(json!({ "invoices": statements })))
}

/// POST `/invoices` - Issue a bill.
async fn create_invoice(
    State(state): State<AppState>,
    Json(mut draft): Json<InvoiceDraft>,
) -> Result<impl IntoResponse, ApiError> {
    if draft.is_gst && draft.gst_rate.is_zero() {
        draft.gst_rate = state.business.default_gst_rate;
    }
    let invoice = state.invoices.create(draft).await?;
    Ok((StatusCode::CREATED, Json(InvoiceService::statement(&invoice))))
}

/// GET `/invoices/next-bill-number` - Number the next bill would get.
async fn next_bill_number(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let bill_no = state.invoices.next_bill_number().await?;
    Ok(Json(json!({ "billNo": bill_no })))
}

/// GET `/invoices/outstanding` - Invoices with money still due.
async fn outstanding(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let invoices = state.invoices.list().await?;
    let total = InvoiceService::outstanding(&invoices);
    let open: Vec<_> = invoices
        .iter()
        .filter(|i| InvoiceService::balance(i) > Decimal::ZERO)
        .map(InvoiceService::statement)
        .collect();
    Ok(Json(json!({ "total": total, "invoices": open })))
}

/// GET `/invoices/{id}` - One invoice with totals, payments and balance.
async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<InvoiceId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.invoices.statement(id).await?))
}

/// PUT `/invoices/{id}` - Edit a bill. Payments are kept.
async fn update_invoice(
    State(state): State<AppState>,
    Path(id): Path<InvoiceId>,
    Json(draft): Json<InvoiceDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let invoice = state.invoices.update(id, draft).await?;
    Ok(Json(InvoiceService::statement(&invoice)))
}

/// DELETE `/invoices/{id}?confirm=true` - Delete a bill.
async fn delete_invoice(
    State(state): State<AppState>,
    Path(id): Path<InvoiceId>,
    Query(confirm): Query<ConfirmQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let warnings = state.invoices.delete(id, confirm.confirmation()).await?;
    Ok(Json(json!({ "deleted": id, "warnings": warnings })))
}

/// POST `/invoices/{id}/payments` - Record a payment and its cashbook income.
async fn record_payment(
    State(state): State<AppState>,
    Path(id): Path<InvoiceId>,
    Json(input): Json<PaymentInput>,
) -> Result<impl IntoResponse, ApiError> {
    let invoice = state.invoices.get(id).await?;
    let (invoice, entry) = state.invoices.record_payment(&invoice, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "invoice": InvoiceService::statement(&invoice),
            "cashEntry": entry,
        })),
    ))
}

/// DELETE `/invoices/{id}/payments/{payment_id}` - Remove a payment.
///
/// The mirrored cashbook income stays and is listed in the warning.
async fn delete_payment(
    State(state): State<AppState>,
    Path((id, payment_id)): Path<(InvoiceId, PaymentId)>,
) -> Result<impl IntoResponse, ApiError> {
    let (invoice, warning) = state.invoices.delete_payment(id, payment_id).await?;
    Ok(Json(json!({
        "invoice": InvoiceService::statement(&invoice),
        "warning": warning,
    })))
}

/// POST `/invoices/{id}/settle` - Pay off the remaining balance.
async fn settle_invoice(
    State(state): State<AppState>,
    Path(id): Path<InvoiceId>,
    body: Option<Json<SettleRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    let date = match request.date.as_deref() {
        Some(date) => parse_iso_date(date)
            .ok_or_else(|| AppError::Validation(format!("Invalid date '{date}', expected YYYY-MM-DD")))?,
        None => state.business.today()?,
    };

    match state.invoices.mark_fully_settled(id, date).await? {
        Some((invoice, entry)) => {
            info!(invoice_id = %id, amount = %entry.amount, "Invoice settled");
            Ok(Json(json!({
                "settled": true,
                "invoice": InvoiceService::statement(&invoice),
                "cashEntry": entry,
            })))
        }
        None => {
            let invoice = state.invoices.get(id).await?;
            Ok(Json(json!({
                "settled": false,
                "invoice": InvoiceService::statement(&invoice),
            })))
        }
    }
}

/// GET `/amount-in-words?amount=` - Rupee amount as Indian-system words.
async fn amount_in_words(Query(query): Query<WordsQuery>) -> impl IntoResponse {
    Json(json!({
        "amount": query.amount,
        "words": rupees_in_words(query.amount),
    }))
}
