//! Invoice handlers
//!
//! Read-only views over the billing API. Every request fetches fresh data.

use crate::{
    AppState,
    billing::{InvoiceRecord, OverdueSummary},
    types::{ErrorResponse, InvoiceListQuery, InvoiceListResponse, Result},
};
use axum::{
    Json,
    extract::{Path, Query, State},
};

/// List invoices, optionally filtered by status
#[utoipa::path(
    get,
    path = "/api/invoices",
    params(
        ("status" = Option<String>, Query, description = "Only return invoices with this status (sent, paid)")
    ),
    responses(
        (status = 200, description = "Invoices", body = InvoiceListResponse),
        (status = 400, description = "Invalid status filter", body = ErrorResponse),
        (status = 502, description = "Billing API failure", body = ErrorResponse)
    ),
    tag = "invoices"
)]
pub async fn list_invoices(
    State(state): State<AppState>,
    Query(query): Query<InvoiceListQuery>,
) -> Result<Json<InvoiceListResponse>> {
    let invoices = state
        .billing
        .list_all_invoices(query.status.as_deref())
        .await?;

    Ok(Json(InvoiceListResponse {
        count: invoices.len(),
        invoices,
    }))
}

/// Overdue invoices grouped by urgency
#[utoipa::path(
    get,
    path = "/api/invoices/overdue",
    responses(
        (status = 200, description = "Overdue summary; zeroed when nothing is overdue", body = OverdueSummary),
        (status = 502, description = "Billing API failure", body = ErrorResponse)
    ),
    tag = "invoices"
)]
pub async fn get_overdue_invoices(State(state): State<AppState>) -> Result<Json<OverdueSummary>> {
    Ok(Json(state.billing.get_overdue_invoices().await?))
}

/// Get one invoice with its overdue state
#[utoipa::path(
    get,
    path = "/api/invoices/{invoice_id}",
    params(
        ("invoice_id" = String, Path, description = "Invoice identifier")
    ),
    responses(
        (status = 200, description = "Invoice", body = InvoiceRecord),
        (status = 400, description = "Malformed invoice id", body = ErrorResponse),
        (status = 404, description = "Invoice not found", body = ErrorResponse),
        (status = 502, description = "Billing API failure", body = ErrorResponse)
    ),
    tag = "invoices"
)]
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
) -> Result<Json<InvoiceRecord>> {
    Ok(Json(state.billing.get_invoice_details(&invoice_id).await?))
}
