//! API request handlers.
//!
//! Handlers are thin: each one delegates to [`BillingService`](crate::billing::BillingService)
//! or the tool registry and lets [`AppError`](crate::types::AppError) shape failures.

/// Collections review handler.
pub mod collections;
/// Customer payment-history handler.
pub mod customers;
/// Invoice lookup, listing and overdue handlers.
pub mod invoices;
/// Tool discovery and invocation handlers.
pub mod tools;

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Server is running", body = String)),
    tag = "health"
)]
pub async fn health() -> &'static str {
    "OK"
}
