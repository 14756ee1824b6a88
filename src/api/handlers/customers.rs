use crate::{
    AppState,
    billing::CustomerPaymentProfile,
    types::{ErrorResponse, Result},
};
use axum::{
    Json,
    extract::{Path, State},
};

/// Payment history and risk tier for a customer
///
/// A customer without invoices is a 200 with `has_history: false`.
#[utoipa::path(
    get,
    path = "/api/customers/{customer_id}/history",
    params(
        ("customer_id" = String, Path, description = "Customer identifier")
    ),
    responses(
        (status = 200, description = "Customer payment profile", body = CustomerPaymentProfile),
        (status = 400, description = "Malformed customer id", body = ErrorResponse),
        (status = 502, description = "Billing API failure", body = ErrorResponse)
    ),
    tag = "customers"
)]
pub async fn get_customer_history(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> Result<Json<CustomerPaymentProfile>> {
    let profile = state.billing.get_customer_history(&customer_id).await?;

    tracing::info!(
        customer_id = %customer_id,
        has_history = profile.has_history,
        "Served customer history"
    );

    Ok(Json(profile))
}
