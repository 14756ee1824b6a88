use crate::{
    AppState,
    billing::CollectionsReview,
    types::{ErrorResponse, Result},
};
use axum::{Json, extract::State};

/// Recommended collection action for every overdue invoice
#[utoipa::path(
    get,
    path = "/api/collections/review",
    responses(
        (status = 200, description = "Collections review", body = CollectionsReview),
        (status = 502, description = "Billing API failure", body = ErrorResponse)
    ),
    tag = "collections"
)]
pub async fn review_overdue_accounts(
    State(state): State<AppState>,
) -> Result<Json<CollectionsReview>> {
    Ok(Json(state.billing.review_overdue_accounts().await?))
}
