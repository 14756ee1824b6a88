use crate::AppState;
use crate::api::{ApiDoc, handlers};
use axum::{
    Json, Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

/// Routes mounted under `/api`.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/invoices", get(handlers::invoices::list_invoices))
        .route(
            "/invoices/overdue",
            get(handlers::invoices::get_overdue_invoices),
        )
        .route(
            "/invoices/{invoice_id}",
            get(handlers::invoices::get_invoice),
        )
        .route(
            "/customers/{customer_id}/history",
            get(handlers::customers::get_customer_history),
        )
        .route(
            "/collections/review",
            get(handlers::collections::review_overdue_accounts),
        )
        .route("/tools", get(handlers::tools::list_tools))
        .route("/tools/{name}", post(handlers::tools::call_tool))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// The complete application: health probe, OpenAPI document, `/api` routes,
/// request tracing and CORS.
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest("/api", create_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
