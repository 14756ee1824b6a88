//! HTTP API Handlers and Routes
//!
//! This module provides the REST API layer for PayPilot, built on the Axum web framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # API Endpoints
//!
//! ## Invoices (`/api/invoices`)
//! - `GET /api/invoices[?status=]` - List invoices
//! - `GET /api/invoices/overdue` - Overdue invoices by urgency bucket
//! - `GET /api/invoices/{invoice_id}` - One invoice
//!
//! ## Customers and collections
//! - `GET /api/customers/{customer_id}/history` - Payment profile and risk tier
//! - `GET /api/collections/review` - Recommended action per overdue invoice
//!
//! ## Tools (`/api/tools`)
//! - `GET /api/tools` - Tool definitions
//! - `POST /api/tools/{name}` - Call a tool, returns the result envelope
//!
//! ## Health
//! - `GET /health` - Health check endpoint
//!
//! # Errors
//!
//! Failures are JSON bodies `{"error": "...", "kind": "not_found"}` with 404
//! for missing records, 400 for bad input and 502 when the billing API fails.
//!
//! # OpenAPI Documentation
//!
//! The generated document is served at `/api-docs/openapi.json`.

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

use crate::billing::{
    CollectionAction, CollectionsReview, CommunicationTone, CustomerPaymentProfile, InvoiceRecord,
    OverdueSummary, RiskTier, Urgency,
    collections::{CollectionItem, CustomerSnapshot},
};
use crate::types::{ErrorResponse, InvoiceListResponse, ToolDefinition};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(title = "PayPilot API", description = "Invoice overdue classification and customer payment-risk analytics"),
    paths(
        handlers::health,
        handlers::invoices::list_invoices,
        handlers::invoices::get_overdue_invoices,
        handlers::invoices::get_invoice,
        handlers::customers::get_customer_history,
        handlers::collections::review_overdue_accounts,
        handlers::tools::list_tools,
        handlers::tools::call_tool,
    ),
    components(schemas(
        InvoiceRecord,
        InvoiceListResponse,
        OverdueSummary,
        Urgency,
        CustomerPaymentProfile,
        RiskTier,
        CollectionsReview,
        CollectionItem,
        CollectionAction,
        CommunicationTone,
        CustomerSnapshot,
        ToolDefinition,
        ErrorResponse,
    )),
    tags(
        (name = "invoices", description = "Invoice lookup and overdue classification"),
        (name = "customers", description = "Customer payment history"),
        (name = "collections", description = "Collections review"),
        (name = "tools", description = "Agent tool surface"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;
