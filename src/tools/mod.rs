//! Billing Tools for Agent Capabilities
//!
//! Every billing operation is exposed as a named tool taking JSON arguments
//! and returning a JSON envelope, so an agent runtime (or the CLI and HTTP
//! API) can call them uniformly.
//!
//! # Module Structure
//!
//! - [`invoice`](crate::tools::invoice) - invoice lookup, listing and overdue classification
//! - [`customer`](crate::tools::customer) - customer payment history and risk tier
//! - [`actions`](crate::tools::actions) - status updates, reminders and the collections review
//! - [`registry`](crate::tools::registry) - tool registration, timeouts and the result envelope
//!
//! # Result Envelope
//!
//! ```ignore
//! let registry = ToolRegistry::with_billing_tools(service, &config);
//! let result = registry.execute("get_invoice_details", json!({"invoice_id": "INV-1"})).await?;
//! // {"success": true, "invoice": {...}}
//! // {"success": false, "error_kind": "not_found", "error": "..."}
//! ```

/// Status updates, payment reminders and collections review.
pub mod actions;
/// Customer payment-history tool.
pub mod customer;
/// Invoice lookup, listing and overdue tools.
pub mod invoice;
/// Tool registry for managing available tools.
pub mod registry;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{AppError, Result};

/// Names of every built-in billing tool.
pub const BILLING_TOOL_NAMES: [&str; 7] = [
    "get_invoice_details",
    "list_all_invoices",
    "get_overdue_invoices",
    "get_customer_invoice_history",
    "update_invoice_status",
    "send_payment_reminder",
    "review_overdue_accounts",
];

/// Decode tool arguments; `null` is read as an empty object.
pub(crate) fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    serde_json::from_value(args)
        .map_err(|e| AppError::Validation(format!("Invalid arguments for {}: {}", tool, e)))
}

pub(crate) fn to_value<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.to_string()))
}

/// Argument shape for tools that take none.
#[derive(Deserialize)]
pub(crate) struct NoArgs {}

/// Upstream invoice payload for tool tests.
#[cfg(test)]
pub(crate) fn raw_invoice(id: &str, customer: &str, amount: f64, status: &str, due: &str) -> Value {
    serde_json::json!({
        "invoiceId": id,
        "customerId": customer,
        "customerName": "Acme",
        "amount": amount,
        "status": status,
        "dueDate": due
    })
}
