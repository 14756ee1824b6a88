use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{parse_args, to_value, NoArgs};
use super::registry::Tool;
use crate::billing::BillingService;
use crate::types::Result;

#[derive(Deserialize)]
struct InvoiceIdArgs {
    invoice_id: String,
}

#[derive(Deserialize, Default)]
struct ListArgs {
    #[serde(default)]
    status: Option<String>,
}

pub struct GetInvoiceDetails {
    service: Arc<BillingService>,
}

impl GetInvoiceDetails {
    pub fn new(service: Arc<BillingService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for GetInvoiceDetails {
    fn name(&self) -> &str {
        "get_invoice_details"
    }

    fn description(&self) -> &str {
        "Get detailed information about a specific invoice, including whether it is overdue and by how many days"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "invoice_id": { "type": "string", "description": "Invoice identifier, e.g. INV-1001" }
            },
            "required": ["invoice_id"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let args: InvoiceIdArgs = parse_args(self.name(), args)?;
        let invoice = self.service.get_invoice_details(&args.invoice_id).await?;
        Ok(json!({ "invoice": to_value(&invoice)? }))
    }
}

pub struct ListAllInvoices {
    service: Arc<BillingService>,
}

impl ListAllInvoices {
    pub fn new(service: Arc<BillingService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for ListAllInvoices {
    fn name(&self) -> &str {
        "list_all_invoices"
    }

    fn description(&self) -> &str {
        "List all invoices, optionally filtered by status (sent, paid)"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "status": { "type": "string", "description": "Only return invoices with this status" }
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let args: ListArgs = parse_args(self.name(), args)?;
        let listing = self.service.list_with_summary(args.status.as_deref()).await?;

        let overdue = listing.invoices.iter().filter(|i| i.is_overdue).count();
        let sent = listing.invoices.iter().filter(|i| i.status.is_open()).count();

        Ok(json!({
            "invoices": to_value(&listing.invoices)?,
            "summary": listing.summary,
            "counts": {
                "total": listing.invoices.len(),
                "overdue": overdue,
                "sent": sent,
            },
        }))
    }
}

pub struct GetOverdueInvoices {
    service: Arc<BillingService>,
}

impl GetOverdueInvoices {
    pub fn new(service: Arc<BillingService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for GetOverdueInvoices {
    fn name(&self) -> &str {
        "get_overdue_invoices"
    }

    fn description(&self) -> &str {
        "Get all overdue invoices grouped by urgency: recent (up to 7 days), moderate (8-21 days) and urgent (22+ days)"
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let _: NoArgs = parse_args(self.name(), args)?;
        let summary = self.service.get_overdue_invoices().await?;
        to_value(&summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::{EmptyHistoryPolicy, FixedClock, InMemoryBillingApi};
    use crate::tools::raw_invoice;
    use crate::types::AppError;
    use chrono::{TimeZone, Utc};

    fn service() -> Arc<BillingService> {
        let api = InMemoryBillingApi::new(vec![
            raw_invoice("INV-1", "C1", 100.0, "sent", "2025-03-05"),
            raw_invoice("INV-2", "C1", 50.0, "paid", "2025-01-24"),
            raw_invoice("INV-3", "C2", 75.25, "sent", "2025-04-01"),
        ])
        .with_summary(json!({ "total": 3 }));
        let clock = FixedClock(Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap());
        Arc::new(BillingService::new(
            Arc::new(api),
            Arc::new(clock),
            EmptyHistoryPolicy::default(),
        ))
    }

    #[tokio::test]
    async fn test_list_counts_and_summary() {
        let tool = ListAllInvoices::new(service());
        let result = tool.execute(json!({})).await.unwrap();

        assert_eq!(result["counts"]["total"], 3);
        assert_eq!(result["counts"]["overdue"], 1);
        assert_eq!(result["counts"]["sent"], 2);
        assert_eq!(result["summary"]["total"], 3);
    }

    #[tokio::test]
    async fn test_list_with_status_filter() {
        let tool = ListAllInvoices::new(service());
        let result = tool.execute(json!({ "status": "paid" })).await.unwrap();

        assert_eq!(result["counts"]["total"], 1);
        assert_eq!(result["invoices"][0]["invoice_id"], "INV-2");
    }

    #[tokio::test]
    async fn test_overdue_tool_returns_buckets() {
        let tool = GetOverdueInvoices::new(service());
        let result = tool.execute(Value::Null).await.unwrap();

        assert_eq!(result["overdue_count"], 1);
        assert_eq!(result["total_overdue_amount"], 100.0);
        assert_eq!(result["moderate_invoices"][0]["invoice_id"], "INV-1");
        assert_eq!(result["urgent_invoices"], json!([]));
    }

    #[tokio::test]
    async fn test_missing_invoice_id_is_validation_error() {
        let tool = GetInvoiceDetails::new(service());
        let err = tool.execute(json!({})).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
