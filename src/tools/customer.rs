use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::registry::Tool;
use super::{parse_args, to_value};
use crate::billing::BillingService;
use crate::types::Result;

#[derive(Deserialize)]
struct CustomerArgs {
    customer_id: String,
}

/// Payment rate, overdue exposure and risk tier for one customer.
pub struct GetCustomerInvoiceHistory {
    service: Arc<BillingService>,
}

impl GetCustomerInvoiceHistory {
    pub fn new(service: Arc<BillingService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for GetCustomerInvoiceHistory {
    fn name(&self) -> &str {
        "get_customer_invoice_history"
    }

    fn description(&self) -> &str {
        "Get all invoices for a customer with payment rate, overdue totals and a LOW/MEDIUM/HIGH risk level"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "customer_id": { "type": "string", "description": "Customer identifier" }
            },
            "required": ["customer_id"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let args: CustomerArgs = parse_args(self.name(), args)?;
        let profile = self.service.get_customer_history(&args.customer_id).await?;
        to_value(&profile)
    }
}
