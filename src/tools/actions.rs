use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::registry::Tool;
use super::{parse_args, to_value, NoArgs};
use crate::billing::{BillingService, ReminderRequest};
use crate::types::Result;

#[derive(Deserialize)]
struct StatusArgs {
    invoice_id: String,
    new_status: String,
    #[serde(default)]
    notes: Option<String>,
}

pub struct UpdateInvoiceStatus {
    service: Arc<BillingService>,
}

impl UpdateInvoiceStatus {
    pub fn new(service: Arc<BillingService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for UpdateInvoiceStatus {
    fn name(&self) -> &str {
        "update_invoice_status"
    }

    fn description(&self) -> &str {
        "Mark a sent invoice as paid. The update is synced to the accounting system by the billing API"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "invoice_id": { "type": "string" },
                "new_status": { "type": "string", "enum": ["paid"] },
                "notes": { "type": "string", "description": "Optional note stored with the update" }
            },
            "required": ["invoice_id", "new_status"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let args: StatusArgs = parse_args(self.name(), args)?;
        let outcome = self
            .service
            .update_invoice_status(&args.invoice_id, &args.new_status, args.notes)
            .await?;
        to_value(&outcome)
    }
}

pub struct SendPaymentReminder {
    service: Arc<BillingService>,
}

impl SendPaymentReminder {
    pub fn new(service: Arc<BillingService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for SendPaymentReminder {
    fn name(&self) -> &str {
        "send_payment_reminder"
    }

    fn description(&self) -> &str {
        "Send a payment reminder email for an invoice with the given subject and body"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "invoice_id": { "type": "string" },
                "recipient": { "type": "string", "format": "email" },
                "subject": { "type": "string" },
                "body": { "type": "string" },
                "tone": { "type": "string", "enum": ["gentle", "firm", "supportive"] },
                "notes": { "type": "string" }
            },
            "required": ["invoice_id", "recipient", "subject", "body"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let request: ReminderRequest = parse_args(self.name(), args)?;
        let outcome = self.service.send_payment_reminder(request).await?;
        to_value(&outcome)
    }
}

pub struct ReviewOverdueAccounts {
    service: Arc<BillingService>,
}

impl ReviewOverdueAccounts {
    pub fn new(service: Arc<BillingService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for ReviewOverdueAccounts {
    fn name(&self) -> &str {
        "review_overdue_accounts"
    }

    fn description(&self) -> &str {
        "Review every overdue invoice with its urgency, the customer's risk level, a recommended collection action and tone"
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let _: NoArgs = parse_args(self.name(), args)?;
        let review = self.service.review_overdue_accounts().await?;
        to_value(&review)
    }
}
