//! Delegated writes: status transitions and payment reminders.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};
use utoipa::ToSchema;

use super::client::{EmailContent, EmailRequest, StatusUpdateRequest};
use super::collections::CommunicationTone;
use super::fetcher::InvoiceFetcher;
use super::models::InvoiceStatus;
use super::overdue::Urgency;
use crate::types::{AppError, Result};

const MAX_EMAIL_LEN: usize = 254;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatusUpdateOutcome {
    pub invoice_id: String,
    pub new_status: String,
    /// The upstream's copy of the invoice after the update.
    pub updated_invoice: Value,
    /// Anything else upstream returned (e.g. a sync confirmation).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReminderRequest {
    pub invoice_id: String,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    /// Defaults from the invoice's urgency: gentle while recent, firm after.
    #[serde(default)]
    pub tone: Option<CommunicationTone>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReminderOutcome {
    pub invoice_id: String,
    pub recipient: String,
    pub tone: CommunicationTone,
    pub upstream: Value,
}

fn validate_recipient(recipient: &str) -> Result<()> {
    let invalid = || AppError::Validation(format!("'{}' is not a valid email address", recipient));

    if recipient.is_empty() || recipient.len() > MAX_EMAIL_LEN {
        return Err(invalid());
    }
    if recipient.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid());
    }
    let (local, domain) = recipient.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(invalid());
    }
    if domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid());
    }
    Ok(())
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

#[derive(Clone)]
pub struct InvoiceManager {
    fetcher: InvoiceFetcher,
}

impl InvoiceManager {
    pub fn new(fetcher: InvoiceFetcher) -> Self {
        Self { fetcher }
    }

    /// Mark an open invoice as paid.
    ///
    /// # Errors
    ///
    /// `Validation` for any target other than `paid` or when the invoice is
    /// not currently `sent`; `NotFound` when upstream has no such invoice.
    #[instrument(skip(self, notes))]
    pub async fn update_invoice_status(
        &self,
        invoice_id: &str,
        new_status: &str,
        notes: Option<String>,
    ) -> Result<StatusUpdateOutcome> {
        let target = InvoiceStatus::parse(new_status);
        if target != InvoiceStatus::Paid {
            return Err(AppError::Validation(format!(
                "Cannot set status to '{}': only 'paid' is allowed",
                new_status.trim()
            )));
        }

        let current = self.fetcher.fetch_invoice(invoice_id).await?;
        if !current.status.is_open() {
            return Err(AppError::Validation(format!(
                "Invoice {} is '{}', only 'sent' invoices can be marked paid",
                invoice_id, current.status
            )));
        }

        let request = StatusUpdateRequest {
            status: target.as_str().to_string(),
            notes: notes.filter(|n| !n.trim().is_empty()),
        };
        let response = self
            .fetcher
            .api()
            .update_invoice_status(invoice_id, &request)
            .await?;

        let (updated_invoice, sync) = match response {
            Value::Object(mut fields) => match fields.remove("invoice") {
                Some(invoice) => {
                    let rest = (!fields.is_empty()).then_some(Value::Object(fields));
                    (invoice, rest)
                }
                None => (Value::Object(fields), None),
            },
            other => (other, None),
        };

        info!(invoice_id, status = %target, "Invoice status updated");

        Ok(StatusUpdateOutcome {
            invoice_id: invoice_id.to_string(),
            new_status: target.as_str().to_string(),
            updated_invoice,
            sync,
        })
    }

    /// Send a reminder email for an invoice through the upstream email endpoint.
    #[instrument(skip(self, request), fields(invoice_id = %request.invoice_id))]
    pub async fn send_payment_reminder(&self, request: ReminderRequest) -> Result<ReminderOutcome> {
        let recipient = request.recipient.trim().to_string();
        validate_recipient(&recipient)?;
        require_text("subject", &request.subject)?;
        require_text("body", &request.body)?;

        let invoice = self.fetcher.fetch_invoice(&request.invoice_id).await?;

        let tone = request.tone.unwrap_or_else(|| {
            match Urgency::from_days_overdue(invoice.days_overdue) {
                Urgency::Recent => CommunicationTone::Gentle,
                Urgency::Moderate | Urgency::Urgent => CommunicationTone::Firm,
            }
        });

        let email = EmailRequest {
            recipient: recipient.clone(),
            customer_name: invoice.customer_name.clone(),
            invoice_number: invoice.invoice_id.clone(),
            amount: invoice.amount,
            currency: invoice.currency.clone(),
            due_date: invoice.due_date.format("%Y-%m-%d").to_string(),
            days_overdue: invoice.days_overdue,
            ai_content: EmailContent {
                subject: request.subject,
                body: request.body,
                tone: tone.as_str().to_string(),
                notes: request.notes,
            },
        };

        let upstream = self.fetcher.api().send_email(&email).await?;

        info!(recipient = %recipient, "Payment reminder sent");

        Ok(ReminderOutcome {
            invoice_id: invoice.invoice_id,
            recipient,
            tone,
            upstream,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::client::InMemoryBillingApi;
    use crate::billing::clock::FixedClock;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use serde_json::json;
    use std::sync::Arc;

    fn manager(invoices: Vec<Value>) -> (InvoiceManager, Arc<InMemoryBillingApi>) {
        let api = Arc::new(InMemoryBillingApi::new(invoices));
        let clock = FixedClock(Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap());
        let fetcher = InvoiceFetcher::new(api.clone(), Arc::new(clock));
        (InvoiceManager::new(fetcher), api)
    }

    fn invoice(id: &str, status: &str, due: &str) -> Value {
        json!({
            "invoiceId": id,
            "customerId": "CUST-1",
            "customerName": "Acme Corp",
            "amount": 1200.5,
            "status": status,
            "dueDate": due
        })
    }

    fn reminder(recipient: &str) -> ReminderRequest {
        ReminderRequest {
            invoice_id: "INV-1".to_string(),
            recipient: recipient.to_string(),
            subject: "Invoice INV-1 is overdue".to_string(),
            body: "Please arrange payment.".to_string(),
            tone: None,
            notes: None,
        }
    }

    #[rstest]
    #[case("cancelled")]
    #[case("sent")]
    #[case("")]
    #[tokio::test]
    async fn test_only_paid_transition_allowed(#[case] status: &str) {
        let (manager, api) = manager(vec![invoice("INV-1", "sent", "2025-03-01")]);
        let err = manager
            .update_invoice_status("INV-1", status, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(api.requests().is_empty());
    }

    #[tokio::test]
    async fn test_mark_paid() {
        let (manager, api) = manager(vec![invoice("INV-1", "sent", "2025-03-01")]);
        let outcome = manager
            .update_invoice_status("INV-1", "PAID", Some("wire received".to_string()))
            .await
            .unwrap();

        assert_eq!(outcome.new_status, "paid");
        assert_eq!(outcome.updated_invoice["status"], "paid");
        assert_eq!(outcome.updated_invoice["notes"], "wire received");
        assert_eq!(
            api.requests(),
            vec!["GET /invoices/INV-1".to_string(), "PUT /invoices/INV-1".to_string()]
        );
    }

    #[tokio::test]
    async fn test_paid_invoice_cannot_be_paid_again() {
        let (manager, _) = manager(vec![invoice("INV-1", "paid", "2025-03-01")]);
        let err = manager
            .update_invoice_status("INV-1", "paid", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[rstest]
    #[case("")]
    #[case("no-at-sign")]
    #[case("a@b")]
    #[case("a b@example.com")]
    #[case("@example.com")]
    #[case("x@@example.com")]
    fn test_invalid_recipients(#[case] recipient: &str) {
        assert!(validate_recipient(recipient).is_err());
    }

    #[tokio::test]
    async fn test_reminder_payload() {
        let (manager, api) = manager(vec![invoice("INV-1", "sent", "2025-03-01")]);
        let outcome = manager
            .send_payment_reminder(reminder("ap@acme.test"))
            .await
            .unwrap();

        assert_eq!(outcome.tone, CommunicationTone::Firm);

        let sent = api.sent_emails();
        assert_eq!(sent.len(), 1);
        let email = &sent[0];
        assert_eq!(email.recipient, "ap@acme.test");
        assert_eq!(email.customer_name, "Acme Corp");
        assert_eq!(email.invoice_number, "INV-1");
        assert_eq!(email.due_date, "2025-03-01");
        assert_eq!(email.days_overdue, 14);
        assert_eq!(email.ai_content.tone, "firm");
    }

    #[tokio::test]
    async fn test_reminder_rejects_bad_recipient_before_upstream() {
        let (manager, api) = manager(vec![invoice("INV-1", "sent", "2025-03-01")]);
        let err = manager
            .send_payment_reminder(reminder("not-an-email"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(api.requests().is_empty());
    }
}
