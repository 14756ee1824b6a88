//! Billing REST API access.
//!
//! [`BillingApi`] is the seam between the analytics core and the upstream
//! service. [`HttpBillingClient`] talks to the real API over reqwest;
//! [`InMemoryBillingApi`] serves a fixed invoice set for offline use and tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use utoipa::ToSchema;

use crate::types::{AppError, Result};
use crate::utils::toml_config::BillingConfig;

/// Raw result of `GET /invoices`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvoicePage {
    pub invoices: Vec<Value>,
    pub summary: Option<Value>,
}

/// Body of `PUT /invoices/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Message content block of a reminder email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EmailContent {
    pub subject: String,
    pub body: String,
    pub tone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Body of `POST /send-email`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailRequest {
    pub recipient: String,
    pub customer_name: String,
    pub invoice_number: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub currency: String,
    pub due_date: String,
    pub days_overdue: u32,
    pub ai_content: EmailContent,
}

/// Upstream billing operations. Implementations must not retry; callers own
/// the retry policy.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BillingApi: Send + Sync {
    /// `GET /invoices/{id}`. `Ok(None)` when upstream has no such record.
    async fn get_invoice(&self, invoice_id: &str) -> Result<Option<Value>>;

    /// `GET /invoices[?status=]`.
    async fn list_invoices<'a>(&self, status: Option<&'a str>) -> Result<InvoicePage>;

    /// `PUT /invoices/{id}`. Returns the upstream response body verbatim.
    async fn update_invoice_status(
        &self,
        invoice_id: &str,
        request: &StatusUpdateRequest,
    ) -> Result<Value>;

    /// `POST /send-email`. Returns the upstream response body verbatim.
    async fn send_email(&self, request: &EmailRequest) -> Result<Value>;
}

// ============= HTTP Client =============

pub struct HttpBillingClient {
    http: reqwest::Client,
    base_url: String,
    email_url: String,
    user_id: String,
    api_key: Option<String>,
}

impl HttpBillingClient {
    /// Build a client from billing settings. `api_key` is the resolved secret,
    /// not the name of the variable holding it.
    pub fn new(settings: &BillingConfig, api_key: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = settings.base_url.trim_end_matches('/').to_string();
        let email_url = format!(
            "{}/{}",
            base_url,
            settings.email_path.trim_start_matches('/')
        );

        Ok(Self {
            http,
            base_url,
            email_url,
            user_id: settings.user_id.clone(),
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, url)
            .header("Content-Type", "application/json")
            .header("x-user-id", &self.user_id);

        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn read_json(response: Response) -> Result<Value> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(%status, "Billing API request failed");
            return Err(AppError::Upstream(format!(
                "billing API returned {}: {}",
                status, text
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to parse billing API response: {}", e)))
    }
}

/// Single-invoice bodies arrive either wrapped (`{"invoice": {...}}`) or bare.
fn extract_invoice(body: Value) -> Result<Option<Value>> {
    match body {
        Value::Object(mut map) => match map.remove("invoice") {
            Some(Value::Null) => Ok(None),
            Some(invoice) => Ok(Some(invoice)),
            None if map.is_empty() => Ok(None),
            None => Ok(Some(Value::Object(map))),
        },
        Value::Null => Ok(None),
        other => Err(AppError::Upstream(format!(
            "unexpected invoice payload: {}",
            other
        ))),
    }
}

fn extract_page(body: Value) -> Result<InvoicePage> {
    match body {
        Value::Array(invoices) => Ok(InvoicePage {
            invoices,
            summary: None,
        }),
        Value::Object(mut map) => {
            let invoices = match map.remove("invoices") {
                Some(Value::Array(invoices)) => invoices,
                Some(other) => {
                    return Err(AppError::Upstream(format!(
                        "'invoices' is not a list: {}",
                        other
                    )));
                }
                None => {
                    return Err(AppError::Upstream(
                        "invoice list response has no 'invoices' field".to_string(),
                    ));
                }
            };
            Ok(InvoicePage {
                invoices,
                summary: map.remove("summary").filter(|s| !s.is_null()),
            })
        }
        other => Err(AppError::Upstream(format!(
            "unexpected invoice list payload: {}",
            other
        ))),
    }
}

#[async_trait]
impl BillingApi for HttpBillingClient {
    #[instrument(skip(self))]
    async fn get_invoice(&self, invoice_id: &str) -> Result<Option<Value>> {
        let url = format!("{}/invoices/{}", self.base_url, invoice_id);
        debug!(%url, "Fetching invoice");

        let response = self.request(Method::GET, &url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        extract_invoice(Self::read_json(response).await?)
    }

    #[instrument(skip(self))]
    async fn list_invoices<'a>(&self, status: Option<&'a str>) -> Result<InvoicePage> {
        let url = format!("{}/invoices", self.base_url);
        debug!(%url, ?status, "Listing invoices");

        let mut request = self.request(Method::GET, &url);
        if let Some(status) = status {
            request = request.query(&[("status", status)]);
        }

        extract_page(Self::read_json(request.send().await?).await?)
    }

    #[instrument(skip(self, request), fields(status = %request.status))]
    async fn update_invoice_status(
        &self,
        invoice_id: &str,
        request: &StatusUpdateRequest,
    ) -> Result<Value> {
        let url = format!("{}/invoices/{}", self.base_url, invoice_id);
        debug!(%url, "Updating invoice status");

        let response = self.request(Method::PUT, &url).json(request).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("Invoice {} not found", invoice_id)));
        }

        Self::read_json(response).await
    }

    #[instrument(skip(self, request), fields(invoice = %request.invoice_number))]
    async fn send_email(&self, request: &EmailRequest) -> Result<Value> {
        debug!(url = %self.email_url, "Sending reminder email");

        let response = self
            .request(Method::POST, &self.email_url)
            .json(request)
            .send()
            .await?;

        Self::read_json(response).await
    }
}

// ============= In-Memory Double =============

/// Serves a fixed invoice set. Status updates mutate the stored record and
/// sent emails are captured for inspection.
#[derive(Default)]
pub struct InMemoryBillingApi {
    invoices: Mutex<Vec<Value>>,
    summary: Option<Value>,
    sent_emails: Mutex<Vec<EmailRequest>>,
    requests: Mutex<Vec<String>>,
}

impl InMemoryBillingApi {
    pub fn new(invoices: Vec<Value>) -> Self {
        Self {
            invoices: Mutex::new(invoices),
            ..Default::default()
        }
    }

    pub fn with_summary(mut self, summary: Value) -> Self {
        self.summary = Some(summary);
        self
    }

    /// Requests served so far, as `METHOD /path` lines.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    pub fn sent_emails(&self) -> Vec<EmailRequest> {
        self.sent_emails.lock().clone()
    }

    fn record(&self, line: String) {
        self.requests.lock().push(line);
    }

    fn id_of(invoice: &Value) -> Option<&str> {
        invoice
            .get("invoiceId")
            .or_else(|| invoice.get("invoice_id"))
            .and_then(Value::as_str)
    }
}

#[async_trait]
impl BillingApi for InMemoryBillingApi {
    async fn get_invoice(&self, invoice_id: &str) -> Result<Option<Value>> {
        self.record(format!("GET /invoices/{}", invoice_id));
        Ok(self
            .invoices
            .lock()
            .iter()
            .find(|inv| Self::id_of(inv) == Some(invoice_id))
            .cloned())
    }

    async fn list_invoices<'a>(&self, status: Option<&'a str>) -> Result<InvoicePage> {
        match status {
            Some(status) => self.record(format!("GET /invoices?status={}", status)),
            None => self.record("GET /invoices".to_string()),
        }

        let invoices = self
            .invoices
            .lock()
            .iter()
            .filter(|inv| match status {
                Some(wanted) => inv
                    .get("status")
                    .and_then(Value::as_str)
                    .map(|s| crate::billing::InvoiceStatus::parse(s).as_str() == wanted)
                    .unwrap_or(false),
                None => true,
            })
            .cloned()
            .collect();

        Ok(InvoicePage {
            invoices,
            summary: self.summary.clone(),
        })
    }

    async fn update_invoice_status(
        &self,
        invoice_id: &str,
        request: &StatusUpdateRequest,
    ) -> Result<Value> {
        self.record(format!("PUT /invoices/{}", invoice_id));

        let mut invoices = self.invoices.lock();
        let invoice = invoices
            .iter_mut()
            .find(|inv| Self::id_of(inv) == Some(invoice_id))
            .ok_or_else(|| AppError::NotFound(format!("Invoice {} not found", invoice_id)))?;

        if let Some(fields) = invoice.as_object_mut() {
            fields.insert("status".to_string(), json!(request.status));
            if let Some(notes) = &request.notes {
                fields.insert("notes".to_string(), json!(notes));
            }
        }

        Ok(json!({ "invoice": invoice.clone() }))
    }

    async fn send_email(&self, request: &EmailRequest) -> Result<Value> {
        self.record("POST /send-email".to_string());
        self.sent_emails.lock().push(request.clone());
        Ok(json!({ "sent": true, "recipient": request.recipient }))
    }
}
