//! Canonical invoice record and the normalization step that builds it from
//! upstream JSON.
//!
//! The billing API is inconsistent about field naming (camelCase vs
//! snake_case) and about whether it supplies derived overdue fields, so every
//! record passes through [`normalize_invoice`] before any analysis sees it.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::types::{AppError, Result};

/// Currency assumed when the upstream record carries none.
pub const DEFAULT_CURRENCY: &str = "USD";

// ============= Invoice Status =============

/// Invoice lifecycle state. `sent -> paid` is the only transition modelled here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InvoiceStatus {
    /// Issued and awaiting payment. Upstream's legacy `pending` maps here.
    Sent,
    Paid,
    /// Any other upstream status, kept verbatim (lowercased).
    Other(String),
}

impl InvoiceStatus {
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "sent" | "pending" => InvoiceStatus::Sent,
            "paid" => InvoiceStatus::Paid,
            _ => InvoiceStatus::Other(normalized),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Other(s) => s,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, InvoiceStatus::Sent)
    }
}

impl From<String> for InvoiceStatus {
    fn from(value: String) -> Self {
        InvoiceStatus::parse(&value)
    }
}

impl From<InvoiceStatus> for String {
    fn from(value: InvoiceStatus) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============= Invoice Record =============

/// Read-only snapshot of one invoice, rebuilt on every fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InvoiceRecord {
    pub invoice_id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_company: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub currency: String,
    #[schema(value_type = String, example = "sent")]
    pub status: InvoiceStatus,
    pub due_date: DateTime<Utc>,
    pub created_date: Option<DateTime<Utc>>,
    pub email_sent: bool,
    pub is_overdue: bool,
    pub days_overdue: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_terms: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[schema(value_type = Vec<Object>)]
    pub line_items: Vec<Value>,
}

/// Upstream invoice shape. Every field is optional here so that missing
/// required fields surface as a named error instead of a serde message.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawInvoice {
    #[serde(alias = "invoice_id")]
    invoice_id: Option<String>,
    #[serde(alias = "customer_id")]
    customer_id: Option<String>,
    #[serde(alias = "customer_name")]
    customer_name: Option<String>,
    #[serde(alias = "customer_email")]
    customer_email: Option<String>,
    #[serde(alias = "customer_company")]
    customer_company: Option<String>,
    amount: Option<Decimal>,
    currency: Option<String>,
    status: Option<String>,
    #[serde(alias = "due_date")]
    due_date: Option<String>,
    #[serde(alias = "created_date", alias = "createdAt", alias = "created_at")]
    created_date: Option<String>,
    #[serde(alias = "email_sent")]
    email_sent: Option<bool>,
    #[serde(alias = "is_overdue")]
    is_overdue: Option<Value>,
    #[serde(alias = "days_overdue")]
    days_overdue: Option<Value>,
    #[serde(alias = "payment_terms")]
    payment_terms: Option<Value>,
    locale: Option<String>,
    timezone: Option<String>,
    description: Option<String>,
    #[serde(alias = "line_items")]
    line_items: Option<Vec<Value>>,
}

/// Derive overdue state locally: overdue iff the invoice is still `sent` and
/// `now` is strictly past the due date; the day count is the floor of the
/// elapsed whole days.
pub fn compute_overdue(
    status: &InvoiceStatus,
    due_date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> (bool, u32) {
    if !status.is_open() || now <= due_date {
        return (false, 0);
    }

    let days = (now - due_date).num_days();
    (true, u32::try_from(days).unwrap_or(u32::MAX))
}

/// Parse an upstream timestamp. RFC 3339 is expected; naive date-times and
/// bare dates are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn required<T>(value: Option<T>, field: &str, label: &str) -> Result<T> {
    value.ok_or_else(|| {
        AppError::Upstream(format!("{} is missing required field '{}'", label, field))
    })
}

fn required_text(value: Option<String>, field: &str, label: &str) -> Result<String> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(AppError::Upstream(format!(
            "{} is missing required field '{}'",
            label, field
        ))),
    }
}

/// Build an [`InvoiceRecord`] from one upstream JSON object.
///
/// Upstream `isOverdue` / `daysOverdue` values win when present and
/// well-typed (bool / non-negative integer); otherwise they are computed from
/// `due_date` against `now`. Either way, a non-`sent` invoice is never
/// overdue and `days_overdue` is zero whenever `is_overdue` is false.
pub fn normalize_invoice(raw: Value, now: DateTime<Utc>) -> Result<InvoiceRecord> {
    let label = raw
        .get("invoiceId")
        .or_else(|| raw.get("invoice_id"))
        .and_then(Value::as_str)
        .map(|id| format!("invoice {}", id))
        .unwrap_or_else(|| "invoice record".to_string());

    let raw: RawInvoice = serde_json::from_value(raw)
        .map_err(|e| AppError::Upstream(format!("{} is malformed: {}", label, e)))?;

    let invoice_id = required_text(raw.invoice_id, "invoiceId", &label)?;
    let customer_id = required_text(raw.customer_id, "customerId", &label)?;
    let amount = required(raw.amount, "amount", &label)?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AppError::Upstream(format!(
            "{} has a negative amount ({})",
            label, amount
        )));
    }

    let status = InvoiceStatus::parse(&required_text(raw.status, "status", &label)?);

    let due_raw = required_text(raw.due_date, "dueDate", &label)?;
    let due_date = parse_timestamp(&due_raw).ok_or_else(|| {
        AppError::Upstream(format!("{} has an unparsable dueDate '{}'", label, due_raw))
    })?;

    let created_date = match raw.created_date {
        Some(created) => Some(parse_timestamp(&created).ok_or_else(|| {
            AppError::Upstream(format!(
                "{} has an unparsable createdDate '{}'",
                label, created
            ))
        })?),
        None => None,
    };

    let (local_overdue, local_days) = compute_overdue(&status, due_date, now);
    let upstream_overdue = raw.is_overdue.as_ref().and_then(Value::as_bool);
    let upstream_days = raw
        .days_overdue
        .as_ref()
        .and_then(Value::as_u64)
        .and_then(|days| u32::try_from(days).ok());

    let is_overdue = status.is_open() && upstream_overdue.unwrap_or(local_overdue);
    let days_overdue = if is_overdue {
        upstream_days.unwrap_or(local_days)
    } else {
        0
    };

    // Terms arrive either as "Net 30" or as a bare day count.
    let payment_terms = raw.payment_terms.and_then(|terms| match terms {
        Value::String(text) => Some(text),
        Value::Number(days) => Some(format!("Net {}", days)),
        _ => None,
    });

    Ok(InvoiceRecord {
        invoice_id,
        customer_id,
        customer_name: raw.customer_name.unwrap_or_default(),
        customer_email: raw.customer_email.unwrap_or_default(),
        customer_company: raw.customer_company.unwrap_or_default(),
        amount,
        currency: raw
            .currency
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        status,
        due_date,
        created_date,
        email_sent: raw.email_sent.unwrap_or(false),
        is_overdue,
        days_overdue,
        payment_terms,
        locale: raw.locale,
        timezone: raw.timezone,
        description: raw.description.unwrap_or_default(),
        line_items: raw.line_items.unwrap_or_default(),
    })
}

/// Sum invoice amounts, reporting overflow as an unusable upstream payload.
pub fn sum_amounts<'a, I>(invoices: I, what: &str) -> Result<Decimal>
where
    I: IntoIterator<Item = &'a InvoiceRecord>,
{
    invoices.into_iter().try_fold(Decimal::ZERO, |total, invoice| {
        total
            .checked_add(invoice.amount)
            .ok_or_else(|| AppError::Upstream(format!("{} total overflows", what)))
    })
}
