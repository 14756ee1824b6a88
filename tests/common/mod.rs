//! Shared fixtures for integration tests.
//!
//! Invoice builders emit the billing API's camelCase shape so that every test
//! exercises the same normalization path as production traffic.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use paypilot::billing::{
    BillingService, EmptyHistoryPolicy, FixedClock, HttpBillingClient, InMemoryBillingApi,
};
use paypilot::utils::toml_config::{BillingConfig, PayPilotConfig};
use paypilot::AppState;
use serde_json::{json, Value};
use std::sync::Arc;

/// The instant every in-memory analysis is judged against.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

pub fn days_ago(days: i64) -> DateTime<Utc> {
    now() - Duration::days(days)
}

/// Upstream invoice JSON with no derived overdue fields.
pub fn invoice(id: &str, customer: &str, amount: f64, status: &str, due: DateTime<Utc>) -> Value {
    json!({
        "invoiceId": id,
        "customerId": customer,
        "customerName": format!("{} Ltd", customer),
        "customerEmail": format!("ap@{}.example.com", customer.to_lowercase()),
        "customerCompany": format!("{} Holdings", customer),
        "amount": amount,
        "currency": "USD",
        "status": status,
        "dueDate": due.to_rfc3339(),
        "createdDate": (due - Duration::days(30)).to_rfc3339(),
        "emailSent": true,
        "paymentTerms": "Net 30"
    })
}

/// A small book of invoices across three customers and all urgency buckets.
pub fn sample_invoices() -> Vec<Value> {
    vec![
        invoice("INV-001", "CUST-A", 1200.0, "sent", days_ago(3)),
        invoice("INV-002", "CUST-A", 800.0, "paid", days_ago(40)),
        invoice("INV-003", "CUST-B", 450.5, "sent", days_ago(10)),
        invoice("INV-004", "CUST-B", 300.0, "sent", days_ago(45)),
        invoice("INV-005", "CUST-C", 99.99, "sent", now() + Duration::days(5)),
        invoice("INV-006", "CUST-C", 150.0, "paid", days_ago(60)),
    ]
}

pub fn config_for(base_url: &str) -> PayPilotConfig {
    PayPilotConfig::new(BillingConfig::with_base_url(base_url))
}

/// Application state backed by an in-memory billing API and a fixed clock.
pub fn in_memory_state(invoices: Vec<Value>) -> (AppState, Arc<InMemoryBillingApi>) {
    let api = Arc::new(InMemoryBillingApi::new(invoices));
    let service = BillingService::new(
        api.clone(),
        Arc::new(FixedClock(now())),
        EmptyHistoryPolicy::Unrated,
    );
    let state = AppState::new(config_for("http://billing.invalid"), service);
    (state, api)
}

/// Billing service over HTTP against `base_url`, judged at the fixed clock.
pub fn http_service(config: &PayPilotConfig) -> BillingService {
    let client = HttpBillingClient::new(&config.billing, config.billing_api_key())
        .expect("client builds");
    BillingService::new(
        Arc::new(client),
        Arc::new(FixedClock(now())),
        config.risk.empty_history,
    )
}
