//! Single and bulk invoice retrieval with normalization.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::client::BillingApi;
use super::clock::Clock;
use super::models::{normalize_invoice, InvoiceRecord, InvoiceStatus};
use crate::types::{AppError, Result};

const MAX_IDENTIFIER_LEN: usize = 128;
const MAX_STATUS_LEN: usize = 32;

/// Normalized invoices plus whatever summary block upstream attached.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceListing {
    pub invoices: Vec<InvoiceRecord>,
    pub summary: Option<Value>,
    /// The instant every record's overdue state was derived against.
    pub as_of: DateTime<Utc>,
}

/// Reject identifiers that are empty, oversized, or would escape the URL path segment.
pub fn validate_identifier(kind: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", kind)));
    }
    if value.len() > MAX_IDENTIFIER_LEN {
        return Err(AppError::Validation(format!(
            "{} exceeds {} characters",
            kind, MAX_IDENTIFIER_LEN
        )));
    }
    if let Some(bad) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':')))
    {
        return Err(AppError::Validation(format!(
            "{} '{}' contains invalid character '{}'",
            kind, value, bad
        )));
    }
    // "." and ".." are dot-segments that URL normalization would collapse
    if !value.chars().any(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::Validation(format!(
            "{} '{}' must contain a letter or digit",
            kind, value
        )));
    }
    Ok(())
}

/// Customer ids are only compared against listed records, never placed in a URL.
pub fn validate_customer_id(value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation("customer id must not be empty".to_string()));
    }
    if value.len() > MAX_IDENTIFIER_LEN {
        return Err(AppError::Validation(format!(
            "customer id exceeds {} characters",
            MAX_IDENTIFIER_LEN
        )));
    }
    if value.chars().any(char::is_control) {
        return Err(AppError::Validation(
            "customer id must not contain control characters".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_status_filter(value: &str) -> Result<InvoiceStatus> {
    let trimmed = value.trim();
    let well_formed = !trimmed.is_empty()
        && trimmed.len() <= MAX_STATUS_LEN
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if !well_formed {
        return Err(AppError::Validation(format!(
            "'{}' is not a valid invoice status",
            value
        )));
    }
    Ok(InvoiceStatus::parse(trimmed))
}

/// Reads invoices from the billing API and normalizes them.
#[derive(Clone)]
pub struct InvoiceFetcher {
    api: Arc<dyn BillingApi>,
    clock: Arc<dyn Clock>,
}

impl InvoiceFetcher {
    pub fn new(api: Arc<dyn BillingApi>, clock: Arc<dyn Clock>) -> Self {
        Self { api, clock }
    }

    pub fn api(&self) -> &Arc<dyn BillingApi> {
        &self.api
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Fetch one invoice.
    ///
    /// # Errors
    ///
    /// `Validation` for a malformed id, `NotFound` when upstream has no such
    /// record, `Upstream` for transport failures or an unusable payload.
    #[instrument(skip(self))]
    pub async fn fetch_invoice(&self, invoice_id: &str) -> Result<InvoiceRecord> {
        validate_identifier("invoice id", invoice_id)?;

        let raw = self
            .api
            .get_invoice(invoice_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Invoice {} not found", invoice_id)))?;

        normalize_invoice(raw, self.clock.now())
    }

    /// Fetch all invoices, or only those in `status_filter`.
    ///
    /// One malformed record fails the whole call; nothing is dropped silently.
    #[instrument(skip(self))]
    pub async fn list_invoices(&self, status_filter: Option<&str>) -> Result<Vec<InvoiceRecord>> {
        Ok(self.list_with_summary(status_filter).await?.invoices)
    }

    /// Like [`list_invoices`](Self::list_invoices), also keeping the upstream summary.
    pub async fn list_with_summary(&self, status_filter: Option<&str>) -> Result<InvoiceListing> {
        let filter = status_filter.map(validate_status_filter).transpose()?;

        let page = self
            .api
            .list_invoices(filter.as_ref().map(InvoiceStatus::as_str))
            .await?;

        // One instant for the whole page so every record is judged against the same "now".
        let now = self.clock.now();
        let mut invoices = page
            .invoices
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                normalize_invoice(raw, now).map_err(|e| match e {
                    AppError::Upstream(msg) => {
                        AppError::Upstream(format!("record #{} in invoice list: {}", index, msg))
                    }
                    other => other,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(wanted) = &filter {
            invoices.retain(|invoice| &invoice.status == wanted);
        }

        debug!(count = invoices.len(), "Invoices normalized");

        Ok(InvoiceListing {
            invoices,
            summary: page.summary,
            as_of: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::client::{InMemoryBillingApi, MockBillingApi};
    use crate::billing::clock::FixedClock;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use serde_json::json;

    fn fetcher(invoices: Vec<Value>) -> (InvoiceFetcher, Arc<InMemoryBillingApi>) {
        let api = Arc::new(InMemoryBillingApi::new(invoices));
        let clock = FixedClock(Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap());
        (InvoiceFetcher::new(api.clone(), Arc::new(clock)), api)
    }

    fn invoice(id: &str, status: &str, due: &str) -> Value {
        json!({
            "invoiceId": id,
            "customerId": "CUST-1",
            "amount": 100,
            "status": status,
            "dueDate": due
        })
    }

    #[rstest]
    #[case("")]
    #[case("INV 1")]
    #[case("../admin")]
    #[case("INV-1?x=1")]
    #[case(".")]
    #[case("..")]
    #[case("-_:")]
    fn test_invalid_identifiers(#[case] id: &str) {
        assert!(matches!(
            validate_identifier("invoice id", id),
            Err(AppError::Validation(_))
        ));
    }

    #[rstest]
    #[case("INV-001")]
    #[case("inv_2025.03:7")]
    fn test_valid_identifiers(#[case] id: &str) {
        assert!(validate_identifier("invoice id", id).is_ok());
    }

    #[rstest]
    #[case("CUST-1")]
    #[case("ap@acme.example.com")]
    #[case("Acme Corp 7")]
    fn test_customer_ids_are_only_length_checked(#[case] id: &str) {
        assert!(validate_customer_id(id).is_ok());
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("CUST\n1")]
    fn test_invalid_customer_ids(#[case] id: &str) {
        assert!(matches!(validate_customer_id(id), Err(AppError::Validation(_))));
        assert!(validate_customer_id(&"C".repeat(MAX_IDENTIFIER_LEN + 1)).is_err());
    }

    #[rstest]
    #[case("")]
    #[case("sent;drop")]
    #[case("paid&status=sent")]
    fn test_invalid_status_filters(#[case] status: &str) {
        assert!(matches!(
            validate_status_filter(status),
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_missing_invoice_is_not_found() {
        let (fetcher, _) = fetcher(vec![]);
        let err = fetcher.fetch_invoice("INV-404").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_fetch_invalid_id_never_reaches_upstream() {
        let (fetcher, api) = fetcher(vec![]);
        let err = fetcher.fetch_invoice("bad id").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(api.requests().is_empty());
    }

    #[tokio::test]
    async fn test_list_filters_locally_as_well() {
        let (fetcher, api) = fetcher(vec![
            invoice("INV-1", "sent", "2025-03-01"),
            invoice("INV-2", "paid", "2025-03-01"),
            invoice("INV-3", "pending", "2025-04-01"),
        ]);

        let sent = fetcher.list_invoices(Some("sent")).await.unwrap();
        let ids: Vec<_> = sent.iter().map(|i| i.invoice_id.as_str()).collect();
        assert_eq!(ids, vec!["INV-1", "INV-3"]);
        assert_eq!(api.requests(), vec!["GET /invoices?status=sent".to_string()]);
    }

    #[tokio::test]
    async fn test_list_fails_fast_on_malformed_record() {
        let (fetcher, _) = fetcher(vec![
            invoice("INV-1", "sent", "2025-03-01"),
            json!({ "invoiceId": "INV-2", "amount": 5, "status": "sent", "dueDate": "2025-03-01" }),
        ]);

        let err = fetcher.list_invoices(None).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
        assert!(err.to_string().contains("record #1"));
        assert!(err.to_string().contains("customerId"));
    }

    #[tokio::test]
    async fn test_upstream_failure_propagates_unchanged() {
        let mut api = MockBillingApi::new();
        api.expect_list_invoices()
            .times(1)
            .returning(|_| Err(AppError::Upstream("HTTP 503: unavailable".to_string())));
        api.expect_get_invoice()
            .withf(|id| id == "INV-1")
            .times(1)
            .returning(|_| Err(AppError::Upstream("request timed out".to_string())));

        let clock = FixedClock(Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap());
        let fetcher = InvoiceFetcher::new(Arc::new(api), Arc::new(clock));

        let err = fetcher.list_invoices(None).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(ref m) if m.contains("503")));

        let err = fetcher.fetch_invoice("INV-1").await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(ref m) if m.contains("timed out")));
    }

    #[tokio::test]
    async fn test_repeated_reads_are_identical() {
        let (fetcher, _) = fetcher(vec![
            invoice("INV-1", "sent", "2025-03-01"),
            invoice("INV-2", "paid", "2025-02-01"),
        ]);

        let first = fetcher.list_invoices(None).await.unwrap();
        let second = fetcher.list_invoices(None).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_listing_reports_its_instant() {
        let (fetcher, _) = fetcher(vec![invoice("INV-1", "sent", "2025-03-01")]);
        let listing = fetcher.list_with_summary(None).await.unwrap();
        assert_eq!(listing.as_of, Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap());
        assert_eq!(listing.invoices[0].days_overdue, 14);
    }
}
