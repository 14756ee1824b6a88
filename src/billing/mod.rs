//! Invoice analytics over the upstream billing API.
//!
//! Everything here reads live data: no invoice is cached between calls, so
//! two calls against an unchanged upstream return identical results.
//!
//! - [`fetcher`] - single and bulk retrieval with normalization
//! - [`overdue`] - urgency buckets and total exposure
//! - [`risk`] - per-customer payment rate and risk tier
//! - [`collections`] - recommended action and tone per overdue invoice
//! - [`management`] - status updates and payment reminders

pub mod client;
pub mod clock;
pub mod collections;
pub mod fetcher;
pub mod management;
pub mod models;
pub mod overdue;
pub mod risk;

pub use client::{BillingApi, HttpBillingClient, InMemoryBillingApi};
pub use clock::{Clock, FixedClock, SystemClock};
pub use collections::{CollectionAction, CollectionsReview, CommunicationTone};
pub use fetcher::{InvoiceFetcher, InvoiceListing};
pub use management::{ReminderOutcome, ReminderRequest, StatusUpdateOutcome};
pub use models::{InvoiceRecord, InvoiceStatus};
pub use overdue::{OverdueSummary, Urgency};
pub use risk::{CustomerPaymentProfile, EmptyHistoryPolicy, RiskTier};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::types::{AppError, Result};
use crate::utils::toml_config::PayPilotConfig;

use collections::CollectionsReviewer;
use management::InvoiceManager;
use overdue::OverdueClassifier;
use risk::CustomerRiskAnalyzer;

/// Run `fut` with a deadline. Expiry drops the in-flight work and is reported
/// as an upstream timeout.
pub async fn with_deadline<T, F>(limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Upstream(format!(
            "operation timed out after {}s",
            limit.as_secs_f64()
        ))),
    }
}

/// One entry point for every billing operation, shared by the tools, the
/// HTTP handlers and the CLI.
#[derive(Clone)]
pub struct BillingService {
    fetcher: InvoiceFetcher,
    overdue: OverdueClassifier,
    risk: CustomerRiskAnalyzer,
    collections: CollectionsReviewer,
    manager: InvoiceManager,
}

impl BillingService {
    pub fn new(
        api: Arc<dyn BillingApi>,
        clock: Arc<dyn Clock>,
        policy: EmptyHistoryPolicy,
    ) -> Self {
        let fetcher = InvoiceFetcher::new(api, clock);
        Self {
            overdue: OverdueClassifier::new(fetcher.clone()),
            risk: CustomerRiskAnalyzer::new(fetcher.clone(), policy),
            collections: CollectionsReviewer::new(fetcher.clone(), policy),
            manager: InvoiceManager::new(fetcher.clone()),
            fetcher,
        }
    }

    /// HTTP-backed service using the system clock.
    pub fn from_config(config: &PayPilotConfig) -> Result<Self> {
        let client = HttpBillingClient::new(&config.billing, config.billing_api_key())?;
        Ok(Self::new(
            Arc::new(client),
            Arc::new(SystemClock),
            config.risk.empty_history,
        ))
    }

    pub fn empty_history_policy(&self) -> EmptyHistoryPolicy {
        self.risk.policy()
    }

    pub async fn get_invoice_details(&self, invoice_id: &str) -> Result<InvoiceRecord> {
        self.fetcher.fetch_invoice(invoice_id).await
    }

    pub async fn list_all_invoices(&self, status: Option<&str>) -> Result<Vec<InvoiceRecord>> {
        self.fetcher.list_invoices(status).await
    }

    pub async fn list_with_summary(&self, status: Option<&str>) -> Result<InvoiceListing> {
        self.fetcher.list_with_summary(status).await
    }

    pub async fn get_overdue_invoices(&self) -> Result<OverdueSummary> {
        self.overdue.get_overdue_invoices().await
    }

    pub async fn get_customer_history(&self, customer_id: &str) -> Result<CustomerPaymentProfile> {
        self.risk.get_customer_history(customer_id).await
    }

    pub async fn review_overdue_accounts(&self) -> Result<CollectionsReview> {
        self.collections.review_overdue_accounts().await
    }

    pub async fn update_invoice_status(
        &self,
        invoice_id: &str,
        new_status: &str,
        notes: Option<String>,
    ) -> Result<StatusUpdateOutcome> {
        self.manager
            .update_invoice_status(invoice_id, new_status, notes)
            .await
    }

    pub async fn send_payment_reminder(&self, request: ReminderRequest) -> Result<ReminderOutcome> {
        self.manager.send_payment_reminder(request).await
    }
}
