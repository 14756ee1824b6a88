//! Collections review: per-invoice recommended action and communication tone.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use super::fetcher::InvoiceFetcher;
use super::models::InvoiceRecord;
use super::overdue::{OverdueSummary, Urgency};
use super::risk::{profiles_by_customer, CustomerPaymentProfile, EmptyHistoryPolicy, RiskTier};
use crate::types::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CollectionAction {
    /// Keep watching; prepare a gentle reminder.
    Monitor,
    /// Send a firm reminder and flag for attention.
    FirmReminder,
    /// Hand over to finance.
    Escalate,
}

impl CollectionAction {
    pub fn for_urgency(urgency: Urgency) -> Self {
        match urgency {
            Urgency::Recent => CollectionAction::Monitor,
            Urgency::Moderate => CollectionAction::FirmReminder,
            Urgency::Urgent => CollectionAction::Escalate,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CollectionAction::Monitor => "monitor",
            CollectionAction::FirmReminder => "firm_reminder",
            CollectionAction::Escalate => "escalate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CommunicationTone {
    Gentle,
    Firm,
    /// Educational, for customers with no track record.
    Supportive,
}

impl CommunicationTone {
    pub fn for_risk(risk: Option<RiskTier>) -> Self {
        match risk {
            Some(RiskTier::Low) => CommunicationTone::Gentle,
            Some(RiskTier::Medium) | Some(RiskTier::High) => CommunicationTone::Firm,
            None => CommunicationTone::Supportive,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CommunicationTone::Gentle => "gentle",
            CommunicationTone::Firm => "firm",
            CommunicationTone::Supportive => "supportive",
        }
    }
}

/// Profile fields relevant to a collections decision, without the invoice list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CustomerSnapshot {
    pub customer_id: String,
    pub customer_name: String,
    pub total_invoices: usize,
    pub overdue_invoices: usize,
    pub payment_rate: f64,
    pub risk_level: Option<RiskTier>,
}

impl From<&CustomerPaymentProfile> for CustomerSnapshot {
    fn from(profile: &CustomerPaymentProfile) -> Self {
        Self {
            customer_id: profile.customer_id.clone(),
            customer_name: profile.customer_name.clone(),
            total_invoices: profile.total_invoices,
            overdue_invoices: profile.overdue_invoices,
            payment_rate: profile.payment_rate,
            risk_level: profile.risk_level,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CollectionItem {
    pub invoice: InvoiceRecord,
    pub urgency: Urgency,
    pub action: CollectionAction,
    pub tone: CommunicationTone,
    pub customer: CustomerSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CollectionsReview {
    pub generated_at: DateTime<Utc>,
    pub overdue_count: usize,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub total_overdue_amount: Decimal,
    pub escalations: usize,
    /// Most overdue first.
    pub items: Vec<CollectionItem>,
}

impl CollectionsReview {
    /// Build a review from one invoice snapshot. `generated_at` should be the
    /// instant the snapshot was normalized against.
    pub fn from_invoices(
        invoices: Vec<InvoiceRecord>,
        policy: EmptyHistoryPolicy,
        generated_at: DateTime<Utc>,
    ) -> Result<Self> {
        let profiles = profiles_by_customer(&invoices, policy)?;
        let summary = OverdueSummary::from_invoices(invoices)?;

        let items = summary
            .overdue_invoices
            .into_iter()
            .map(|invoice| -> Result<CollectionItem> {
                let urgency = Urgency::from_days_overdue(invoice.days_overdue);
                let customer = match profiles.get(&invoice.customer_id) {
                    Some(profile) => CustomerSnapshot::from(profile),
                    None => CustomerSnapshot::from(&CustomerPaymentProfile::from_invoices(
                        &invoice.customer_id,
                        Vec::new(),
                        policy,
                    )?),
                };
                Ok(CollectionItem {
                    urgency,
                    action: CollectionAction::for_urgency(urgency),
                    tone: CommunicationTone::for_risk(customer.risk_level),
                    customer,
                    invoice,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            generated_at,
            overdue_count: summary.overdue_count,
            total_overdue_amount: summary.total_overdue_amount,
            escalations: items
                .iter()
                .filter(|item| item.action == CollectionAction::Escalate)
                .count(),
            items,
        })
    }
}

#[derive(Clone)]
pub struct CollectionsReviewer {
    fetcher: InvoiceFetcher,
    policy: EmptyHistoryPolicy,
}

impl CollectionsReviewer {
    pub fn new(fetcher: InvoiceFetcher, policy: EmptyHistoryPolicy) -> Self {
        Self { fetcher, policy }
    }

    /// Review every overdue account from a single unfiltered listing.
    #[instrument(skip(self))]
    pub async fn review_overdue_accounts(&self) -> Result<CollectionsReview> {
        let listing = self.fetcher.list_with_summary(None).await?;
        let review =
            CollectionsReview::from_invoices(listing.invoices, self.policy, listing.as_of)?;

        info!(
            overdue = review.overdue_count,
            escalations = review.escalations,
            total = %review.total_overdue_amount,
            "Collections review generated"
        );

        Ok(review)
    }
}
