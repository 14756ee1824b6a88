//! Overdue classification: urgency buckets and aggregate exposure.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{info, instrument};
use utoipa::ToSchema;

use super::fetcher::InvoiceFetcher;
use super::models::{sum_amounts, InvoiceRecord, InvoiceStatus};
use crate::types::Result;

/// Last day (inclusive) of the `recent` bucket.
pub const RECENT_MAX_DAYS: u32 = 7;
/// Last day (inclusive) of the `moderate` bucket; anything later is `urgent`.
pub const MODERATE_MAX_DAYS: u32 = 21;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    /// Up to 7 days overdue.
    Recent,
    /// 8 to 21 days overdue.
    Moderate,
    /// 22 or more days overdue.
    Urgent,
}

impl Urgency {
    pub const ALL: [Urgency; 3] = [Urgency::Recent, Urgency::Moderate, Urgency::Urgent];

    /// Bucket for an overdue invoice. An invoice less than one full day past
    /// due has `days_overdue == 0` and lands in `Recent`.
    pub fn from_days_overdue(days: u32) -> Self {
        if days <= RECENT_MAX_DAYS {
            Urgency::Recent
        } else if days <= MODERATE_MAX_DAYS {
            Urgency::Moderate
        } else {
            Urgency::Urgent
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Urgency::Recent => "recent",
            Urgency::Moderate => "moderate",
            Urgency::Urgent => "urgent",
        }
    }
}

/// Most overdue first; ties by invoice id ascending.
pub fn by_urgency(a: &InvoiceRecord, b: &InvoiceRecord) -> Ordering {
    b.days_overdue
        .cmp(&a.days_overdue)
        .then_with(|| a.invoice_id.cmp(&b.invoice_id))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OverdueSummary {
    pub overdue_count: usize,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub total_overdue_amount: Decimal,
    /// Every overdue invoice, most overdue first.
    pub overdue_invoices: Vec<InvoiceRecord>,
    pub recent_invoices: Vec<InvoiceRecord>,
    pub moderate_invoices: Vec<InvoiceRecord>,
    pub urgent_invoices: Vec<InvoiceRecord>,
}

impl OverdueSummary {
    /// Classify a set of invoices. Records that are not overdue are ignored.
    ///
    /// # Errors
    ///
    /// `Upstream` when the overdue amounts do not fit in a `Decimal`.
    pub fn from_invoices<I>(invoices: I) -> Result<Self>
    where
        I: IntoIterator<Item = InvoiceRecord>,
    {
        let mut overdue: Vec<InvoiceRecord> =
            invoices.into_iter().filter(|inv| inv.is_overdue).collect();
        overdue.sort_by(by_urgency);

        let mut recent = Vec::new();
        let mut moderate = Vec::new();
        let mut urgent = Vec::new();
        for invoice in &overdue {
            match Urgency::from_days_overdue(invoice.days_overdue) {
                Urgency::Recent => recent.push(invoice.clone()),
                Urgency::Moderate => moderate.push(invoice.clone()),
                Urgency::Urgent => urgent.push(invoice.clone()),
            }
        }

        Ok(Self {
            overdue_count: overdue.len(),
            total_overdue_amount: sum_amounts(&overdue, "overdue")?,
            overdue_invoices: overdue,
            recent_invoices: recent,
            moderate_invoices: moderate,
            urgent_invoices: urgent,
        })
    }

    pub fn bucket(&self, urgency: Urgency) -> &[InvoiceRecord] {
        match urgency {
            Urgency::Recent => &self.recent_invoices,
            Urgency::Moderate => &self.moderate_invoices,
            Urgency::Urgent => &self.urgent_invoices,
        }
    }

    /// Amount owed in one bucket. Never exceeds `total_overdue_amount`.
    pub fn bucket_total(&self, urgency: Urgency) -> Result<Decimal> {
        sum_amounts(self.bucket(urgency), urgency.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.overdue_count == 0
    }
}

/// Produces [`OverdueSummary`] snapshots from the billing API.
#[derive(Clone)]
pub struct OverdueClassifier {
    fetcher: InvoiceFetcher,
}

impl OverdueClassifier {
    pub fn new(fetcher: InvoiceFetcher) -> Self {
        Self { fetcher }
    }

    /// List open (`sent`) invoices and classify the overdue ones. No overdue
    /// invoices is a successful, zeroed summary.
    #[instrument(skip(self))]
    pub async fn get_overdue_invoices(&self) -> Result<OverdueSummary> {
        let open = self
            .fetcher
            .list_invoices(Some(InvoiceStatus::Sent.as_str()))
            .await?;

        let summary = OverdueSummary::from_invoices(open)?;

        info!(
            overdue = summary.overdue_count,
            recent = summary.recent_invoices.len(),
            moderate = summary.moderate_invoices.len(),
            urgent = summary.urgent_invoices.len(),
            total = %summary.total_overdue_amount,
            "Overdue invoices classified"
        );

        Ok(summary)
    }
}
