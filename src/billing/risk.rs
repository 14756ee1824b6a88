//! Customer payment-history analytics and risk tiers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, instrument};
use utoipa::ToSchema;

use super::fetcher::{validate_customer_id, InvoiceFetcher};
use super::models::{sum_amounts, InvoiceRecord, InvoiceStatus};
use crate::types::Result;

/// Minimum payment rate (inclusive) for a `LOW` tier.
pub const LOW_RISK_MIN_PAYMENT_RATE: f64 = 0.90;
/// Minimum payment rate (inclusive) for a `MEDIUM` tier.
pub const MEDIUM_RISK_MIN_PAYMENT_RATE: f64 = 0.70;

pub const NO_HISTORY_MESSAGE: &str = "No invoices found for this customer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn from_payment_rate(rate: f64) -> Self {
        if rate >= LOW_RISK_MIN_PAYMENT_RATE {
            RiskTier::Low
        } else if rate >= MEDIUM_RISK_MIN_PAYMENT_RATE {
            RiskTier::Medium
        } else {
            RiskTier::High
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskTier::Low => "LOW",
            RiskTier::Medium => "MEDIUM",
            RiskTier::High => "HIGH",
        }
    }
}

/// What to report for a customer with no invoices at all.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyHistoryPolicy {
    /// No tier: there is no payment behaviour to judge.
    #[default]
    Unrated,
    /// Apply the rate formula literally (rate 0 gives `HIGH`).
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CustomerPaymentProfile {
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_company: String,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    pub has_history: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub total_invoices: usize,
    pub paid_invoices: usize,
    pub sent_invoices: usize,
    pub overdue_invoices: usize,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub total_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub paid_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub overdue_amount: Decimal,
    /// Paid / total, in `[0, 1]`; 0 when there are no invoices.
    pub payment_rate: f64,
    pub risk_level: Option<RiskTier>,
    pub invoices: Vec<InvoiceRecord>,
}

impl CustomerPaymentProfile {
    /// Aggregate a customer's invoices. Contact fields come from the first
    /// invoice; upstream keeps them consistent across a customer's records.
    pub fn from_invoices(
        customer_id: &str,
        invoices: Vec<InvoiceRecord>,
        policy: EmptyHistoryPolicy,
    ) -> Result<Self> {
        let total = invoices.len();
        let paid: Vec<&InvoiceRecord> = invoices
            .iter()
            .filter(|inv| inv.status == InvoiceStatus::Paid)
            .collect();
        let overdue: Vec<&InvoiceRecord> = invoices.iter().filter(|inv| inv.is_overdue).collect();
        let sent = invoices.iter().filter(|inv| inv.status.is_open()).count();

        let payment_rate = if total > 0 {
            paid.len() as f64 / total as f64
        } else {
            0.0
        };

        let risk_level = match (total, policy) {
            (0, EmptyHistoryPolicy::Unrated) => None,
            _ => Some(RiskTier::from_payment_rate(payment_rate)),
        };

        let first = invoices.first();
        let contact = |field: fn(&InvoiceRecord) -> &String| {
            first.map(|inv| field(inv).clone()).unwrap_or_default()
        };

        Ok(Self {
            customer_id: customer_id.to_string(),
            customer_name: contact(|inv| &inv.customer_name),
            customer_email: contact(|inv| &inv.customer_email),
            customer_company: contact(|inv| &inv.customer_company),
            currency: contact(|inv| &inv.currency),
            locale: first.and_then(|inv| inv.locale.clone()),
            has_history: total > 0,
            message: (total == 0).then(|| NO_HISTORY_MESSAGE.to_string()),
            total_invoices: total,
            paid_invoices: paid.len(),
            sent_invoices: sent,
            overdue_invoices: overdue.len(),
            total_amount: sum_amounts(&invoices, "invoiced")?,
            paid_amount: sum_amounts(paid.iter().copied(), "paid")?,
            overdue_amount: sum_amounts(overdue.iter().copied(), "overdue")?,
            payment_rate,
            risk_level,
            invoices,
        })
    }
}

/// Build a profile per customer from one invoice snapshot, keyed by customer id.
pub fn profiles_by_customer(
    invoices: &[InvoiceRecord],
    policy: EmptyHistoryPolicy,
) -> Result<BTreeMap<String, CustomerPaymentProfile>> {
    let mut grouped: BTreeMap<String, Vec<InvoiceRecord>> = BTreeMap::new();
    for invoice in invoices {
        grouped
            .entry(invoice.customer_id.clone())
            .or_default()
            .push(invoice.clone());
    }

    grouped
        .into_iter()
        .map(|(customer_id, records)| -> Result<(String, CustomerPaymentProfile)> {
            let profile = CustomerPaymentProfile::from_invoices(&customer_id, records, policy)?;
            Ok((customer_id, profile))
        })
        .collect::<Result<BTreeMap<_, _>>>()
}

#[derive(Clone)]
pub struct CustomerRiskAnalyzer {
    fetcher: InvoiceFetcher,
    policy: EmptyHistoryPolicy,
}

impl CustomerRiskAnalyzer {
    pub fn new(fetcher: InvoiceFetcher, policy: EmptyHistoryPolicy) -> Self {
        Self { fetcher, policy }
    }

    pub fn policy(&self) -> EmptyHistoryPolicy {
        self.policy
    }

    /// Payment profile for one customer. A customer with no invoices is a
    /// successful "no history" profile, not an error.
    #[instrument(skip(self))]
    pub async fn get_customer_history(&self, customer_id: &str) -> Result<CustomerPaymentProfile> {
        validate_customer_id(customer_id)?;

        let invoices: Vec<InvoiceRecord> = self
            .fetcher
            .list_invoices(None)
            .await?
            .into_iter()
            .filter(|inv| inv.customer_id == customer_id)
            .collect();

        let profile = CustomerPaymentProfile::from_invoices(customer_id, invoices, self.policy)?;

        info!(
            customer_id,
            total = profile.total_invoices,
            payment_rate = profile.payment_rate,
            risk = profile.risk_level.map(RiskTier::as_str).unwrap_or("UNRATED"),
            "Customer history analyzed"
        );

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AppError;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn record(id: &str, status: InvoiceStatus, days_overdue: u32) -> InvoiceRecord {
        InvoiceRecord {
            invoice_id: id.to_string(),
            customer_id: "CUST-1".to_string(),
            customer_name: "Acme Corp".to_string(),
            customer_email: "ap@acme.test".to_string(),
            customer_company: "Acme".to_string(),
            amount: Decimal::new(100, 0),
            currency: "USD".to_string(),
            is_overdue: days_overdue > 0,
            status,
            due_date: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            created_date: None,
            email_sent: false,
            days_overdue,
            payment_terms: None,
            locale: Some("en-US".to_string()),
            timezone: None,
            description: String::new(),
            line_items: vec![],
        }
    }

    fn history(paid: usize, total: usize) -> Vec<InvoiceRecord> {
        (0..total)
            .map(|i| {
                if i < paid {
                    record(&format!("INV-{}", i), InvoiceStatus::Paid, 0)
                } else {
                    record(&format!("INV-{}", i), InvoiceStatus::Sent, 12)
                }
            })
            .collect()
    }

    fn profile_of(
        customer_id: &str,
        invoices: Vec<InvoiceRecord>,
        policy: EmptyHistoryPolicy,
    ) -> CustomerPaymentProfile {
        CustomerPaymentProfile::from_invoices(customer_id, invoices, policy).unwrap()
    }

    #[rstest]
    #[case(1.0, RiskTier::Low)]
    #[case(0.90, RiskTier::Low)]
    #[case(0.89, RiskTier::Medium)]
    #[case(0.70, RiskTier::Medium)]
    #[case(0.69, RiskTier::High)]
    #[case(0.0, RiskTier::High)]
    fn test_tier_thresholds(#[case] rate: f64, #[case] expected: RiskTier) {
        assert_eq!(RiskTier::from_payment_rate(rate), expected);
    }

    #[test]
    fn test_nine_of_ten_paid_is_low_risk() {
        let profile = profile_of("CUST-1", history(9, 10), EmptyHistoryPolicy::default());

        assert_eq!(profile.payment_rate, 0.9);
        assert_eq!(profile.risk_level, Some(RiskTier::Low));
        assert_eq!(profile.paid_invoices, 9);
        assert_eq!(profile.sent_invoices, 1);
        assert_eq!(profile.overdue_invoices, 1);
        assert_eq!(profile.total_amount, Decimal::new(1000, 0));
        assert_eq!(profile.paid_amount, Decimal::new(900, 0));
        assert_eq!(profile.overdue_amount, Decimal::new(100, 0));
    }

    #[test]
    fn test_six_of_ten_paid_is_high_risk() {
        let profile = profile_of("CUST-2", history(6, 10), EmptyHistoryPolicy::default());
        assert_eq!(profile.payment_rate, 0.6);
        assert_eq!(profile.risk_level, Some(RiskTier::High));
    }

    #[test]
    fn test_empty_history_unrated() {
        let profile = profile_of("CUST-3", vec![], EmptyHistoryPolicy::Unrated);

        assert!(!profile.has_history);
        assert_eq!(profile.message.as_deref(), Some(NO_HISTORY_MESSAGE));
        assert_eq!(profile.total_invoices, 0);
        assert_eq!(profile.payment_rate, 0.0);
        assert_eq!(profile.total_amount, Decimal::ZERO);
        assert_eq!(profile.risk_level, None);
    }

    #[test]
    fn test_empty_history_literal_formula() {
        let profile = profile_of("CUST-3", vec![], EmptyHistoryPolicy::High);
        assert!(!profile.has_history);
        assert_eq!(profile.risk_level, Some(RiskTier::High));
    }

    #[test]
    fn test_contact_fields_denormalized() {
        let profile = profile_of("CUST-1", history(1, 2), EmptyHistoryPolicy::default());
        assert_eq!(profile.customer_name, "Acme Corp");
        assert_eq!(profile.customer_email, "ap@acme.test");
        assert_eq!(profile.locale.as_deref(), Some("en-US"));
    }

    #[test]
    fn test_profiles_grouped_by_customer() {
        let mut invoices = history(2, 3);
        let mut other = record("INV-X", InvoiceStatus::Paid, 0);
        other.customer_id = "CUST-9".to_string();
        invoices.push(other);

        let profiles = profiles_by_customer(&invoices, EmptyHistoryPolicy::default()).unwrap();
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles["CUST-1"].total_invoices, 3);
        assert_eq!(profiles["CUST-9"].payment_rate, 1.0);
    }

    #[test]
    fn test_overflowing_amounts_are_rejected() {
        let mut invoices = history(2, 2);
        for invoice in &mut invoices {
            invoice.amount = Decimal::from_str_exact("50000000000000000000000000000").unwrap();
        }

        let err =
            CustomerPaymentProfile::from_invoices("CUST-1", invoices.clone(), Default::default())
                .unwrap_err();
        assert!(matches!(err, AppError::Upstream(ref m) if m.contains("overflows")));
        assert!(profiles_by_customer(&invoices, EmptyHistoryPolicy::default()).is_err());
    }

    #[test]
    fn test_tier_serializes_uppercase() {
        assert_eq!(serde_json::to_value(RiskTier::Medium).unwrap(), "MEDIUM");
    }
}
