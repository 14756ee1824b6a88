//! Overdue and risk analytics through the public service API.

mod common;

use chrono::Duration;
use common::{days_ago, invoice, now, sample_invoices};
use paypilot::billing::{
    BillingService, EmptyHistoryPolicy, FixedClock, InMemoryBillingApi, RiskTier, Urgency,
};
use paypilot::types::AppError;
use rstest::rstest;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

fn service(invoices: Vec<Value>, policy: EmptyHistoryPolicy) -> BillingService {
    BillingService::new(
        Arc::new(InMemoryBillingApi::new(invoices)),
        Arc::new(FixedClock(now())),
        policy,
    )
}

fn customer_book(customer: &str, paid: usize, open: usize) -> Vec<Value> {
    let paid = (0..paid).map(|i| {
        invoice(&format!("{}-P{}", customer, i), customer, 100.0, "paid", days_ago(60))
    });
    let open = (0..open).map(|i| {
        invoice(&format!("{}-S{}", customer, i), customer, 100.0, "sent", days_ago(15))
    });
    paid.chain(open).collect()
}

#[rstest]
#[case(0, Urgency::Recent)]
#[case(7, Urgency::Recent)]
#[case(8, Urgency::Moderate)]
#[case(21, Urgency::Moderate)]
#[case(22, Urgency::Urgent)]
#[tokio::test]
async fn test_bucket_boundaries(#[case] days: u32, #[case] expected: Urgency) {
    let mut raw = invoice("INV-B", "CUST-1", 10.0, "sent", days_ago(30));
    raw["isOverdue"] = Value::Bool(true);
    raw["daysOverdue"] = Value::from(days);

    let summary = service(vec![raw], EmptyHistoryPolicy::Unrated)
        .get_overdue_invoices()
        .await
        .unwrap();

    assert_eq!(summary.bucket(expected).len(), 1);
    assert_eq!(summary.overdue_count, 1);
}

#[tokio::test]
async fn test_buckets_partition_the_overdue_set() {
    let mut invoices = sample_invoices();
    for days in [1, 6, 9, 14, 20, 23, 90] {
        let id = format!("INV-X{}", days);
        invoices.push(invoice(&id, "CUST-X", 10.25, "sent", days_ago(days)));
    }

    let summary = service(invoices, EmptyHistoryPolicy::Unrated)
        .get_overdue_invoices()
        .await
        .unwrap();

    let mut seen = HashSet::new();
    let mut bucket_sum = Decimal::ZERO;
    for urgency in Urgency::ALL {
        for inv in summary.bucket(urgency) {
            assert!(seen.insert(inv.invoice_id.clone()), "{} in two buckets", inv.invoice_id);
            assert_eq!(Urgency::from_days_overdue(inv.days_overdue), urgency);
        }
        bucket_sum += summary.bucket_total(urgency).unwrap();
    }

    let all: HashSet<_> = summary.overdue_invoices.iter().map(|i| i.invoice_id.clone()).collect();
    assert_eq!(seen, all);
    assert_eq!(summary.overdue_count, all.len());
    assert_eq!(bucket_sum, summary.total_overdue_amount);
    assert!(summary.overdue_invoices.iter().all(|i| i.is_overdue && i.days_overdue > 0));
}

#[tokio::test]
async fn test_invoice_due_in_future_is_not_overdue() {
    let raw = invoice("INV-F", "CUST-1", 10.0, "sent", now() + Duration::hours(1));
    let record = service(vec![raw], EmptyHistoryPolicy::Unrated)
        .get_invoice_details("INV-F")
        .await
        .unwrap();

    assert!(!record.is_overdue);
    assert_eq!(record.days_overdue, 0);
}

#[tokio::test]
async fn test_nine_of_ten_paid_is_low_risk() {
    let profile = service(customer_book("CUST-1", 9, 1), EmptyHistoryPolicy::Unrated)
        .get_customer_history("CUST-1")
        .await
        .unwrap();

    assert_eq!(profile.total_invoices, 10);
    assert_eq!(profile.payment_rate, 0.9);
    assert_eq!(profile.risk_level, Some(RiskTier::Low));
}

#[tokio::test]
async fn test_six_of_ten_paid_is_high_risk() {
    let profile = service(customer_book("CUST-2", 6, 4), EmptyHistoryPolicy::Unrated)
        .get_customer_history("CUST-2")
        .await
        .unwrap();

    assert_eq!(profile.payment_rate, 0.6);
    assert_eq!(profile.risk_level, Some(RiskTier::High));
    assert_eq!(profile.overdue_invoices, 4);
    assert_eq!(profile.overdue_amount, Decimal::new(400, 0));
}

#[rstest]
#[case(EmptyHistoryPolicy::Unrated, None)]
#[case(EmptyHistoryPolicy::High, Some(RiskTier::High))]
#[tokio::test]
async fn test_customer_with_no_invoices(
    #[case] policy: EmptyHistoryPolicy,
    #[case] expected: Option<RiskTier>,
) {
    let profile = service(sample_invoices(), policy)
        .get_customer_history("CUST-3")
        .await
        .unwrap();

    assert!(!profile.has_history);
    assert!(profile.message.as_deref().unwrap_or_default().contains("No invoices"));
    assert_eq!(profile.total_invoices, 0);
    assert_eq!(profile.total_amount, Decimal::ZERO);
    assert_eq!(profile.payment_rate, 0.0);
    assert_eq!(profile.risk_level, expected);
}

#[tokio::test]
async fn test_amounts_too_large_to_total_are_upstream_errors() {
    let invoices: Vec<Value> = ["INV-H1", "INV-H2"]
        .into_iter()
        .map(|id| {
            let mut raw = invoice(id, "CUST-H", 0.0, "sent", days_ago(30));
            raw["amount"] = Value::from("50000000000000000000000000000");
            raw
        })
        .collect();
    let svc = service(invoices, EmptyHistoryPolicy::Unrated);

    let err = svc.get_overdue_invoices().await.unwrap_err();
    assert!(matches!(err, AppError::Upstream(ref m) if m == "overdue total overflows"));
    assert!(matches!(
        svc.get_customer_history("CUST-H").await,
        Err(AppError::Upstream(_))
    ));
    assert!(matches!(
        svc.review_overdue_accounts().await,
        Err(AppError::Upstream(_))
    ));
}

#[tokio::test]
async fn test_reads_are_idempotent() {
    let svc = service(sample_invoices(), EmptyHistoryPolicy::Unrated);

    assert_eq!(
        svc.get_overdue_invoices().await.unwrap(),
        svc.get_overdue_invoices().await.unwrap()
    );
    assert_eq!(
        svc.get_customer_history("CUST-B").await.unwrap(),
        svc.get_customer_history("CUST-B").await.unwrap()
    );
    assert_eq!(
        svc.review_overdue_accounts().await.unwrap(),
        svc.review_overdue_accounts().await.unwrap()
    );
}
