//! Terminal rendering for invoices, overdue buckets, customer profiles and
//! collections reviews.
//!
//! Plain mode (`--no-color`) prints the same layout without ANSI escapes so
//! the output stays greppable.

use owo_colors::OwoColorize;
use rust_decimal::Decimal;

use crate::billing::{
    CollectionsReview, CustomerPaymentProfile, InvoiceRecord, OverdueSummary, RiskTier, Urgency,
};
use crate::types::Result;

const KEY_WIDTH: usize = 14;
const UNRATED: &str = "UNRATED";

#[derive(Debug, Clone, Copy)]
struct Column {
    title: &'static str,
    width: usize,
    right: bool,
}

const fn col(title: &'static str, width: usize) -> Column {
    Column {
        title,
        width,
        right: false,
    }
}

const fn num(title: &'static str, width: usize) -> Column {
    Column {
        title,
        width,
        right: true,
    }
}

const INVOICE_COLUMNS: [Column; 5] = [
    col("invoice", 14),
    col("customer", 14),
    num("amount", 16),
    col("status", 8),
    num("days", 5),
];

const REVIEW_COLUMNS: [Column; 6] = [
    col("invoice", 14),
    col("customer", 14),
    num("days", 5),
    col("risk", 8),
    col("action", 14),
    col("tone", 10),
];

/// Amount with two decimals and its currency code.
pub fn money(amount: Decimal, currency: &str) -> String {
    format!("{:.2} {}", amount.round_dp(2), currency)
}

pub fn risk_label(tier: Option<RiskTier>) -> &'static str {
    tier.map(RiskTier::as_str).unwrap_or(UNRATED)
}

/// Shorten `text` to `width` characters, marking the cut with `~`.
fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(width.saturating_sub(1)).collect();
    clipped.push('~');
    clipped
}

fn format_row(columns: &[Column], cells: &[String]) -> String {
    columns
        .iter()
        .zip(cells)
        .map(|(column, cell)| {
            let cell = clip(cell, column.width);
            if column.right {
                format!("{:>w$}", cell, w = column.width)
            } else {
                format!("{:<w$}", cell, w = column.width)
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

fn invoice_cells(invoice: &InvoiceRecord) -> Vec<String> {
    vec![
        invoice.invoice_id.clone(),
        invoice.customer_id.clone(),
        money(invoice.amount, &invoice.currency),
        invoice.status.to_string(),
        invoice.days_overdue.to_string(),
    ]
}

/// Renders billing results for a terminal.
pub struct Output {
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    pub fn new() -> Self {
        Self { colored: true }
    }

    pub fn no_color() -> Self {
        Self { colored: false }
    }

    pub fn banner(&self) {
        let version = env!("CARGO_PKG_VERSION");
        if self.colored {
            println!(
                "\n  {} {} {}\n",
                "PayPilot".bright_cyan().bold(),
                version.dimmed(),
                "invoice analytics".dimmed()
            );
        } else {
            println!("\n  PayPilot {} invoice analytics\n", version);
        }
    }

    fn tagged(&self, tag: &str, message: &str, paint: fn(&str) -> String) {
        if self.colored {
            println!("  {}: {}", paint(tag), message);
        } else {
            println!("  {}: {}", tag, message);
        }
    }

    pub fn success(&self, message: &str) {
        self.tagged("ok", message, |t| t.green().bold().to_string());
    }

    pub fn info(&self, message: &str) {
        self.tagged("note", message, |t| t.blue().bold().to_string());
    }

    pub fn warning(&self, message: &str) {
        self.tagged("warning", message, |t| t.yellow().bold().to_string());
    }

    /// Errors go to stderr.
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {}: {}", "error".red().bold(), message);
        } else {
            eprintln!("  error: {}", message);
        }
    }

    /// A file written by `init`.
    pub fn wrote(&self, kind: &str, path: &str) {
        if self.colored {
            println!("  {:>8} {} {}", "wrote".green().bold(), path, kind.dimmed());
        } else {
            println!("  {:>8} {} ({})", "wrote", path, kind);
        }
    }

    /// A file `init` left untouched.
    pub fn kept(&self, path: &str, reason: &str) {
        if self.colored {
            println!("  {:>8} {} {}", "kept".yellow().bold(), path, reason.dimmed());
        } else {
            println!("  {:>8} {} ({})", "kept", path, reason);
        }
    }

    /// A numbered instruction followed by the shell commands that carry it out.
    pub fn step(&self, number: usize, text: &str, commands: &[&str]) {
        println!("\n  {}. {}", number, text);
        for command in commands {
            if self.colored {
                println!("       {}", command.bright_cyan());
            } else {
                println!("       $ {}", command);
            }
        }
    }

    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold());
        } else {
            println!("\n  {}", title);
            println!("  {}", "=".repeat(title.chars().count()));
        }
    }

    pub fn subheader(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.cyan().bold());
        } else {
            println!("\n  {}:", title);
        }
    }

    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("  {} {}", format!("{:>w$}", key, w = KEY_WIDTH).dimmed(), value);
        } else {
            println!("  {:>w$} {}", key, value, w = KEY_WIDTH);
        }
    }

    pub fn list_item(&self, item: &str) {
        println!("  {:>w$} {}", "-", item, w = KEY_WIDTH);
    }

    pub fn newline(&self) {
        println!();
    }

    fn paint_risk(&self, tier: Option<RiskTier>) -> String {
        let label = risk_label(tier);
        if !self.colored {
            return label.to_string();
        }
        match tier {
            Some(RiskTier::Low) => label.green().bold().to_string(),
            Some(RiskTier::Medium) => label.yellow().bold().to_string(),
            Some(RiskTier::High) => label.red().bold().to_string(),
            None => label.dimmed().to_string(),
        }
    }

    fn paint_urgency(&self, urgency: Urgency, text: &str) -> String {
        if !self.colored {
            return text.to_string();
        }
        match urgency {
            Urgency::Recent => text.cyan().bold().to_string(),
            Urgency::Moderate => text.yellow().bold().to_string(),
            Urgency::Urgent => text.red().bold().to_string(),
        }
    }

    fn table(&self, columns: &[Column], rows: &[Vec<String>]) {
        let titles: Vec<String> = columns.iter().map(|c| c.title.to_string()).collect();
        let header = format_row(columns, &titles);
        let rule_width = columns.iter().map(|c| c.width + 2).sum::<usize>() - 2;
        if self.colored {
            println!("  {}", header.bold());
            println!("  {}", "-".repeat(rule_width).dimmed());
        } else {
            println!("  {}", header);
            println!("  {}", "-".repeat(rule_width));
        }
        for row in rows {
            println!("  {}", format_row(columns, row));
        }
    }

    pub fn invoice(&self, invoice: &InvoiceRecord) {
        self.header(&format!("Invoice {}", invoice.invoice_id));
        self.kv(
            "customer",
            &format!("{} ({})", invoice.customer_name, invoice.customer_id),
        );
        if !invoice.customer_email.is_empty() {
            self.kv("email", &invoice.customer_email);
        }
        self.kv("amount", &money(invoice.amount, &invoice.currency));
        self.kv("status", invoice.status.as_str());
        self.kv("due", &invoice.due_date.format("%Y-%m-%d").to_string());
        if invoice.is_overdue {
            let urgency = Urgency::from_days_overdue(invoice.days_overdue);
            let text = format!("{} days, {}", invoice.days_overdue, urgency.as_str());
            self.kv("overdue", &self.paint_urgency(urgency, &text));
        } else {
            self.kv("overdue", "no");
        }
        if let Some(terms) = &invoice.payment_terms {
            self.kv("terms", terms);
        }
    }

    pub fn invoice_table(&self, invoices: &[InvoiceRecord]) {
        if invoices.is_empty() {
            self.info("no invoices");
            return;
        }
        let rows: Vec<Vec<String>> = invoices.iter().map(invoice_cells).collect();
        self.table(&INVOICE_COLUMNS, &rows);
    }

    /// Totals, then one table per urgency bucket, most urgent first.
    pub fn overdue_summary(&self, summary: &OverdueSummary) -> Result<()> {
        self.header("Overdue invoices");
        if summary.is_empty() {
            self.success("nothing is overdue");
            return Ok(());
        }
        self.kv("count", &summary.overdue_count.to_string());
        self.kv("total", &format!("{:.2}", summary.total_overdue_amount));

        for urgency in Urgency::ALL.into_iter().rev() {
            let bucket = summary.bucket(urgency);
            if bucket.is_empty() {
                continue;
            }
            let title = format!(
                "{} ({} invoices, {:.2})",
                urgency.as_str(),
                bucket.len(),
                summary.bucket_total(urgency)?
            );
            println!("\n  {}", self.paint_urgency(urgency, &title));
            self.invoice_table(bucket);
        }
        Ok(())
    }

    pub fn customer_profile(&self, profile: &CustomerPaymentProfile) {
        self.header(&format!("Customer {}", profile.customer_id));
        if !profile.has_history {
            self.info(profile.message.as_deref().unwrap_or("no invoices found"));
            self.kv("risk", &self.paint_risk(profile.risk_level));
            return;
        }
        self.kv("name", &profile.customer_name);
        if !profile.customer_company.is_empty() {
            self.kv("company", &profile.customer_company);
        }
        self.kv(
            "invoices",
            &format!(
                "{} total, {} paid, {} open, {} overdue",
                profile.total_invoices,
                profile.paid_invoices,
                profile.sent_invoices,
                profile.overdue_invoices
            ),
        );
        self.kv("invoiced", &money(profile.total_amount, &profile.currency));
        self.kv("paid", &money(profile.paid_amount, &profile.currency));
        self.kv("overdue", &money(profile.overdue_amount, &profile.currency));
        self.kv("payment rate", &format!("{:.0}%", profile.payment_rate * 100.0));
        self.kv("risk", &self.paint_risk(profile.risk_level));
    }

    pub fn collections_review(&self, review: &CollectionsReview) {
        self.header("Collections review");
        self.kv("as of", &review.generated_at.format("%Y-%m-%d %H:%M UTC").to_string());
        if review.items.is_empty() {
            self.success("no overdue accounts");
            return;
        }
        self.kv("overdue", &review.overdue_count.to_string());
        self.kv("total", &format!("{:.2}", review.total_overdue_amount));
        self.kv("escalations", &review.escalations.to_string());
        self.newline();

        let rows: Vec<Vec<String>> = review
            .items
            .iter()
            .map(|item| {
                vec![
                    item.invoice.invoice_id.clone(),
                    item.customer.customer_id.clone(),
                    item.invoice.days_overdue.to_string(),
                    risk_label(item.customer.risk_level).to_string(),
                    item.action.as_str().to_string(),
                    item.tone.as_str().to_string(),
                ]
            })
            .collect();
        self.table(&REVIEW_COLUMNS, &rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::models::normalize_invoice;
    use crate::billing::EmptyHistoryPolicy;
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap()
    }

    fn invoices() -> Vec<InvoiceRecord> {
        [
            ("INV-1", "paid", "2025-02-01"),
            ("INV-2", "sent", "2025-03-12"),
            ("INV-3", "sent", "2025-02-01"),
        ]
        .into_iter()
        .map(|(id, status, due)| {
            let raw = json!({
                "invoiceId": id,
                "customerId": "CUST-1",
                "customerName": "Acme Corp",
                "amount": "1250.5",
                "status": status,
                "dueDate": due
            });
            normalize_invoice(raw, now()).unwrap()
        })
        .collect()
    }

    #[test]
    fn test_money_has_two_decimals() {
        assert_eq!(money(Decimal::new(12505, 1), "USD"), "1250.50 USD");
        assert_eq!(money(Decimal::new(9999, 3), "EUR"), "10.00 EUR");
    }

    #[test]
    fn test_unrated_risk_label() {
        assert_eq!(risk_label(None), "UNRATED");
        assert_eq!(risk_label(Some(RiskTier::Medium)), "MEDIUM");
    }

    #[test]
    fn test_rows_align_and_clip() {
        let row = format_row(&INVOICE_COLUMNS, &invoice_cells(&invoices()[1]));
        assert_eq!(
            row,
            "INV-2           CUST-1               1250.50 USD  sent          3"
        );

        assert_eq!(clip("CUSTOMER-WITH-A-LONG-ID", 14), "CUSTOMER-WITH~");
        assert_eq!(clip("CUST-1", 14), "CUST-1");
    }

    #[test]
    fn test_constructors() {
        assert!(Output::new().colored);
        assert!(Output::default().colored);
        assert!(!Output::no_color().colored);
    }

    #[test]
    fn test_billing_views_render_in_both_modes() {
        let invoices = invoices();
        let summary = OverdueSummary::from_invoices(invoices.clone()).unwrap();
        let profile = CustomerPaymentProfile::from_invoices(
            "CUST-1",
            invoices.clone(),
            EmptyHistoryPolicy::default(),
        )
        .unwrap();
        let review =
            CollectionsReview::from_invoices(invoices.clone(), EmptyHistoryPolicy::High, now())
                .unwrap();

        for output in [Output::no_color(), Output::new()] {
            output.banner();
            output.invoice(&invoices[2]);
            output.invoice_table(&invoices);
            output.invoice_table(&[]);
            output.overdue_summary(&summary).unwrap();
            output.customer_profile(&profile);
            output.collections_review(&review);
            output.wrote("config", "paypilot.toml");
            output.kept(".env.example", "already exists");
            output.step(1, "Check the configuration:", &["paypilot config --validate"]);
            output.warning("warning");
            output.error("error");
        }
    }
}
