//! # PayPilot - invoice risk and overdue analytics
//!
//! PayPilot reads invoices from a billing REST API and answers the questions a
//! collections agent asks: which invoices are overdue and how urgently, how
//! reliably a customer pays, and what to do about each overdue account.
//!
//! ## Overview
//!
//! PayPilot can be used in three ways:
//!
//! 1. **As a server** - `paypilot serve` exposes the REST API and tool endpoints
//! 2. **As a CLI** - `paypilot overdue`, `paypilot customer CUST-1`, ...
//! 3. **As a library** - embed [`BillingService`] or the [`ToolRegistry`] in an agent runtime
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use paypilot::{BillingService, PayPilotConfig};
//!
//! let config = PayPilotConfig::load("paypilot.toml")?;
//! let billing = BillingService::from_config(&config)?;
//!
//! let summary = billing.get_overdue_invoices().await?;
//! println!("{} overdue, {} total", summary.overdue_count, summary.total_overdue_amount);
//!
//! let profile = billing.get_customer_history("CUST-1").await?;
//! println!("risk: {:?}", profile.risk_level);
//! ```
//!
//! ### Using Tools
//!
//! ```rust,ignore
//! use paypilot::ToolRegistry;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let registry = ToolRegistry::with_billing_tools(Arc::new(billing), &config);
//! let result = registry.execute("get_overdue_invoices", json!({})).await?;
//! assert_eq!(result["success"], true);
//! ```
//!
//! ## Architecture
//!
//! [`billing`] holds all computation and talks to upstream only through the
//! [`BillingApi`](billing::BillingApi) trait. [`tools`], [`api`] and [`cli`]
//! are thin surfaces over the same [`BillingService`].

/// HTTP API handlers and routes.
pub mod api;
/// Invoice fetching, overdue classification and customer risk analytics.
pub mod billing;
/// Command-line interface.
pub mod cli;
/// Billing operations exposed as agent tools.
pub mod tools;
/// Core types (responses, errors).
pub mod types;
/// Configuration utilities (TOML).
pub mod utils;

// Re-export commonly used types
pub use billing::{BillingService, CustomerPaymentProfile, InvoiceRecord, OverdueSummary, RiskTier};
pub use tools::registry::ToolRegistry;
pub use types::{AppError, Result};
pub use utils::toml_config::PayPilotConfig;

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<PayPilotConfig>,
    /// Billing operations over the upstream API
    pub billing: Arc<BillingService>,
    /// Registered billing tools
    pub tool_registry: Arc<ToolRegistry>,
}

impl AppState {
    /// Wire the billing service and tool registry for `config`.
    pub fn new(config: PayPilotConfig, billing: BillingService) -> Self {
        let billing = Arc::new(billing);
        let tool_registry = Arc::new(ToolRegistry::with_billing_tools(billing.clone(), &config));
        Self {
            config: Arc::new(config),
            billing,
            tool_registry,
        }
    }

    /// HTTP-backed state built from configuration.
    pub fn from_config(config: PayPilotConfig) -> Result<Self> {
        let billing = BillingService::from_config(&config)?;
        Ok(Self::new(config, billing))
    }
}
