use crate::billing::{with_deadline, BillingService};
use crate::types::{AppError, Result, ToolDefinition};
use crate::utils::toml_config::{PayPilotConfig, ToolConfig};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters_schema(&self) -> Value;
    async fn execute(&self, args: Value) -> Result<Value>;
}

struct RegisteredTool {
    tool: Arc<dyn Tool>,
    description: String,
    timeout: Duration,
}

pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrap a tool result as a success envelope. Object results are merged into
/// the envelope, anything else lands under `result`.
pub fn success_envelope(data: Value) -> Value {
    let mut envelope = Map::new();
    envelope.insert("success".to_string(), Value::Bool(true));
    match data {
        Value::Object(fields) => {
            for (key, value) in fields {
                if key != "success" {
                    envelope.insert(key, value);
                }
            }
        }
        other => {
            envelope.insert("result".to_string(), other);
        }
    }
    Value::Object(envelope)
}

pub fn failure_envelope(err: &AppError) -> Value {
    json!({
        "success": false,
        "error_kind": err.kind(),
        "error": err.to_string(),
    })
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Create a registry with every billing tool that `config` leaves enabled
    pub fn with_billing_tools(service: Arc<BillingService>, config: &PayPilotConfig) -> Self {
        let mut registry = Self::new();

        let tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(super::invoice::GetInvoiceDetails::new(service.clone())),
            Arc::new(super::invoice::ListAllInvoices::new(service.clone())),
            Arc::new(super::invoice::GetOverdueInvoices::new(service.clone())),
            Arc::new(super::customer::GetCustomerInvoiceHistory::new(service.clone())),
            Arc::new(super::actions::UpdateInvoiceStatus::new(service.clone())),
            Arc::new(super::actions::SendPaymentReminder::new(service.clone())),
            Arc::new(super::actions::ReviewOverdueAccounts::new(service)),
        ];

        for tool in tools {
            let settings = config.tool(tool.name());
            if settings.enabled {
                registry.register_with_config(tool, &settings);
            } else {
                debug!(tool = tool.name(), "Tool disabled in config");
            }
        }

        registry
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.register_with_config(tool, &ToolConfig::default());
    }

    pub fn register_with_config(&mut self, tool: Arc<dyn Tool>, settings: &ToolConfig) {
        let description = settings
            .description
            .clone()
            .unwrap_or_else(|| tool.description().to_string());
        self.tools.insert(
            tool.name().to_string(),
            RegisteredTool {
                tool,
                description,
                timeout: Duration::from_secs(settings.timeout_secs),
            },
        );
    }

    /// Definitions of every registered tool, sorted by name
    pub fn get_tool_definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions: Vec<ToolDefinition> = self
            .tools
            .iter()
            .map(|(name, entry)| ToolDefinition {
                name: name.clone(),
                description: entry.description.clone(),
                parameters: entry.tool.parameters_schema(),
            })
            .collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Run a tool and wrap its outcome in the success/failure envelope.
    ///
    /// Tool failures (including timeouts) come back as `Ok` failure
    /// envelopes; only an unknown tool name is an `Err`.
    pub async fn execute(&self, name: &str, args: Value) -> Result<Value> {
        let entry = self
            .tools
            .get(name)
            .ok_or_else(|| AppError::NotFound(format!("Tool not found: {}", name)))?;

        match with_deadline(entry.timeout, entry.tool.execute(args)).await {
            Ok(data) => Ok(success_envelope(data)),
            Err(e) => {
                warn!(tool = name, kind = e.kind(), error = %e, "Tool call failed");
                Ok(failure_envelope(&e))
            }
        }
    }

    /// Get a list of all registered tool names, sorted
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a tool is registered
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }
}
