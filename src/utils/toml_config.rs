//! TOML-based configuration for PayPilot
//!
//! Settings for the HTTP server, the upstream billing API, risk policy and
//! per-tool switches are read from a TOML file (`paypilot.toml`). Secrets are
//! never stored in the file: it names the environment variable holding them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::billing::EmptyHistoryPolicy;
use crate::tools::BILLING_TOOL_NAMES;

/// Root configuration structure loaded from paypilot.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayPilotConfig {
    #[serde(default)]
    pub server: ServerConfig,

    pub billing: BillingConfig,

    #[serde(default)]
    pub risk: RiskConfig,

    /// Per-tool settings, keyed by tool name
    #[serde(default)]
    pub tools: HashMap<String, ToolConfig>,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

// ============= Billing API Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    /// Base URL of the billing REST API, including any stage prefix
    pub base_url: String,

    /// Per-request timeout
    #[serde(default = "default_billing_timeout")]
    pub timeout_secs: u64,

    /// Sent as `x-user-id` on every request
    #[serde(default = "default_user_id")]
    pub user_id: String,

    /// Environment variable holding a bearer token, if the API needs one
    #[serde(default)]
    pub api_key_env: Option<String>,

    #[serde(default = "default_email_path")]
    pub email_path: String,
}

fn default_billing_timeout() -> u64 {
    30
}

fn default_user_id() -> String {
    "agent-system".to_string()
}

fn default_email_path() -> String {
    "/send-email".to_string()
}

impl BillingConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: default_billing_timeout(),
            user_id: default_user_id(),
            api_key_env: None,
            email_path: default_email_path(),
        }
    }
}

// ============= Risk Configuration =============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Risk tier reported for a customer with no invoices
    #[serde(default)]
    pub empty_history: EmptyHistoryPolicy,
}

// ============= Tool Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Overrides the built-in description shown to agents
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default = "default_tool_timeout")]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_tool_timeout() -> u64 {
    60
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            description: None,
            timeout_secs: default_tool_timeout(),
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Configuration warnings that don't prevent operation but may indicate issues
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub kind: ConfigWarningKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarningKind {
    UnknownTool,
    AllToolsDisabled,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),
}

impl From<ConfigError> for crate::types::AppError {
    fn from(err: ConfigError) -> Self {
        crate::types::AppError::Config(err.to_string())
    }
}

impl PayPilotConfig {
    pub fn new(billing: BillingConfig) -> Self {
        Self {
            server: ServerConfig::default(),
            billing,
            risk: RiskConfig::default(),
            tools: HashMap::new(),
        }
    }

    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: PayPilotConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate URLs, timeouts and env var availability
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.billing.base_url).map_err(|e| {
            ConfigError::ValidationError(format!(
                "billing.base_url '{}' is not a valid URL: {}",
                self.billing.base_url, e
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::ValidationError(format!(
                "billing.base_url must use http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.billing.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "billing.timeout_secs must be greater than zero".to_string(),
            ));
        }

        if self.billing.user_id.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "billing.user_id must not be empty".to_string(),
            ));
        }

        for (name, tool) in &self.tools {
            if tool.timeout_secs == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "tools.{}.timeout_secs must be greater than zero",
                    name
                )));
            }
        }

        if let Some(ref env) = self.billing.api_key_env {
            self.validate_env_var(env)?;
        }

        Ok(())
    }

    /// Validate configuration with warnings for suspicious entries
    ///
    /// Returns Ok with warnings, or Err if validation fails
    pub fn validate_with_warnings(&self) -> Result<Vec<ConfigWarning>, ConfigError> {
        self.validate()?;

        let mut warnings = self.check_unknown_tools();

        if BILLING_TOOL_NAMES
            .iter()
            .all(|name| !self.is_tool_enabled(name))
        {
            warnings.push(ConfigWarning {
                kind: ConfigWarningKind::AllToolsDisabled,
                message: "Every billing tool is disabled".to_string(),
            });
        }

        Ok(warnings)
    }

    /// Check for `[tools.*]` sections that configure no existing tool
    fn check_unknown_tools(&self) -> Vec<ConfigWarning> {
        let mut unknown: Vec<&String> = self
            .tools
            .keys()
            .filter(|name| !BILLING_TOOL_NAMES.contains(&name.as_str()))
            .collect();
        unknown.sort();

        unknown
            .into_iter()
            .map(|name| ConfigWarning {
                kind: ConfigWarningKind::UnknownTool,
                message: format!("Tool '{}' is configured but does not exist", name),
            })
            .collect()
    }

    fn validate_env_var(&self, name: &str) -> Result<(), ConfigError> {
        std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))?;
        Ok(())
    }

    /// Get a resolved value from an env var reference
    pub fn resolve_env(&self, env_name: &str) -> Option<String> {
        std::env::var(env_name).ok()
    }

    /// Bearer token for the billing API, if one is configured
    pub fn billing_api_key(&self) -> Option<String> {
        self.billing
            .api_key_env
            .as_deref()
            .and_then(|env| self.resolve_env(env))
    }

    /// Settings for a tool, falling back to defaults when unconfigured
    pub fn tool(&self, name: &str) -> ToolConfig {
        self.tools.get(name).cloned().unwrap_or_default()
    }

    pub fn is_tool_enabled(&self, name: &str) -> bool {
        self.tools.get(name).map(|t| t.enabled).unwrap_or(true)
    }

    /// Names of enabled billing tools
    pub fn enabled_tools(&self) -> Vec<&'static str> {
        BILLING_TOOL_NAMES
            .iter()
            .copied()
            .filter(|name| self.is_tool_enabled(name))
            .collect()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
