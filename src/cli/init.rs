//! Init command implementation
//!
//! Scaffolds `paypilot.toml` and `.env.example` in a directory.

use super::output::Output;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of the init operation
pub enum InitResult {
    /// Initialization completed successfully
    Success,
    /// Project already exists (paypilot.toml found)
    AlreadyExists,
    /// An error occurred during initialization
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: PathBuf,
    /// Overwrite existing files
    pub force: bool,
    /// Base URL of the billing API
    pub base_url: String,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.header("Initializing PayPilot");

    let base_path = &config.path;

    let config_path = base_path.join("paypilot.toml");
    if config_path.exists() && !config.force {
        output.warning("paypilot.toml already exists");
        output.info("use --force to overwrite it");
        return InitResult::AlreadyExists;
    }

    if !base_path.exists() {
        if let Err(e) = fs::create_dir_all(base_path) {
            output.error(&format!("Failed to create {}: {}", base_path.display(), e));
            return InitResult::Error(e.to_string());
        }
    }

    output.subheader("Creating configuration files");

    let toml_content = generate_paypilot_toml(&config);
    if let Err(e) = write_file(&config_path, &toml_content, config.force) {
        output.error(&format!("Failed to create paypilot.toml: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.wrote("config", "paypilot.toml");

    let env_example_path = base_path.join(".env.example");
    if env_example_path.exists() && !config.force {
        output.kept(".env.example", "already exists");
    } else if let Err(e) = write_file(&env_example_path, &generate_env_example(), config.force) {
        output.error(&format!("Failed to create .env.example: {}", e));
        return InitResult::Error(e.to_string());
    } else {
        output.wrote("environment template", ".env.example");
    }

    output.success("PayPilot initialized");

    output.header("Next steps");
    output.step(
        1,
        "If the billing API needs a bearer token, set it in .env:",
        &["cp .env.example .env"],
    );
    output.step(2, "Check the configuration:", &["paypilot config --validate"]);
    output.step(
        3,
        "Classify overdue invoices or start the server:",
        &["paypilot overdue", "paypilot serve"],
    );
    output.newline();
    output.info("the server publishes its OpenAPI document at /api-docs/openapi.json");

    InitResult::Success
}

fn write_file(path: &Path, content: &str, force: bool) -> std::io::Result<()> {
    if path.exists() && !force {
        return Ok(()); // Skip existing files unless force is true
    }
    fs::write(path, content)
}

fn generate_paypilot_toml(config: &InitConfig) -> String {
    format!(
        r#"# PayPilot Configuration
# ======================
# Generated by: paypilot init

# =============================================================================
# Server Configuration
# =============================================================================
[server]
host = "127.0.0.1"
port = 3000
log_level = "info"

# =============================================================================
# Billing API
# =============================================================================
[billing]
base_url = "{base_url}"
timeout_secs = 30
user_id = "agent-system"
email_path = "/send-email"
# Uncomment if the billing API requires a bearer token (set it in .env)
# api_key_env = "BILLING_API_KEY"

# =============================================================================
# Risk Policy
# =============================================================================
[risk]
# Customers with no invoices: "unrated" (no tier) or "high"
empty_history = "unrated"

# =============================================================================
# Tools
# =============================================================================
[tools.get_invoice_details]
enabled = true

[tools.list_all_invoices]
enabled = true

[tools.get_overdue_invoices]
enabled = true
timeout_secs = 60

[tools.get_customer_invoice_history]
enabled = true

[tools.update_invoice_status]
enabled = true

[tools.send_payment_reminder]
enabled = true

[tools.review_overdue_accounts]
enabled = true
"#,
        base_url = config.base_url
    )
}

fn generate_env_example() -> String {
    r#"# PayPilot Environment Variables
# ==============================
# Copy this file to .env and fill in the values.

# Optional: bearer token for the billing API (see billing.api_key_env)
# BILLING_API_KEY=your-token-here

# Optional: Logging level (trace, debug, info, warn, error)
RUST_LOG=info,paypilot=debug
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::toml_config::PayPilotConfig;
    use tempfile::TempDir;

    fn create_test_config(temp_dir: &TempDir, force: bool) -> InitConfig {
        InitConfig {
            path: temp_dir.path().to_path_buf(),
            force,
            base_url: "https://billing.example.com/dev".to_string(),
        }
    }

    #[test]
    fn test_generated_config_is_valid() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let content = generate_paypilot_toml(&create_test_config(&temp_dir, false));

        let config = PayPilotConfig::parse(&content).expect("generated config must parse");
        assert_eq!(config.billing.base_url, "https://billing.example.com/dev");
        assert!(config.validate_with_warnings().unwrap().is_empty());
    }

    #[test]
    fn test_generate_env_example() {
        let content = generate_env_example();
        assert!(content.contains("BILLING_API_KEY"));
        assert!(content.contains("RUST_LOG"));
    }

    #[test]
    fn test_write_file_skips_existing_without_force() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("file.txt");
        fs::write(&path, "original").unwrap();

        write_file(&path, "new content", false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "original");

        write_file(&path, "new content", true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new content");
    }

    #[test]
    fn test_run_creates_all_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let result = run(create_test_config(&temp_dir, false), &Output::no_color());

        assert!(matches!(result, InitResult::Success));
        assert!(temp_dir.path().join("paypilot.toml").exists());
        assert!(temp_dir.path().join(".env.example").exists());
    }

    #[test]
    fn test_run_already_exists_without_force() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(temp_dir.path().join("paypilot.toml"), "existing").unwrap();

        let result = run(create_test_config(&temp_dir, false), &Output::no_color());
        assert!(matches!(result, InitResult::AlreadyExists));
    }

    #[test]
    fn test_run_force_overwrites() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(temp_dir.path().join("paypilot.toml"), "existing").unwrap();

        let result = run(create_test_config(&temp_dir, true), &Output::no_color());
        assert!(matches!(result, InitResult::Success));

        let content = fs::read_to_string(temp_dir.path().join("paypilot.toml")).unwrap();
        assert!(content.contains("[billing]"));
        assert!(!content.contains("existing"));
    }
}
