//! Subcommand dispatch and result rendering.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::init::{self, InitConfig, InitResult};
use super::output::Output;
use super::{Cli, Commands, InvoiceCommands, ToolCommands};
use crate::api::routes::build_app;
use crate::billing::BillingService;
use crate::tools::registry::ToolRegistry;
use crate::types::{AppError, Result};
use crate::utils::toml_config::PayPilotConfig;
use crate::AppState;

/// Execute the parsed command line.
pub async fn run(cli: Cli, output: &Output) -> Result<()> {
    match &cli.command {
        Commands::Init {
            path,
            force,
            base_url,
        } => {
            let config = InitConfig {
                path: path.clone(),
                force: *force,
                base_url: base_url.clone(),
            };
            match init::run(config, output) {
                InitResult::Success | InitResult::AlreadyExists => Ok(()),
                InitResult::Error(e) => Err(AppError::Internal(e)),
            }
        }
        Commands::Serve => serve(load_config(&cli)?).await,
        Commands::Config { validate } => show_config(&load_config(&cli)?, *validate, output),
        command => {
            let config = load_config(&cli)?;
            let billing = BillingService::from_config(&config)?;
            run_query(command, &config, billing, cli.json, output).await
        }
    }
}

fn load_config(cli: &Cli) -> Result<PayPilotConfig> {
    PayPilotConfig::load(&cli.config).map_err(AppError::from)
}

async fn serve(config: PayPilotConfig) -> Result<()> {
    let addr = config.bind_address();
    let state = AppState::from_config(config)?;
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!(address = %addr, "PayPilot server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))
}

fn show_config(config: &PayPilotConfig, validate: bool, output: &Output) -> Result<()> {
    output.header("Configuration");
    output.kv("server", &config.bind_address());
    output.kv("log level", &config.server.log_level);
    output.kv("billing API", &config.billing.base_url);
    output.kv("timeout", &format!("{}s", config.billing.timeout_secs));
    output.kv("user id", &config.billing.user_id);
    output.kv(
        "api key env",
        config.billing.api_key_env.as_deref().unwrap_or("(none)"),
    );
    output.kv(
        "empty history",
        &format!("{:?}", config.risk.empty_history).to_lowercase(),
    );

    output.subheader("Enabled tools");
    for name in config.enabled_tools() {
        output.list_item(name);
    }

    if validate {
        let warnings = config.validate_with_warnings()?;
        output.newline();
        if warnings.is_empty() {
            output.success("Configuration is valid");
        } else {
            for warning in &warnings {
                output.warning(&warning.to_string());
            }
            output.success(&format!("Configuration is valid ({} warnings)", warnings.len()));
        }
    }

    Ok(())
}

async fn run_query(
    command: &Commands,
    config: &PayPilotConfig,
    billing: BillingService,
    json: bool,
    output: &Output,
) -> Result<()> {
    match command {
        Commands::Invoice(InvoiceCommands::Show { invoice_id }) => {
            let invoice = billing.get_invoice_details(invoice_id).await?;
            emit(json, &invoice, || {
                output.invoice(&invoice);
                Ok(())
            })
        }
        Commands::Invoice(InvoiceCommands::List { status }) => {
            let invoices = billing.list_all_invoices(status.as_deref()).await?;
            emit(json, &invoices, || {
                output.header(&format!("Invoices ({})", invoices.len()));
                output.invoice_table(&invoices);
                Ok(())
            })
        }
        Commands::Overdue => {
            let summary = billing.get_overdue_invoices().await?;
            emit(json, &summary, || output.overdue_summary(&summary))
        }
        Commands::Customer { customer_id } => {
            let profile = billing.get_customer_history(customer_id).await?;
            emit(json, &profile, || {
                output.customer_profile(&profile);
                Ok(())
            })
        }
        Commands::Review => {
            let review = billing.review_overdue_accounts().await?;
            emit(json, &review, || {
                output.collections_review(&review);
                Ok(())
            })
        }
        Commands::Tools(ToolCommands::List) => {
            let registry = ToolRegistry::with_billing_tools(Arc::new(billing), config);
            let definitions = registry.get_tool_definitions();
            emit(json, &definitions, || {
                output.header("Tools");
                for def in &definitions {
                    output.kv(&def.name, &def.description);
                }
                Ok(())
            })
        }
        Commands::Tools(ToolCommands::Call { name, args }) => {
            let args: Value = match args {
                Some(raw) => serde_json::from_str(raw).map_err(|e| {
                    AppError::Validation(format!("--args is not valid JSON: {}", e))
                })?,
                None => Value::Null,
            };
            let registry = ToolRegistry::with_billing_tools(Arc::new(billing), config);
            let envelope = registry.execute(name, args).await?;
            print_json(&envelope)?;

            if envelope["success"] == Value::Bool(true) {
                Ok(())
            } else {
                Err(AppError::Internal(format!(
                    "tool '{}' failed ({})",
                    name,
                    envelope["error_kind"].as_str().unwrap_or("unknown")
                )))
            }
        }
        Commands::Init { .. } | Commands::Serve | Commands::Config { .. } => Ok(()),
    }
}

fn emit<T: Serialize>(json: bool, value: &T, human: impl FnOnce() -> Result<()>) -> Result<()> {
    if json {
        print_json(value)
    } else {
        human()
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).map_err(|e| AppError::Internal(e.to_string()))?;
    println!("{}", text);
    Ok(())
}
