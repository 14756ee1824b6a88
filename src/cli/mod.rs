//! CLI module for PayPilot
//!
//! Provides command-line interface parsing and handling for the paypilot binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod commands;
pub mod init;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// PayPilot - invoice overdue and customer risk analytics
///
/// Reads invoices from a billing REST API, classifies overdue exposure and
/// scores customer payment reliability.
#[derive(Parser, Debug)]
#[command(
    name = "paypilot",
    author = "PayPilot <build@paypilot.dev>",
    version,
    about = "PayPilot - invoice overdue and customer risk analytics",
    long_about = "Reads invoices from a billing REST API, buckets overdue invoices by urgency,\n\
                  scores customer payment risk and exposes it all as agent tools, a REST API\n\
                  and this command line.",
    after_help = "EXAMPLES:\n    \
                  paypilot init --base-url https://billing.example.com/dev\n    \
                  paypilot overdue                  # Overdue invoices by urgency\n    \
                  paypilot customer CUST-1          # Payment history and risk level\n    \
                  paypilot --json review            # Collections review as JSON\n    \
                  paypilot serve                    # Start the REST server"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "paypilot.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Print results as JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the REST server
    Serve,

    /// Create paypilot.toml and .env.example
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files
        #[arg(short, long)]
        force: bool,

        /// Base URL of the billing API
        #[arg(long, default_value = "http://localhost:4000")]
        base_url: String,
    },

    /// Show configuration information
    Config {
        /// Validate the configuration file and report warnings
        #[arg(long)]
        validate: bool,
    },

    /// Look up invoices
    #[command(subcommand)]
    Invoice(InvoiceCommands),

    /// Overdue invoices grouped by urgency
    Overdue,

    /// Payment history and risk level for a customer
    Customer {
        /// Customer identifier
        customer_id: String,
    },

    /// Recommended collection action for every overdue invoice
    Review,

    /// List or call agent tools
    #[command(subcommand)]
    Tools(ToolCommands),
}

/// Invoice subcommands
#[derive(Subcommand, Debug)]
pub enum InvoiceCommands {
    /// Show one invoice
    Show {
        /// Invoice identifier
        invoice_id: String,
    },

    /// List invoices
    List {
        /// Only list invoices with this status (sent, paid)
        #[arg(short, long)]
        status: Option<String>,
    },
}

/// Tool subcommands
#[derive(Subcommand, Debug)]
pub enum ToolCommands {
    /// List registered tools
    List,

    /// Call a tool and print its result envelope
    Call {
        /// Tool name
        name: String,

        /// Arguments as a JSON object
        #[arg(short, long)]
        args: Option<String>,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
