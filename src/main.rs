use owo_colors::OwoColorize;
use paypilot::cli::{commands, output::Output, Cli};
use paypilot::PayPilotConfig;
use std::process::exit;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    // .env is optional; a missing file is not an error
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    init_tracing(&cli);

    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    commands::run(cli, &output).await?;
    Ok(())
}

/// `RUST_LOG` wins, then `--verbose`, then `[server].log_level` from the config file.
fn init_tracing(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if cli.verbose {
            "debug".to_string()
        } else {
            PayPilotConfig::load(&cli.config)
                .map(|config| config.server.log_level)
                .unwrap_or_else(|_| "warn".to_string())
        };
        EnvFilter::new(format!("warn,paypilot={}", level))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    // Subsequent initialisation attempts are no-ops
    if cli.log_json {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.try_init();
    }
}
