use anyhow::{Context, Result};
use clap::Parser;
use std::io::{stdout, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;

use greenchoice_cli::api::{HttpTransport, Transport};
use greenchoice_cli::utils::config::Config;
use greenchoice_cli::utils::logger::{default_log_path, init_global_logger};
use greenchoice_cli::App;

#[derive(Parser)]
#[command(name = "greenchoice")]
#[command(about = "GreenChoice - ask the sustainability assistant from your terminal", long_about = None)]
struct Cli {
    /// Backend endpoint, overrides the config file and GREENCHOICE_ENDPOINT
    #[arg(long)]
    endpoint: Option<String>,

    /// Path to the config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Show replies at once instead of typing them out
    #[arg(long)]
    no_animation: bool,

    /// Milliseconds between revealed characters
    #[arg(long)]
    speed: Option<u64>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    /// Check that the backend is reachable and exit
    #[arg(long)]
    check: bool,
}

impl Cli {
    fn apply_to(&self, config: &mut Config) {
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if self.no_animation {
            config.reveal.enabled = false;
        }
        if let Some(speed) = self.speed {
            config.reveal.char_interval_ms = speed;
        }
        if self.verbose {
            config.logging.level = "debug".to_string();
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::get_config_path);
    let mut config = Config::load_or_default(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    config.apply_env_overrides();
    cli.apply_to(&mut config);
    config.validate()?;

    if let Err(e) = init_global_logger(&default_log_path(), &config.logging.level) {
        eprintln!("⚠️ Logging disabled: {}", e);
    }
    tracing::info!(endpoint = %config.endpoint, "Starting GreenChoice");

    let transport = HttpTransport::new(&config.endpoint, config.request_timeout())?;

    if cli.check {
        match transport.health().await {
            Ok(message) => {
                println!("✓ {} is reachable: {}", config.endpoint, message);
                return Ok(());
            }
            Err(e) => {
                eprintln!("✗ {} is unreachable: {}", config.endpoint, e);
                std::process::exit(1);
            }
        }
    }

    if !stdout().is_terminal() {
        eprintln!("Error: GreenChoice requires an interactive terminal.");
        std::process::exit(1);
    }

    let mut app = App::new(config, Arc::new(transport))?;
    app.run().await?;

    println!("{}", console::style("Goodbye! 🌱").green());
    Ok(())
}
