//! Siren monitor daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │                              SIREN                               │
//!   │                                                                  │
//!   │  ┌───────────┐   ┌─────────────┐   ┌───────────┐                 │
//!   │  │ scheduler │──▶│   checker   │──▶│ pipeline  │──▶ notifier ────┼──▶ subscribers
//!   │  │ tick+queue│   │ + client    │   │ transition│                 │
//!   │  └─────┬─────┘   │   pool      │   │ + health  │──▶ admin alert ─┼──▶ admin
//!   │        │         └──────┬──────┘   └─────┬─────┘                 │
//!   │        ▼                │                ▼                       │
//!   │   watch-list ◀──────────┼────────── status store                 │
//!   │                         ▼                                        │
//!   │                  upstream service                                │
//!   │                                                                  │
//!   │  config (toml + hot reload) · observability · lifecycle          │
//!   └──────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use siren::config::load_config;
use siren::lifecycle;
use siren::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "siren")]
#[command(about = "Polls a streaming service and notifies subscribers about status changes", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(default_value = "siren.toml")]
    config: PathBuf,

    /// Verbose logging (overrides the config file).
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)?;
    config.observability.verbose |= cli.verbose;
    init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        subscriptions = config.subscriptions.len(),
        "siren starting"
    );

    lifecycle::run(config, Some(cli.config)).await?;
    Ok(())
}
