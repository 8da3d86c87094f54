//! One-shot status check for a single entity.
//!
//! Useful for checking a checker configuration against the live service
//! before putting it in a config file.

use std::net::IpAddr;

use clap::{Parser, ValueEnum};

use siren::checker::build_checker;
use siren::client_pool::ClientDescriptor;
use siren::config::{CheckerConfig, ClientsConfig, MarkupConfig, ObservabilityConfig, RedirectConfig, RosterConfig};
use siren::model::EntityId;
use siren::observability::logging::init_logging;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    Roster,
    Redirect,
    Markup,
}

#[derive(Parser)]
#[command(name = "siren-check")]
#[command(about = "Check the status of a single entity", long_about = None)]
struct Cli {
    /// Entity id or profile URL.
    entity: String,

    #[arg(short, long, value_enum, default_value = "redirect")]
    kind: Kind,

    /// Roster endpoint, or profile URL template with `{id}`.
    #[arg(short, long)]
    url: String,

    /// Prerender service (markup checker only).
    #[arg(short, long, default_value = "http://localhost:3000/render")]
    renderer: String,

    /// JSON pointer to the roster array.
    #[arg(long, default_value = "")]
    models_pointer: String,

    /// JSON field holding "online"/"offline" (redirect checker only).
    #[arg(long)]
    status_field: Option<String>,

    /// Verbose output.
    #[arg(short, long)]
    verbose: bool,

    /// HTTP timeout in seconds.
    #[arg(short, long, default_value_t = 10)]
    timeout: u64,

    /// Source IP address.
    #[arg(short, long)]
    address: Option<IpAddr>,

    /// Use cookies.
    #[arg(short, long)]
    cookies: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&ObservabilityConfig {
        verbose: cli.verbose,
        ..ObservabilityConfig::default()
    });

    let clients = ClientsConfig {
        timeout_secs: cli.timeout,
        enable_cookies: cli.cookies,
        ..ClientsConfig::default()
    };
    let client = ClientDescriptor::new(cli.address, &clients)?;

    let checker_config = match cli.kind {
        Kind::Roster => CheckerConfig::Roster(RosterConfig {
            endpoints: vec![cli.url],
            models_pointer: cli.models_pointer,
            ..RosterConfig::default()
        }),
        Kind::Redirect => CheckerConfig::Redirect(RedirectConfig {
            profile_url: cli.url,
            status_field: cli.status_field,
        }),
        Kind::Markup => CheckerConfig::Markup(MarkupConfig {
            profile_url: cli.url,
            renderer_url: cli.renderer,
            timeout_secs: cli.timeout,
            ..MarkupConfig::default()
        }),
    };
    let checker = build_checker(&checker_config, cli.verbose);

    let entity = match EntityId::parse(&cli.entity) {
        Ok(entity) => entity,
        Err(e) => {
            eprintln!("invalid entity id: {}", e);
            std::process::exit(2);
        }
    };
    let status = checker.check_single(&client, &entity).await;
    println!("{} {}", entity, status);
    Ok(())
}
