//! onion-dispatch demo server.
//!
//! Loads configuration, initializes logging and metrics, registers the demo
//! routes and serves until Ctrl+C or SIGTERM.

use std::path::PathBuf;

use clap::Parser;

use onion_dispatch::config::{load_config, ServerConfig};
use onion_dispatch::observability::{logging, metrics};
use onion_dispatch::{demo, Server};

#[derive(Parser, Debug)]
#[command(name = "onion-dispatch", version, about = "Minimal HTTP dispatcher demo")]
struct Cli {
    /// Path to a TOML config file; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability);
    tracing::info!("onion-dispatch v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_in_flight = config.listener.max_in_flight,
        request_timeout_secs = config.listener.request_timeout_secs,
        auth_enabled = config.auth.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let address = config.listener.bind_address.clone();
    let mut server = Server::new(config);
    demo::register(&mut server)?;
    server.run(&address).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
