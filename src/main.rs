//! Prerender gateway.
//!
//! A reverse proxy in front of a client-rendered application that answers
//! crawlers with rendered HTML snapshots.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ http server ──▶ prerender layer ──┬──▶ snapshot cache ──▶ Client
//!                                     │            │
//!                                     │            ├──▶ renderer (crawlers, sync)
//!                                     │            │
//!                                     │            └──▶ job workers (visitors, async)
//!                                     ▼
//!                               live application
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use prerender_gateway::config::{load_config, GatewayConfig};
use prerender_gateway::lifecycle::signals::spawn_signal_listener;
use prerender_gateway::lifecycle::startup::build_gateway;
use prerender_gateway::lifecycle::Shutdown;
use prerender_gateway::observability::{logging, metrics};

const WORKER_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "prerender-gateway")]
#[command(about = "Serves prerendered HTML snapshots to crawlers", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Defaults are used when omitted.
    #[arg(short, long, env = "PRERENDER_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "prerender-gateway starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let gateway = build_gateway(&config, &shutdown)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    spawn_signal_listener(shutdown.clone());
    gateway.server.run(listener, shutdown.subscribe()).await?;

    // The server may also stop on its own; make sure workers see the signal.
    shutdown.trigger();
    let drain = futures_util::future::join_all(gateway.workers);
    if tokio::time::timeout(WORKER_DRAIN_TIMEOUT, drain).await.is_err() {
        tracing::warn!("Job workers did not stop in time");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
