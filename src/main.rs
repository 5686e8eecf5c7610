//! Transparent HTTP forwarder.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                 FORWARDER                     │
//!     Client Request   │  ┌──────────┐    ┌───────────┐    ┌────────┐ │
//!     ─────────────────┼─▶│   net    │───▶│   http    │───▶│ client │─┼──▶ Upstream
//!                      │  │ listener │    │  handler  │    │ (TLS   │ │    base URL
//!                      │  └──────────┘    └─────┬─────┘    │ unver.)│ │
//!     Client Response  │                        │          └────────┘ │
//!     ◀────────────────┼──── streamed body ◀────┤                     │
//!                      │                        ▼                     │
//!                      │                 ┌────────────┐               │
//!                      │                 │   audit    │ one record    │
//!                      │                 │   guard    │ per request   │
//!                      │                 └────────────┘               │
//!                      └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use http_forwarder::http::HttpServer;
use http_forwarder::lifecycle::{signals, startup, Shutdown};
use http_forwarder::net;
use http_forwarder::observability::logging;

#[derive(Parser)]
#[command(name = "http-forwarder")]
#[command(about = "Forward every request to one upstream and audit each exchange", long_about = None)]
struct Cli {
    /// Upstream base URL, e.g. http://remote.example.com
    #[arg(long = "baseurl")]
    base_url: Option<String>,

    /// Listen address, e.g. :8080
    #[arg(short = 'l', long)]
    listen: Option<String>,

    /// Optional TOML config file; flags take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_logging(logging::DEFAULT_DIRECTIVES);

    tracing::info!("http-forwarder v{} starting", env!("CARGO_PKG_VERSION"));

    let config = startup::resolve_config(cli.config.as_deref(), cli.base_url, cli.listen)
        .inspect_err(|e| tracing::error!(error = %e, "Invalid configuration"))?;

    let listener = net::bind(&config.listener.listen).await?;
    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
