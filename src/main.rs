//! Image edge cache.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request     ┌──────────────────────────────────────────────┐
//!     ───────────────────┼─▶ http server ──▶ method guard ──▶ asset    │
//!                        │   (request id,     (GET only)       server   │
//!                        │    tracing)                           │      │
//!                        │                        ┌──────────────┤      │
//!                        │                        ▼              ▼      │
//!                        │                   edge cache ◀──── origin ◀──┼──── Image CDN
//!                        │                  (background      client     │
//!     Client Response    │                    stores)                   │
//!     ◀──────────────────┼──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use image_edge_cache::config::{config_from_env, load_config};
use image_edge_cache::observability::{logging, metrics};
use image_edge_cache::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "image-edge-cache")]
#[command(about = "Caching reverse proxy in front of an image CDN", long_about = None)]
struct Cli {
    /// TOML configuration file. Without one, defaults plus CLOUD_NAME are used.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => config_from_env()?,
    };

    logging::init_logging(&config.observability);

    tracing::info!("image-edge-cache v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        origin = %config.origin.image_base(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    shutdown.trigger_on_signal();

    HttpServer::new(config).run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
