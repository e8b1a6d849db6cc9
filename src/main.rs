//! Storefront frontend with graceful degradation.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌───────────────────────────────────────────────────────┐
//!                  │                   STOREFRONT GUARD                     │
//!                  │                                                        │
//!   Client         │  ┌─────────┐    ┌──────────────────────────────────┐  │
//!   ───────────────┼─▶│  http   │───▶│       resilience engine          │  │
//!                  │  │ server  │    │  breaker → upstream call ────────┼──┼──▶ Products API
//!                  │  └─────────┘    │     ↓ failure / circuit open     │  │
//!                  │       ▲         │  cache (ttl) → static fallback   │  │
//!   ◀──────────────┼───────┘         └──────────────────────────────────┘  │
//!   Live / Cached  │                                                        │
//!   / Fallback     │  config · observability · lifecycle                    │
//!                  └───────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use storefront_guard::config::{self, GuardConfig};
use storefront_guard::lifecycle::{signals, startup, Shutdown};
use storefront_guard::observability::{logging, metrics};
use storefront_guard::HttpServer;

#[derive(Parser)]
#[command(name = "storefront-guard", version)]
#[command(about = "Storefront frontend protected by circuit breaker, cache and fallback")]
struct Args {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long, env = "GUARD_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => config::read_config(path)?,
        None => GuardConfig::default(),
    };
    config::apply_env_overrides(&mut config);
    config::validate_config(&config).map_err(config::ConfigError::Validation)?;

    logging::init_logging(&config.observability)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        timeout_ms = config.upstream.timeout_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let _pid_file = match &config.pid_file {
        Some(path) => Some(startup::write_pid_file(path)?),
        None => None,
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
