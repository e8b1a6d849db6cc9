//! Demo products API with injectable latency.
//!
//! Stands in for the real backend during chaos experiments: raise
//! `--delay-ms` (or `BACKEND_DELAY`, in seconds) above the frontend's
//! upstream timeout to watch the frontend degrade to cached and then
//! fallback data.

use axum::{extract::State, routing::get, Json, Router};
use clap::Parser;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_guard::catalog::{backend_catalog, ProductsResponse};
use storefront_guard::lifecycle::{signals, startup, Shutdown};

#[derive(Parser)]
#[command(name = "demo-backend")]
#[command(about = "Products API used to exercise the storefront frontend")]
struct Args {
    /// Bind address.
    #[arg(long, default_value = "127.0.0.1:5001", env = "BACKEND_ADDR")]
    bind: String,

    /// Port to listen on, replacing the port of `--bind`.
    #[arg(long, env = "BACKEND_PORT")]
    port: Option<u16>,

    /// Artificial delay before each products response, in milliseconds.
    #[arg(long, env = "BACKEND_DELAY_MS")]
    delay_ms: Option<u64>,

    /// Artificial delay in seconds. Ignored when `--delay-ms` is set.
    #[arg(long, env = "BACKEND_DELAY", allow_negative_numbers = true)]
    delay_secs: Option<f64>,

    /// Write the process ID here.
    #[arg(long)]
    pid_file: Option<PathBuf>,
}

/// Listen address after applying `port`.
fn resolve_bind(bind: &str, port: Option<u16>) -> String {
    let Some(port) = port else {
        return bind.to_string();
    };
    let mut addr: SocketAddr = bind
        .parse()
        .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], port)));
    addr.set_port(port);
    addr.to_string()
}

/// Response delay, preferring milliseconds over fractional seconds.
fn resolve_delay(delay_ms: Option<u64>, delay_secs: Option<f64>) -> Duration {
    if let Some(ms) = delay_ms {
        return Duration::from_millis(ms);
    }
    match delay_secs {
        Some(secs) => Duration::try_from_secs_f64(secs).unwrap_or_else(|_| {
            tracing::warn!(value = secs, "Ignoring invalid BACKEND_DELAY");
            Duration::ZERO
        }),
        None => Duration::ZERO,
    }
}

#[derive(Clone)]
struct BackendState {
    delay: Duration,
}

async fn health(State(state): State<BackendState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "backend",
        "delay_configured": format!("{}s", state.delay.as_secs_f64()),
    }))
}

async fn products(State(state): State<BackendState>) -> Json<ProductsResponse> {
    if !state.delay.is_zero() {
        tracing::info!(delay_ms = state.delay.as_millis() as u64, "Sleeping before response (chaos injection)");
        tokio::time::sleep(state.delay).await;
    }
    Json(ProductsResponse {
        status: Some("success".to_string()),
        products: backend_catalog(),
        source: Some("backend-database".to_string()),
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "demo_backend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let _pid_file = match &args.pid_file {
        Some(path) => Some(startup::write_pid_file(path)?),
        None => None,
    };

    let delay = resolve_delay(args.delay_ms, args.delay_secs);
    let state = BackendState { delay };
    let app = Router::new()
        .route("/health", get(health))
        .route("/api/products", get(products))
        .with_state(state);

    let listener = TcpListener::bind(resolve_bind(&args.bind, args.port)).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        delay_ms = delay.as_millis() as u64,
        "Demo backend listening"
    );

    let shutdown = Shutdown::new();
    let mut stop = shutdown.subscribe();
    tokio::spawn(signals::shutdown_on_signal(shutdown));

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = stop.recv().await;
        })
        .await?;
    Ok(())
}
