//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout)
//! - Hand every products request to the resilience engine
//! - Expose health and breaker diagnostics
//! - Serve until the shutdown signal fires

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    response::Html,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::catalog::Product;
use crate::clock::{Clock, SystemClock};
use crate::config::GuardConfig;
use crate::error::Error;
use crate::http::request::{self, X_REQUEST_ID};
use crate::http::response::render_page;
use crate::resilience::{BreakerState, ResilienceOrchestrator, ResilienceResult, StaticFallback};
use crate::upstream::ProductClient;

/// The engine instance guarding the products API.
pub type ProductGuard = ResilienceOrchestrator<Vec<Product>, StaticFallback<Vec<Product>>>;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub guard: Arc<ProductGuard>,
    pub client: ProductClient,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Run one guarded products fetch.
    pub async fn fetch_products(&self) -> ResilienceResult<Vec<Product>> {
        self.guard
            .execute_async(self.clock.now(), || self.client.fetch_products())
            .await
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub circuit_breaker_state: BreakerState,
    pub circuit_breaker_failures: u32,
}

#[derive(Debug, Serialize)]
pub struct BreakerStatusResponse {
    pub state: BreakerState,
    pub failure_count: u32,
    pub last_failure_secs_ago: Option<f64>,
}

/// HTTP server for the storefront frontend.
pub struct HttpServer {
    router: Router,
    guard: Arc<ProductGuard>,
}

impl HttpServer {
    /// Create a server reading time from the system clock.
    pub fn new(config: GuardConfig) -> Result<Self, Error> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a server with an explicit time source.
    pub fn with_clock(config: GuardConfig, clock: Arc<dyn Clock>) -> Result<Self, Error> {
        let guard = Arc::new(ResilienceOrchestrator::new(
            config.breaker.settings(),
            config.cache.ttl(),
            StaticFallback::catalog(),
        ));
        let client = ProductClient::new(&config.upstream)?;

        tracing::info!(
            upstream = %client.url(),
            failure_threshold = config.breaker.failure_threshold,
            open_duration_secs = config.breaker.open_duration_secs,
            cache_ttl_secs = config.cache.ttl_secs,
            "Resilience engine initialized"
        );

        let state = AppState {
            guard: guard.clone(),
            client,
            clock,
        };
        let router = Self::build_router(&config, state);
        Ok(Self { router, guard })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GuardConfig, state: AppState) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(request::set_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request| {
                let request_id = req
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %req.method(),
                    path = %req.uri().path(),
                    request_id = %request_id,
                )
            }))
            .layer(request::propagate_request_id_layer())
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.listener.request_timeout_secs,
            )));

        Router::new()
            .route("/", get(index_handler))
            .route("/api/products", get(products_handler))
            .route("/health", get(health_handler))
            .route("/circuit-breaker/status", get(breaker_status_handler))
            .with_state(state)
            .layer(middleware)
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Shared handle to the engine, for diagnostics.
    pub fn guard(&self) -> Arc<ProductGuard> {
        self.guard.clone()
    }
}

fn log_result(headers: &HeaderMap, result: &ResilienceResult<Vec<Product>>) {
    tracing::info!(
        request_id = %request::request_id(headers),
        source = result.source().as_str(),
        state = %result.breaker.state,
        failures = result.breaker.consecutive_failures,
        products = result.payload().len(),
        "Served products"
    );
}

/// Storefront page.
async fn index_handler(State(state): State<AppState>, headers: HeaderMap) -> Html<String> {
    let result = state.fetch_products().await;
    log_result(&headers, &result);
    Html(render_page(&result))
}

/// Tagged result as JSON.
async fn products_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<ResilienceResult<Vec<Product>>> {
    let result = state.fetch_products().await;
    log_result(&headers, &result);
    Json(result)
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.guard.snapshot();
    Json(HealthResponse {
        status: "healthy",
        service: "storefront-guard",
        circuit_breaker_state: snapshot.state,
        circuit_breaker_failures: snapshot.consecutive_failures,
    })
}

async fn breaker_status_handler(State(state): State<AppState>) -> Json<BreakerStatusResponse> {
    let snapshot = state.guard.snapshot();
    let now = state.clock.now();
    Json(BreakerStatusResponse {
        state: snapshot.state,
        failure_count: snapshot.consecutive_failures,
        last_failure_secs_ago: snapshot
            .last_failure
            .map(|at| now.saturating_duration_since(at).as_secs_f64()),
    })
}
