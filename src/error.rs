//! Error types for storefront-guard.
//!
//! The resilience engine itself never errors; these cover the upstream call
//! (which the engine turns into degraded results) and process setup.

use thiserror::Error;

use crate::config::ConfigError;

/// Result type alias for setup operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure of a single upstream products request.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection refused, reset, or timed out.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The upstream answered with a non-success status.
    #[error("upstream returned status {0}")]
    Status(u16),

    /// The body was not a products document.
    #[error("invalid upstream body: {0}")]
    Decode(String),
}

/// Errors raised while starting or running the service.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to build upstream client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("metrics error: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("logging error: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),
}
