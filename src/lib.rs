//! Storefront frontend guarded by a circuit breaker, a TTL result cache and a
//! static fallback catalog.

pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod upstream;

pub use config::GuardConfig;
pub use error::{Error, FetchError, Result};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use resilience::{Outcome, ResilienceOrchestrator, ResilienceResult, Source};
