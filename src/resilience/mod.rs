//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Guarded call:
//!     → breaker.rs (may the call run at all?)
//!     → call succeeds: cache.rs stores the payload
//!     → call fails or is refused: cache.rs (fresh payload?)
//!     → fallback.rs (static default)
//! orchestrator.rs ties the three together and tags the result.
//! ```
//!
//! # Design Decisions
//! - The engine never returns an error; the caller always gets a payload
//! - Time is passed in, never read, so every decision is reproducible
//! - Timeouts belong to the guarded call, not to the engine

pub mod breaker;
pub mod cache;
pub mod fallback;
pub mod orchestrator;

pub use breaker::{BreakerSettings, BreakerSnapshot, BreakerState, CircuitBreaker, Rejection};
pub use cache::{CacheEntry, ResultCache};
pub use fallback::{default_catalog, FallbackProvider, StaticFallback};
pub use orchestrator::{Outcome, ResilienceOrchestrator, ResilienceResult, Source};
