//! Composes breaker, cache and fallback into the degradation ladder.
//!
//! ```text
//! execute(now, call)
//!     → breaker.allow_attempt(now)
//!         denied  → (skip call)                          ─┐
//!         allowed → call()                                │
//!             Ok  → report_success, cache.put → Live      │
//!             Err → report_failure(now)                  ─┤
//!                                                         ▼
//!                          cache.get(now, ttl) → Cached, else Fallback
//! ```
//!
//! `execute` never fails: every path ends in a payload.

use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};

use crate::observability::metrics;
use crate::resilience::breaker::{BreakerSettings, BreakerSnapshot, CircuitBreaker};
use crate::resilience::cache::ResultCache;
use crate::resilience::fallback::FallbackProvider;

/// Where a payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Live,
    Cached,
    Fallback,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Live => "live",
            Source::Cached => "cached",
            Source::Fallback => "fallback",
        }
    }
}

/// A payload tagged with the rung of the ladder that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Live(T),
    Cached(T),
    Fallback(T),
}

impl<T> Outcome<T> {
    pub fn source(&self) -> Source {
        match self {
            Outcome::Live(_) => Source::Live,
            Outcome::Cached(_) => Source::Cached,
            Outcome::Fallback(_) => Source::Fallback,
        }
    }

    pub fn payload(&self) -> &T {
        match self {
            Outcome::Live(p) | Outcome::Cached(p) | Outcome::Fallback(p) => p,
        }
    }

    pub fn into_payload(self) -> T {
        match self {
            Outcome::Live(p) | Outcome::Cached(p) | Outcome::Fallback(p) => p,
        }
    }
}

/// What `execute` hands back: the outcome plus breaker diagnostics taken
/// after the outcome was recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct ResilienceResult<T> {
    pub outcome: Outcome<T>,
    pub breaker: BreakerSnapshot,
}

impl<T> ResilienceResult<T> {
    pub fn source(&self) -> Source {
        self.outcome.source()
    }

    pub fn payload(&self) -> &T {
        self.outcome.payload()
    }
}

impl<T: Serialize> Serialize for ResilienceResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ResilienceResult", 3)?;
        state.serialize_field("source", &self.outcome.source())?;
        state.serialize_field("payload", self.outcome.payload())?;
        state.serialize_field("breaker", &self.breaker)?;
        state.end()
    }
}

/// The resilience decision engine for one guarded dependency.
pub struct ResilienceOrchestrator<T, F> {
    breaker: CircuitBreaker,
    cache: ResultCache<T>,
    fallback: F,
    cache_ttl: Duration,
}

impl<T, F> ResilienceOrchestrator<T, F>
where
    T: Clone,
    F: FallbackProvider<T>,
{
    pub fn new(settings: BreakerSettings, cache_ttl: Duration, fallback: F) -> Self {
        Self {
            breaker: CircuitBreaker::new(settings),
            cache: ResultCache::new(),
            fallback,
            cache_ttl,
        }
    }

    /// Run `call` under breaker protection and degrade to cache or fallback.
    pub fn execute<E, C>(&self, now: Instant, call: C) -> ResilienceResult<T>
    where
        E: Display,
        C: FnOnce() -> Result<T, E>,
    {
        let attempt = match self.breaker.allow_attempt(now) {
            Ok(()) => Some(call()),
            Err(rejection) => {
                tracing::debug!(reason = %rejection, "Attempt rejected, skipping upstream call");
                None
            }
        };
        self.settle(now, attempt)
    }

    /// Async twin of [`execute`](Self::execute). No lock is held while the
    /// call is pending.
    pub async fn execute_async<E, C, Fut>(&self, now: Instant, call: C) -> ResilienceResult<T>
    where
        E: Display,
        C: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let attempt = match self.breaker.allow_attempt(now) {
            Ok(()) => Some(call().await),
            Err(rejection) => {
                tracing::debug!(reason = %rejection, "Attempt rejected, skipping upstream call");
                None
            }
        };
        self.settle(now, attempt)
    }

    /// `attempt` is `None` when the breaker refused the call.
    fn settle<E: Display>(&self, now: Instant, attempt: Option<Result<T, E>>) -> ResilienceResult<T> {
        let outcome = match attempt {
            Some(Ok(payload)) => {
                self.breaker.report_success();
                self.cache.put(payload.clone(), now);
                Outcome::Live(payload)
            }
            Some(Err(error)) => {
                tracing::warn!(error = %error, "Upstream call failed");
                self.breaker.report_failure(now);
                self.degrade(now)
            }
            None => self.degrade(now),
        };

        let result = ResilienceResult {
            outcome,
            breaker: self.breaker.snapshot(),
        };
        metrics::record_outcome(result.source());
        result
    }

    fn degrade(&self, now: Instant) -> Outcome<T> {
        match self.cache.get(now, self.cache_ttl) {
            Some(payload) => Outcome::Cached(payload),
            None => Outcome::Fallback(self.fallback.fallback()),
        }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn cache(&self) -> &ResultCache<T> {
        &self.cache
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        self.breaker.snapshot()
    }
}
