//! Circuit breaker guarding the upstream call.
//!
//! # States
//! - Closed: normal operation, attempts pass through
//! - Open: upstream assumed down, attempts fail fast
//! - Half-Open: probing whether the upstream recovered
//!
//! # State Transitions
//! ```text
//! Closed    → Open:      consecutive_failures >= failure_threshold
//! Open      → Half-Open: next attempt after open_duration has elapsed
//! Half-Open → Closed:    any success
//! Half-Open → Half-Open: failure while consecutive_failures < failure_threshold
//! Half-Open → Open:      failure once consecutive_failures >= failure_threshold
//! ```
//!
//! # Design Decisions
//! - One breaker per guarded dependency, owned by the orchestrator
//! - Open → Half-Open is evaluated lazily when an attempt is requested
//! - The failure counter survives the move to Half-Open, so reopening is
//!   gated by the threshold rather than by the first failed probe
//! - Half-Open admits every concurrent caller; there is no single-probe gate
//! - `last_failure` only moves forward: a slow failure reported with an
//!   earlier timestamp never shortens the open window

use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::observability::metrics;

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl BreakerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakerState::Closed => "closed",
            BreakerState::Open => "open",
            BreakerState::HalfOpen => "half_open",
        }
    }
}

impl fmt::Display for BreakerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reason an attempt was refused before the call ran.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("circuit open")]
    CircuitOpen {
        /// Time left until a probe will be admitted.
        retry_in: Duration,
    },
}

/// Fixed thresholds, set once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerSettings {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,
    /// How long the circuit stays open before a probe is admitted.
    pub open_duration: Duration,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            open_duration: Duration::from_secs(30),
        }
    }
}

/// Point-in-time copy of the breaker's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BreakerSnapshot {
    pub state: BreakerState,
    pub consecutive_failures: u32,
    #[serde(skip)]
    pub last_failure: Option<Instant>,
}

struct BreakerInner {
    state: BreakerState,
    consecutive_failures: u32,
    last_failure: Option<Instant>,
}

impl BreakerInner {
    fn transition(&mut self, to: BreakerState) {
        if self.state == to {
            return;
        }
        let from = self.state;
        self.state = to;
        match to {
            BreakerState::Open => tracing::warn!(
                from = %from,
                failures = self.consecutive_failures,
                "Circuit breaker opened"
            ),
            BreakerState::HalfOpen => tracing::info!(
                from = %from,
                failures = self.consecutive_failures,
                "Circuit breaker half-open, admitting probe"
            ),
            BreakerState::Closed => tracing::info!(from = %from, "Circuit breaker closed, upstream recovered"),
        }
        metrics::record_transition(from, to);
    }

    fn snapshot(&self) -> BreakerSnapshot {
        BreakerSnapshot {
            state: self.state,
            consecutive_failures: self.consecutive_failures,
            last_failure: self.last_failure,
        }
    }
}

/// Consecutive-failure circuit breaker.
pub struct CircuitBreaker {
    settings: BreakerSettings,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    /// Create a closed breaker with zero failures.
    pub fn new(settings: BreakerSettings) -> Self {
        Self {
            settings,
            inner: Mutex::new(BreakerInner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                last_failure: None,
            }),
        }
    }

    pub fn settings(&self) -> BreakerSettings {
        self.settings
    }

    /// Decide whether an attempt may run at `now`.
    ///
    /// An open breaker whose `open_duration` has strictly elapsed since the
    /// last failure moves to half-open and admits the attempt.
    pub fn allow_attempt(&self, now: Instant) -> Result<(), Rejection> {
        let mut inner = self.inner.lock();
        match inner.state {
            BreakerState::Closed | BreakerState::HalfOpen => Ok(()),
            BreakerState::Open => {
                let elapsed = inner
                    .last_failure
                    .map(|at| now.saturating_duration_since(at))
                    .unwrap_or(Duration::MAX);
                if elapsed > self.settings.open_duration {
                    inner.transition(BreakerState::HalfOpen);
                    Ok(())
                } else {
                    Err(Rejection::CircuitOpen {
                        retry_in: self.settings.open_duration - elapsed,
                    })
                }
            }
        }
    }

    /// Record a successful call: clears failures and closes the circuit.
    pub fn report_success(&self) {
        let mut inner = self.inner.lock();
        inner.consecutive_failures = 0;
        inner.transition(BreakerState::Closed);
        metrics::record_breaker(&inner.snapshot());
    }

    /// Record a failed call observed at `now`.
    ///
    /// The stored failure time is the later of `now` and the one already
    /// recorded.
    pub fn report_failure(&self, now: Instant) {
        let mut inner = self.inner.lock();
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
        inner.last_failure = Some(inner.last_failure.map_or(now, |prev| prev.max(now)));
        if inner.consecutive_failures >= self.settings.failure_threshold {
            inner.transition(BreakerState::Open);
        }
        metrics::record_breaker(&inner.snapshot());
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        self.inner.lock().snapshot()
    }

    pub fn state(&self) -> BreakerState {
        self.inner.lock().state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.inner.lock().consecutive_failures
    }
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("CircuitBreaker")
            .field("settings", &self.settings)
            .field("state", &snapshot.state)
            .field("consecutive_failures", &snapshot.consecutive_failures)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(threshold: u32, open_secs: u64) -> CircuitBreaker {
        CircuitBreaker::new(BreakerSettings {
            failure_threshold: threshold,
            open_duration: Duration::from_secs(open_secs),
        })
    }

    #[test]
    fn test_starts_closed_and_allows() {
        let cb = breaker(3, 30);
        let t0 = Instant::now();
        assert_eq!(cb.state(), BreakerState::Closed);
        assert_eq!(cb.consecutive_failures(), 0);
        assert!(cb.allow_attempt(t0).is_ok());
    }

    #[test]
    fn test_threshold_opens_circuit() {
        let cb = breaker(3, 30);
        let t0 = Instant::now();

        cb.report_failure(t0);
        cb.report_failure(t0);
        assert_eq!(cb.state(), BreakerState::Closed, "threshold - 1 failures keep it closed");

        cb.report_failure(t0);
        assert_eq!(cb.state(), BreakerState::Open);
        assert_eq!(cb.consecutive_failures(), 3);
    }

    #[test]
    fn test_fails_fast_while_open() {
        let cb = breaker(3, 30);
        let t0 = Instant::now();
        for _ in 0..3 {
            cb.report_failure(t0);
        }

        let rejection = cb.allow_attempt(t0 + Duration::from_secs(10)).unwrap_err();
        assert_eq!(rejection, Rejection::CircuitOpen { retry_in: Duration::from_secs(20) });
        assert_eq!(rejection.to_string(), "circuit open");

        // Exactly open_duration is still inside the window.
        assert!(cb.allow_attempt(t0 + Duration::from_secs(30)).is_err());
        assert_eq!(cb.state(), BreakerState::Open);
    }

    #[test]
    fn test_half_open_after_open_duration() {
        let cb = breaker(3, 30);
        let t0 = Instant::now();
        for _ in 0..3 {
            cb.report_failure(t0);
        }

        let later = t0 + Duration::from_secs(30) + Duration::from_millis(1);
        assert!(cb.allow_attempt(later).is_ok());
        assert_eq!(cb.state(), BreakerState::HalfOpen);
        // Half-open keeps admitting callers.
        assert!(cb.allow_attempt(later).is_ok());
        assert!(cb.allow_attempt(later).is_ok());
        assert_eq!(cb.consecutive_failures(), 3, "entering half-open keeps the counter");
    }

    #[test]
    fn test_success_in_half_open_recovers() {
        let cb = breaker(3, 30);
        let t0 = Instant::now();
        for _ in 0..3 {
            cb.report_failure(t0);
        }
        assert!(cb.allow_attempt(t0 + Duration::from_secs(31)).is_ok());

        cb.report_success();
        assert_eq!(cb.state(), BreakerState::Closed);
        assert_eq!(cb.consecutive_failures(), 0);
    }

    #[test]
    fn test_half_open_failure_at_threshold_reopens() {
        let cb = breaker(5, 30);
        let t0 = Instant::now();
        for _ in 0..5 {
            cb.report_failure(t0);
        }
        assert!(cb.allow_attempt(t0 + Duration::from_secs(31)).is_ok());
        assert_eq!(cb.state(), BreakerState::HalfOpen);

        // Counter is already at threshold, so the next failure reopens.
        cb.report_failure(t0 + Duration::from_secs(31));
        assert_eq!(cb.state(), BreakerState::Open);
        assert_eq!(cb.consecutive_failures(), 6);
    }

    #[test]
    fn test_half_open_sub_threshold_failure_keeps_half_open() {
        let cb = breaker(3, 30);
        let t0 = Instant::now();
        for _ in 0..3 {
            cb.report_failure(t0);
        }
        assert!(cb.allow_attempt(t0 + Duration::from_secs(31)).is_ok());

        // Put the counter below threshold while staying half-open.
        {
            let mut inner = cb.inner.lock();
            inner.consecutive_failures = 0;
        }
        cb.report_failure(t0 + Duration::from_secs(32));
        assert_eq!(cb.state(), BreakerState::HalfOpen, "sub-threshold failure must not reopen");
        assert_eq!(cb.consecutive_failures(), 1);

        cb.report_failure(t0 + Duration::from_secs(33));
        assert_eq!(cb.state(), BreakerState::HalfOpen);

        cb.report_failure(t0 + Duration::from_secs(34));
        assert_eq!(cb.state(), BreakerState::Open);
    }

    #[test]
    fn test_reopened_circuit_waits_from_latest_failure() {
        let cb = breaker(1, 30);
        let t0 = Instant::now();
        cb.report_failure(t0);
        assert!(cb.allow_attempt(t0 + Duration::from_secs(31)).is_ok());

        cb.report_failure(t0 + Duration::from_secs(31));
        assert_eq!(cb.state(), BreakerState::Open);
        assert!(cb.allow_attempt(t0 + Duration::from_secs(45)).is_err());
        assert!(cb.allow_attempt(t0 + Duration::from_secs(62)).is_ok());
    }

    #[test]
    fn test_late_failure_does_not_rewind_window() {
        let cb = breaker(2, 30);
        let t0 = Instant::now();
        cb.report_failure(t0 + Duration::from_secs(10));
        // A slow call that started earlier finishes afterwards.
        cb.report_failure(t0);
        assert_eq!(cb.state(), BreakerState::Open);
        assert_eq!(cb.snapshot().last_failure, Some(t0 + Duration::from_secs(10)));

        assert!(cb.allow_attempt(t0 + Duration::from_secs(31)).is_err());
        assert!(cb.allow_attempt(t0 + Duration::from_secs(41)).is_ok());
    }

    #[test]
    fn test_success_resets_counter_in_closed() {
        let cb = breaker(3, 30);
        let t0 = Instant::now();
        cb.report_failure(t0);
        cb.report_failure(t0);
        cb.report_success();
        cb.report_failure(t0);
        cb.report_failure(t0);
        assert_eq!(cb.state(), BreakerState::Closed);
        assert_eq!(cb.consecutive_failures(), 2);
    }

    #[test]
    fn test_state_names() {
        assert_eq!(BreakerState::Closed.to_string(), "closed");
        assert_eq!(BreakerState::Open.to_string(), "open");
        assert_eq!(BreakerState::HalfOpen.to_string(), "half_open");
        assert_eq!(serde_json::to_string(&BreakerState::HalfOpen).unwrap(), "\"half_open\"");
    }
}
