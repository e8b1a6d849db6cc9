//! Metrics collection and exposition.
//!
//! # Metrics
//! - `guard_responses_total` (counter): responses by source (live, cached, fallback)
//! - `guard_circuit_state` (gauge): 0=closed, 1=open, 2=half_open
//! - `guard_circuit_failures` (gauge): consecutive failure count
//! - `guard_circuit_transitions_total` (counter): transitions by from/to
//! - `guard_upstream_requests_total` (counter): upstream calls by result
//! - `guard_upstream_duration_seconds` (histogram): upstream latency
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus
//! recorder, so the engine can be used and tested without an exporter.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

use crate::resilience::breaker::{BreakerSnapshot, BreakerState};
use crate::resilience::orchestrator::Source;

/// Install the Prometheus recorder and its HTTP scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

fn state_value(state: BreakerState) -> f64 {
    match state {
        BreakerState::Closed => 0.0,
        BreakerState::Open => 1.0,
        BreakerState::HalfOpen => 2.0,
    }
}

/// Count a response by the rung of the ladder that served it.
pub fn record_outcome(source: Source) {
    ::metrics::counter!("guard_responses_total", "source" => source.as_str()).increment(1);
}

/// Publish the breaker's current counters.
pub fn record_breaker(snapshot: &BreakerSnapshot) {
    ::metrics::gauge!("guard_circuit_state").set(state_value(snapshot.state));
    ::metrics::gauge!("guard_circuit_failures").set(snapshot.consecutive_failures as f64);
}

pub fn record_transition(from: BreakerState, to: BreakerState) {
    ::metrics::counter!(
        "guard_circuit_transitions_total",
        "from" => from.as_str(),
        "to" => to.as_str()
    )
    .increment(1);
    ::metrics::gauge!("guard_circuit_state").set(state_value(to));
}

/// Record an upstream call. `result` is "success", "status" or "transport".
pub fn record_upstream(result: &'static str, start_time: Instant) {
    ::metrics::counter!("guard_upstream_requests_total", "result" => result).increment(1);
    ::metrics::histogram!("guard_upstream_duration_seconds")
        .record(start_time.elapsed().as_secs_f64());
}
