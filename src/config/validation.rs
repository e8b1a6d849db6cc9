//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds and durations > 0)
//! - Check that addresses and URLs parse
//! - Keep the upstream timeout inside the request timeout, so the engine
//!   always settles a call before the router gives up on the request
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: GuardConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::GuardConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("{field} is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("upstream.base_url is not a valid http(s) URL: {value} ({reason})")]
    InvalidUrl { value: String, reason: String },

    #[error("upstream.products_path must start with '/': {value}")]
    InvalidPath { value: String },

    #[error(
        "upstream.timeout_ms ({upstream_ms}) must be shorter than listener.request_timeout_secs ({request_secs}s)"
    )]
    UpstreamTimeoutTooLong { upstream_ms: u64, request_secs: u64 },
}

fn check_positive(errors: &mut Vec<ValidationError>, field: &'static str, value: u64) {
    if value == 0 {
        errors.push(ValidationError::NotPositive { field });
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

/// Check a parsed configuration, collecting every error.
pub fn validate_config(config: &GuardConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    check_positive(&mut errors, "listener.request_timeout_secs", config.listener.request_timeout_secs);

    match Url::parse(&config.upstream.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::InvalidUrl {
            value: config.upstream.base_url.clone(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => errors.push(ValidationError::InvalidUrl {
            value: config.upstream.base_url.clone(),
            reason: e.to_string(),
        }),
    }
    if !config.upstream.products_path.starts_with('/') {
        errors.push(ValidationError::InvalidPath {
            value: config.upstream.products_path.clone(),
        });
    }
    check_positive(&mut errors, "upstream.timeout_ms", config.upstream.timeout_ms);
    let request_secs = config.listener.request_timeout_secs;
    if request_secs > 0 && config.upstream.timeout_ms >= request_secs.saturating_mul(1000) {
        errors.push(ValidationError::UpstreamTimeoutTooLong {
            upstream_ms: config.upstream.timeout_ms,
            request_secs,
        });
    }

    check_positive(&mut errors, "breaker.failure_threshold", config.breaker.failure_threshold as u64);
    check_positive(&mut errors, "breaker.open_duration_secs", config.breaker.open_duration_secs);
    check_positive(&mut errors, "cache.ttl_secs", config.cache.ttl_secs);

    if config.observability.metrics_enabled {
        check_address(&mut errors, "observability.metrics_address", &config.observability.metrics_address);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
