//! Configuration loading from disk and the environment.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::GuardConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Read and deserialize a TOML file without semantic checks.
///
/// Callers that layer environment overrides on top validate afterwards.
pub fn read_config(path: &Path) -> Result<GuardConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GuardConfig, ConfigError> {
    let config = read_config(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply `BACKEND_URL`, `FRONTEND_PORT` and `GUARD_LOG_LEVEL` from the
/// process environment.
pub fn apply_env_overrides(config: &mut GuardConfig) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// Apply overrides read through `lookup`.
pub fn apply_overrides_from<F>(config: &mut GuardConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("BACKEND_URL") {
        tracing::debug!(base_url = %url, "Upstream URL overridden from environment");
        config.upstream.base_url = url;
    }

    if let Some(port) = lookup("FRONTEND_PORT") {
        match port.trim().parse::<u16>() {
            Ok(port) => {
                let mut addr: SocketAddr = config
                    .listener
                    .bind_address
                    .parse()
                    .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], port)));
                addr.set_port(port);
                config.listener.bind_address = addr.to_string();
            }
            Err(_) => tracing::warn!(value = %port, "Ignoring invalid FRONTEND_PORT"),
        }
    }

    if let Some(level) = lookup("GUARD_LOG_LEVEL") {
        config.observability.log_level = level;
    }
}
