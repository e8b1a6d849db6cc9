//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, then environment overrides)
//!     → validation.rs (semantic checks, run once on the merged result)
//!     → GuardConfig (validated, immutable)
//!     → thresholds handed to the resilience engine once at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no runtime reconfiguration
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env_overrides, load_config, read_config, ConfigError};
pub use schema::{
    BreakerConfig, CacheConfig, GuardConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    UpstreamConfig,
};
pub use validation::{validate_config, ValidationError};
