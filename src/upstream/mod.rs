//! Upstream subsystem: the guarded dependency.
//!
//! # Data Flow
//! ```text
//! http handler
//!     → orchestrator.execute_async(now, || client.fetch_products())
//!     → client.rs (GET with timeout, status check, decode)
//! ```

pub mod client;

pub use client::ProductClient;
