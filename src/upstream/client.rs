//! HTTP client for the products API.
//!
//! # Design Decisions
//! - The request timeout lives here; the resilience engine owns none
//! - Any non-2xx status is a failure, like a transport error
//! - No retries: repeated failures are the breaker's business

use std::time::Instant;

use crate::catalog::{Product, ProductsResponse};
use crate::config::UpstreamConfig;
use crate::error::{Error, FetchError};
use crate::observability::metrics;

/// Fetches the product catalog from the upstream backend.
#[derive(Debug, Clone)]
pub struct ProductClient {
    http: reqwest::Client,
    url: String,
}

impl ProductClient {
    /// Build a client whose every request is bounded by `config.timeout_ms`.
    pub fn new(config: &UpstreamConfig) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .no_proxy()
            .build()
            .map_err(Error::Client)?;
        Ok(Self {
            http,
            url: config.products_url(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// GET the products endpoint and decode its `products` array.
    pub async fn fetch_products(&self) -> Result<Vec<Product>, FetchError> {
        let start_time = Instant::now();

        let response = match self.http.get(&self.url).send().await {
            Ok(response) => response,
            Err(e) => {
                metrics::record_upstream("transport", start_time);
                return Err(FetchError::Transport(e));
            }
        };

        let status = response.status();
        if !status.is_success() {
            metrics::record_upstream("status", start_time);
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                metrics::record_upstream("transport", start_time);
                return Err(FetchError::Transport(e));
            }
        };
        let parsed: ProductsResponse = serde_json::from_slice(&body).map_err(|e| {
            metrics::record_upstream("decode", start_time);
            FetchError::Decode(e.to_string())
        })?;

        metrics::record_upstream("success", start_time);
        tracing::debug!(
            url = %self.url,
            products = parsed.products.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Fetched products from upstream"
        );
        Ok(parsed.products)
    }
}
