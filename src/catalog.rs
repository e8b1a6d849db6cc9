//! Product catalog types shared by the upstream client, the demo backend and
//! the rendering layer.

use serde::{Deserialize, Serialize};

/// A single product record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u32,
    pub name: String,
    pub price: f64,
}

impl Product {
    pub fn new(id: u32, name: impl Into<String>, price: f64) -> Self {
        Self {
            id,
            name: name.into(),
            price,
        }
    }
}

/// Body of the upstream `/api/products` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductsResponse {
    #[serde(default)]
    pub status: Option<String>,
    pub products: Vec<Product>,
    #[serde(default)]
    pub source: Option<String>,
}

/// The catalog served by the demo backend.
pub fn backend_catalog() -> Vec<Product> {
    vec![
        Product::new(1, "Laptop", 999.99),
        Product::new(2, "Mouse", 29.99),
        Product::new(3, "Keyboard", 79.99),
        Product::new(4, "Monitor", 349.99),
    ]
}
