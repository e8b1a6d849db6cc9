//! Static fallback data, the last rung of the degradation ladder.

use crate::catalog::Product;

/// Supplies a payload when neither a live call nor the cache can.
pub trait FallbackProvider<T>: Send + Sync {
    fn fallback(&self) -> T;
}

/// Always returns a clone of the same value.
#[derive(Debug, Clone)]
pub struct StaticFallback<T> {
    value: T,
}

impl<T> StaticFallback<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }
}

impl<T: Clone + Send + Sync> FallbackProvider<T> for StaticFallback<T> {
    fn fallback(&self) -> T {
        self.value.clone()
    }
}

impl StaticFallback<Vec<Product>> {
    /// Fallback holding [`default_catalog`].
    pub fn catalog() -> Self {
        Self::new(default_catalog())
    }
}

/// Default catalog shown while the upstream is unavailable and nothing is cached.
pub fn default_catalog() -> Vec<Product> {
    vec![
        Product::new(0, "Laptop (cached)", 999.99),
        Product::new(0, "Mouse (cached)", 29.99),
        Product::new(0, "Keyboard (cached)", 79.99),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_fallback_is_constant() {
        let provider = StaticFallback::catalog();
        let first = provider.fallback();
        let second = provider.fallback();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        assert!(first.iter().all(|p| p.id == 0));
        assert_eq!(first[1].name, "Mouse (cached)");
    }
}
