//! HTML rendering of a resilience result.
//!
//! The page shows where the products came from (badge), a status message
//! carrying the breaker state, and the product list.

use std::fmt::Write;

use crate::catalog::Product;
use crate::resilience::{ResilienceResult, Source};

const STYLE: &str = "\
body { font-family: Arial; margin: 40px; background: #f5f5f5; }
.container { background: white; padding: 20px; border-radius: 8px; }
.warning { color: orange; border: 2px solid orange; padding: 10px; background: #fff3e0; }
.success { color: green; border: 2px solid green; padding: 10px; background: #e8f5e9; }
.info { color: blue; border: 2px solid blue; padding: 10px; background: #e3f2fd; }
.product { border: 1px solid #ddd; margin: 10px 0; padding: 10px; }
.badge { padding: 4px 8px; border-radius: 4px; font-size: 12px; }
.badge-live { background: #4caf50; color: white; }
.badge-cached { background: #ff9800; color: white; }
.badge-fallback { background: #2196f3; color: white; }";

/// Escape text for inclusion in HTML element content.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn badge(source: Source) -> &'static str {
    match source {
        Source::Live => r#"<span class="badge badge-live">LIVE DATA</span>"#,
        Source::Cached => r#"<span class="badge badge-cached">CACHED DATA</span>"#,
        Source::Fallback => r#"<span class="badge badge-fallback">FALLBACK DATA</span>"#,
    }
}

fn message(result: &ResilienceResult<Vec<Product>>) -> String {
    let state = result.breaker.state;
    match result.source() {
        Source::Live => r#"<div class="success">Backend is healthy and responding.</div>"#.to_string(),
        Source::Cached => format!(
            r#"<div class="warning">Backend is slow or unavailable. Showing cached data from earlier.<br>Circuit breaker state: {state}</div>"#
        ),
        Source::Fallback => format!(
            r#"<div class="info">Backend is temporarily unavailable. Showing default product catalog.<br>Circuit breaker state: {state}<br>Full functionality will resume when backend recovers.</div>"#
        ),
    }
}

/// Render the storefront page.
pub fn render_page(result: &ResilienceResult<Vec<Product>>) -> String {
    let mut products = String::new();
    for product in result.payload() {
        // Writing to a String cannot fail.
        let _ = write!(
            products,
            r#"<div class="product"><strong>{}</strong> - ${}</div>"#,
            escape_html(&product.name),
            product.price
        );
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<title>E-Commerce Store</title>\n<style>\n{STYLE}\n</style>\n</head>\n<body>\n<div class=\"container\">\n<h1>E-Commerce Store</h1>\n<h2>Products {badge}</h2>\n{message}\n{products}\n</div>\n</body>\n</html>\n",
        badge = badge(result.source()),
        message = message(result),
    )
}
