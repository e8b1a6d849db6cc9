//! End-to-end degradation tests: a real frontend in front of a mock backend.

use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use storefront_guard::clock::ManualClock;
use storefront_guard::resilience::BreakerState;

mod common;

async fn get_json(client: &reqwest::Client, url: String) -> Value {
    let res = client.get(url).send().await.expect("frontend unreachable");
    assert_eq!(res.status(), 200);
    res.json().await.unwrap()
}

#[tokio::test]
async fn test_live_then_cached_when_upstream_fails() {
    let healthy = Arc::new(AtomicBool::new(true));
    let h = healthy.clone();
    let backend = common::start_programmable_backend(move || {
        let h = h.clone();
        async move {
            if h.load(Ordering::SeqCst) {
                (200, common::products_body())
            } else {
                (500, "boom".into())
            }
        }
    })
    .await;
    let frontend = common::start_frontend(backend, |_| {}).await;
    let client = common::client();

    let live = get_json(&client, frontend.url("/api/products")).await;
    assert_eq!(live["source"], "live");
    assert_eq!(live["payload"].as_array().unwrap().len(), 4);
    assert_eq!(live["breaker"]["state"], "closed");

    healthy.store(false, Ordering::SeqCst);

    let cached = get_json(&client, frontend.url("/api/products")).await;
    assert_eq!(cached["source"], "cached");
    assert_eq!(cached["payload"], live["payload"]);
    assert_eq!(cached["breaker"]["consecutive_failures"], 1);
}

#[tokio::test]
async fn test_fallback_when_nothing_cached() {
    let upstream = common::dead_address().await;
    let frontend = common::start_frontend(upstream, |_| {}).await;
    let client = common::client();

    let result = get_json(&client, frontend.url("/api/products")).await;
    assert_eq!(result["source"], "fallback");
    let names: Vec<&str> = result["payload"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Laptop (cached)", "Mouse (cached)", "Keyboard (cached)"]);
}

#[tokio::test]
async fn test_open_circuit_stops_upstream_calls() {
    let calls = Arc::new(AtomicU32::new(0));
    let c = calls.clone();
    let backend = common::start_programmable_backend(move || {
        let c = c.clone();
        async move {
            c.fetch_add(1, Ordering::SeqCst);
            (503, "Service Unavailable".into())
        }
    })
    .await;
    let frontend = common::start_frontend(backend, |config| {
        config.breaker.failure_threshold = 3;
        config.breaker.open_duration_secs = 30;
    })
    .await;
    let client = common::client();

    for _ in 0..3 {
        let result = get_json(&client, frontend.url("/api/products")).await;
        assert_eq!(result["source"], "fallback");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    let status = get_json(&client, frontend.url("/circuit-breaker/status")).await;
    assert_eq!(status["state"], "open");
    assert_eq!(status["failure_count"], 3);
    assert!(status["last_failure_secs_ago"].as_f64().is_some());

    for _ in 0..5 {
        let result = get_json(&client, frontend.url("/api/products")).await;
        assert_eq!(result["source"], "fallback");
        assert_eq!(result["breaker"]["state"], "open");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 3, "open circuit must not reach the upstream");
    assert_eq!(frontend.guard.breaker().state(), BreakerState::Open);
}

#[tokio::test]
async fn test_open_circuit_recovers_after_open_duration() {
    let healthy = Arc::new(AtomicBool::new(false));
    let calls = Arc::new(AtomicU32::new(0));
    let (h, c) = (healthy.clone(), calls.clone());
    let backend = common::start_programmable_backend(move || {
        let (h, c) = (h.clone(), c.clone());
        async move {
            c.fetch_add(1, Ordering::SeqCst);
            if h.load(Ordering::SeqCst) {
                (200, common::products_body())
            } else {
                (503, "Service Unavailable".into())
            }
        }
    })
    .await;
    let clock = ManualClock::new();
    let frontend = common::start_frontend_with_clock(backend, Arc::new(clock.clone()), |config| {
        config.breaker.failure_threshold = 3;
        config.breaker.open_duration_secs = 30;
    })
    .await;
    let client = common::client();

    for _ in 0..3 {
        get_json(&client, frontend.url("/api/products")).await;
    }
    let status = get_json(&client, frontend.url("/circuit-breaker/status")).await;
    assert_eq!(status["state"], "open");
    assert_eq!(status["failure_count"], 3);

    healthy.store(true, Ordering::SeqCst);
    clock.advance(Duration::from_secs(30));
    let still_open = get_json(&client, frontend.url("/api/products")).await;
    assert_eq!(still_open["source"], "fallback");
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    clock.advance(Duration::from_secs(1));
    let status = get_json(&client, frontend.url("/circuit-breaker/status")).await;
    assert_eq!(status["last_failure_secs_ago"], 31.0);

    let recovered = get_json(&client, frontend.url("/api/products")).await;
    assert_eq!(recovered["source"], "live");
    assert_eq!(recovered["breaker"]["state"], "closed");
    assert_eq!(calls.load(Ordering::SeqCst), 4);

    let status = get_json(&client, frontend.url("/circuit-breaker/status")).await;
    assert_eq!(status["state"], "closed");
    assert_eq!(status["failure_count"], 0);
    assert_eq!(frontend.guard.breaker().state(), BreakerState::Closed);
}

#[tokio::test]
async fn test_slow_upstream_times_out_to_cache() {
    let slow = Arc::new(AtomicBool::new(false));
    let s = slow.clone();
    let backend = common::start_programmable_backend(move || {
        let s = s.clone();
        async move {
            if s.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(600)).await;
            }
            (200, common::products_body())
        }
    })
    .await;
    let frontend = common::start_frontend(backend, |config| {
        config.upstream.timeout_ms = 100;
    })
    .await;
    let client = common::client();

    assert_eq!(get_json(&client, frontend.url("/api/products")).await["source"], "live");

    slow.store(true, Ordering::SeqCst);
    let result = get_json(&client, frontend.url("/api/products")).await;
    assert_eq!(result["source"], "cached");
}

#[tokio::test]
async fn test_health_page_and_request_id() {
    let backend = common::start_programmable_backend(|| async { (200, common::products_body()) }).await;
    let frontend = common::start_frontend(backend, |_| {}).await;
    let client = common::client();

    let health = get_json(&client, frontend.url("/health")).await;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["circuit_breaker_state"], "closed");
    assert_eq!(health["circuit_breaker_failures"], 0);

    let res = client.get(frontend.url("/")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    let page = res.text().await.unwrap();
    assert!(page.contains("LIVE DATA"));
    assert!(page.contains("<strong>Monitor</strong> - $349.99"));

    let res = client
        .get(frontend.url("/health"))
        .header("x-request-id", "fixed-id-42")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "fixed-id-42");
}
