//! Shared utilities for integration tests.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use storefront_guard::catalog::{backend_catalog, ProductsResponse};
use storefront_guard::clock::{Clock, SystemClock};
use storefront_guard::http::ProductGuard;
use storefront_guard::{GuardConfig, HttpServer, Shutdown};

/// JSON body of a healthy products response.
#[allow(dead_code)]
pub fn products_body() -> String {
    serde_json::to_string(&ProductsResponse {
        status: Some("success".into()),
        products: backend_catalog(),
        source: Some("backend-database".into()),
    })
    .unwrap()
}

async fn read_request_head(socket: &mut TcpStream) {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 512];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
}

/// Start a programmable mock backend on an ephemeral port.
///
/// `f` decides the status and body of every response.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        read_request_head(&mut socket).await;
                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// An address nothing listens on.
#[allow(dead_code)]
pub async fn dead_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// A running frontend under test.
#[allow(dead_code)]
pub struct Frontend {
    pub addr: SocketAddr,
    pub guard: Arc<ProductGuard>,
    pub shutdown: Shutdown,
}

#[allow(dead_code)]
impl Frontend {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for Frontend {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the frontend against `upstream` on an ephemeral port.
#[allow(dead_code)]
pub async fn start_frontend(upstream: SocketAddr, tweak: impl FnOnce(&mut GuardConfig)) -> Frontend {
    start_frontend_with_clock(upstream, Arc::new(SystemClock), tweak).await
}

/// Start the frontend reading time from `clock`.
#[allow(dead_code)]
pub async fn start_frontend_with_clock(
    upstream: SocketAddr,
    clock: Arc<dyn Clock>,
    tweak: impl FnOnce(&mut GuardConfig),
) -> Frontend {
    let mut config = GuardConfig::default();
    config.upstream.base_url = format!("http://{}", upstream);
    config.upstream.timeout_ms = 500;
    tweak(&mut config);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::with_clock(config, clock).unwrap();
    let guard = server.guard();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    Frontend { addr, guard, shutdown }
}

#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
