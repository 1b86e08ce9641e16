//! HTTP server for liveness and Prometheus metrics.
//!
//! Runs on a separate tokio task and serves `/health` and `/metrics`. It is
//! independent of the consumer loop: a failing loop still reports healthy.

use axum::{Json, Router, extract::State, routing::get};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::time::Instant;

/// Handler for GET /health - returns seconds since startup.
async fn health_handler(State(started): State<Instant>) -> Json<Value> {
    Json(json!({ "uptime": started.elapsed().as_secs_f64() }))
}

/// Handler for GET /metrics - returns Prometheus metrics in text format.
async fn metrics_handler() -> String {
    crate::metrics::gather_metrics()
}

fn router(started: Instant) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(started)
}

/// Run the HTTP server.
///
/// Binds to `0.0.0.0:port`. This is a long-running task that should be
/// spawned in the background.
pub async fn run_http_server(port: u16, started: Instant) {
    let app = router(started);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Health HTTP server listening on {}", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind HTTP server on {}: {}", addr, e);
            return;
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("HTTP server error: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_health_reports_uptime() {
        let started = Instant::now() - Duration::from_secs(5);
        let Json(body) = health_handler(State(started)).await;
        let uptime = body["uptime"].as_f64().unwrap();
        assert!(uptime >= 5.0);
    }

    #[tokio::test]
    async fn test_serves_health_over_tcp() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router(Instant::now())).await;
        });

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("\"uptime\""));
    }
}
