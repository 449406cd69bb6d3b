// Local HTTP API - Axum server for the guide generator
// Serves JSON REST endpoints plus SSE streaming of generations on loopback.

pub mod routes;
pub mod streaming;

use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::cors::CorsLayer;

use crate::commands::AppState;

/// Holds the running server's shutdown mechanism
pub struct RunningServer {
    pub shutdown_tx: oneshot::Sender<()>,
    pub addr: SocketAddr,
    pub handle: tokio::task::JoinHandle<()>,
}

impl RunningServer {
    /// Signal shutdown and wait for in-flight requests to drain.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        let _ = self.handle.await;
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    // CORS for local browser frontends; the server only listens on loopback
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_origin(HeaderValue::from_static("*"));

    Router::new()
        .merge(routes::api_routes())
        .merge(streaming::stream_routes())
        .with_state(state)
        .layer(cors)
}

/// Start the HTTP server on the given port (or a nearby free one).
pub async fn start_server(state: Arc<AppState>, port: u16) -> Result<RunningServer, String> {
    let app = router(state);

    let addr = try_bind(port).await?;
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;
    let actual_addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get local addr: {}", e))?;

    log::info!("[server] Listening on http://{}", actual_addr);

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                log::info!("[server] Shutdown signal received, draining connections...");
            })
            .await
            .unwrap_or_else(|e| log::error!("[server] Server error: {}", e));
        log::info!("[server] Server stopped");
    });

    Ok(RunningServer {
        shutdown_tx,
        addr: actual_addr,
        handle,
    })
}

/// Try to bind to the given port, with fallback to nearby ports then OS-assigned
async fn try_bind(preferred_port: u16) -> Result<SocketAddr, String> {
    let addr = SocketAddr::from(([127, 0, 0, 1], preferred_port));
    if let Ok(listener) = tokio::net::TcpListener::bind(addr).await {
        drop(listener);
        return Ok(addr);
    }

    for offset in 1..=10u16 {
        let port = preferred_port.saturating_add(offset);
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        if let Ok(listener) = tokio::net::TcpListener::bind(addr).await {
            drop(listener);
            log::warn!("[server] Port {} unavailable, using {}", preferred_port, port);
            return Ok(addr);
        }
    }

    let addr = SocketAddr::from(([127, 0, 0, 1], 0u16));
    if let Ok(listener) = tokio::net::TcpListener::bind(addr).await {
        let actual = listener.local_addr().map_err(|e| e.to_string())?;
        drop(listener);
        log::warn!(
            "[server] All preferred ports unavailable, OS assigned port {}",
            actual.port()
        );
        return Ok(actual);
    }

    Err("Failed to bind to any port".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_try_bind_falls_back_when_port_taken() {
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let addr = try_bind(port).await.unwrap();
        assert_ne!(addr.port(), port);
        assert!(addr.ip().is_loopback());
    }
}
