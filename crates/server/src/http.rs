//! HTTP server implementation using Axum
//!
//! Wraps an Axum router and provides graceful shutdown through the
//! [`Server`](crate::Server) trait.

use async_trait::async_trait;
use axum::Router;
use parking_lot::RwLock;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::traits::Server;

#[derive(Clone)]
pub struct HttpServer {
    config: ServerConfig,
    router: Router,
    running: Arc<AtomicBool>,
    bound_addr: Arc<RwLock<Option<SocketAddr>>>,
}

impl HttpServer {
    pub fn new(config: ServerConfig, router: Router) -> Self {
        Self {
            config,
            router,
            running: Arc::new(AtomicBool::new(false)),
            bound_addr: Arc::new(RwLock::new(None)),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

#[async_trait]
impl Server for HttpServer {
    fn name(&self) -> &str {
        "http"
    }

    fn address(&self) -> Option<SocketAddr> {
        *self.bound_addr.read()
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn run(&self, shutdown_token: CancellationToken) -> Result<()> {
        let addr = self.config.bind_addr()?;

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::bind(addr.to_string(), e))?;

        let local_addr = listener.local_addr().map_err(ServerError::Io)?;
        *self.bound_addr.write() = Some(local_addr);
        info!(%local_addr, "HTTP server listening");

        self.running.store(true, Ordering::SeqCst);

        let result = axum::serve(listener, self.router.clone())
            .with_graceful_shutdown(async move {
                shutdown_token.cancelled().await;
                info!("HTTP server received shutdown signal");
            })
            .await;

        self.running.store(false, Ordering::SeqCst);
        *self.bound_addr.write() = None;

        match result {
            Ok(()) => {
                info!("HTTP server shutdown complete");
                Ok(())
            }
            Err(e) => {
                error!(%e, "HTTP server error");
                Err(ServerError::Io(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::{health_routes, ComponentStatus, HealthState};
    use crate::traits::ServerExt;
    use std::time::Duration;

    #[tokio::test]
    async fn test_http_server_shutdown() {
        // Ephemeral port
        let config = ServerConfig::new("127.0.0.1", 0);
        let server = HttpServer::new(config, Router::new());
        let (handle, token) = server.spawn();

        tokio::time::sleep(Duration::from_millis(100)).await;
        token.cancel();

        let result = tokio::time::timeout(Duration::from_secs(5), handle).await;
        assert!(result.is_ok(), "Server should shutdown within timeout");
    }

    #[tokio::test]
    async fn test_health_endpoint_reports_degraded() {
        let state = Arc::new(HealthState::new("marketsync"));
        state
            .update_component(ComponentStatus {
                component: "stream".to_string(),
                healthy: false,
                detail: Some("reconnecting".to_string()),
            })
            .await;

        let server = HttpServer::new(ServerConfig::new("127.0.0.1", 0), health_routes(state));
        let probe = server.clone();
        let (handle, token) = server.spawn();

        // Wait for the listener to bind
        let mut addr = None;
        for _ in 0..50 {
            if let Some(a) = probe.address() {
                addr = Some(a);
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let addr = addr.expect("server never bound");

        let response = reqwest::get(format!("http://{}/health", addr))
            .await
            .unwrap();
        assert_eq!(response.status(), 503);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["service"], "marketsync");

        token.cancel();
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }
}
