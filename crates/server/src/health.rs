//! Health check state and routes.
//!
//! Components (the sync loop, the stream client) publish their status
//! into a shared [`HealthState`]; the `/health` endpoint reports it.

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

/// Status of one service component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentStatus {
    pub component: String,
    pub healthy: bool,
    pub detail: Option<String>,
}

/// Shared state for health checks, typically wrapped in `Arc<HealthState>`
#[derive(Clone)]
pub struct HealthState {
    pub service_name: String,
    pub start_time: Instant,
    pub components: Arc<tokio::sync::RwLock<Vec<ComponentStatus>>>,
}

impl HealthState {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            start_time: Instant::now(),
            components: Arc::new(tokio::sync::RwLock::new(Vec::new())),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Record a component's status, replacing any previous report
    pub async fn update_component(&self, status: ComponentStatus) {
        let mut components = self.components.write().await;
        components.retain(|c| c.component != status.component);
        components.push(status);
    }

    pub async fn get_components(&self) -> Vec<ComponentStatus> {
        self.components.read().await.clone()
    }

    pub async fn is_healthy(&self) -> bool {
        self.components.read().await.iter().all(|c| c.healthy)
    }
}

/// Health check handler
pub async fn health_handler(State(state): State<Arc<HealthState>>) -> (StatusCode, Json<Value>) {
    let components = state.get_components().await;

    let all_healthy = components.iter().all(|c| c.healthy);
    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let health = json!({
        "status": if all_healthy { "ok" } else { "degraded" },
        "service": state.service_name,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
        "uptime_seconds": state.uptime_seconds(),
        "components": components,
    });

    (status_code, Json(health))
}

/// Create the health check router
pub fn health_routes(state: Arc<HealthState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_state() {
        let state = HealthState::new("marketsync");

        assert_eq!(state.service_name, "marketsync");
        assert!(state.is_healthy().await);

        state
            .update_component(ComponentStatus {
                component: "sync".to_string(),
                healthy: true,
                detail: Some("2 synced, 0 failed".to_string()),
            })
            .await;
        assert!(state.is_healthy().await);

        state
            .update_component(ComponentStatus {
                component: "stream".to_string(),
                healthy: false,
                detail: Some("reconnecting".to_string()),
            })
            .await;
        assert!(!state.is_healthy().await);
        assert_eq!(state.get_components().await.len(), 2);

        // A fresh report replaces the old one for the same component
        state
            .update_component(ComponentStatus {
                component: "stream".to_string(),
                healthy: true,
                detail: Some("subscribed".to_string()),
            })
            .await;
        assert!(state.is_healthy().await);
        assert_eq!(state.get_components().await.len(), 2);
    }
}
