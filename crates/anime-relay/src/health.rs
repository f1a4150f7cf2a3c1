//! Health check and metrics endpoint

use std::sync::Arc;
use std::time::SystemTime;

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::errors::RelayError;
use crate::sink::ErrorSink;

/// Health check status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub uptime_seconds: u64,
    pub subscribed: bool,
    pub messages_received: u64,
    pub errors_reported: u64,
}

/// Metrics data
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metrics {
    pub messages_received: u64,
    pub errors_reported: u64,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub metrics: Arc<RwLock<Metrics>>,
    pub start_time: SystemTime,
    pub subscribed: Arc<RwLock<bool>>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(RwLock::new(Metrics::default())),
            start_time: SystemTime::now(),
            subscribed: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn increment_messages_received(&self) {
        self.metrics.write().await.messages_received += 1;
    }

    pub async fn increment_errors(&self) {
        self.metrics.write().await.errors_reported += 1;
    }

    pub async fn set_subscribed(&self, subscribed: bool) {
        *self.subscribed.write().await = subscribed;
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Forwards to `inner` and counts every report
pub struct CountingSink<S> {
    inner: S,
    state: AppState,
}

impl<S> CountingSink<S> {
    pub fn new(inner: S, state: AppState) -> Self {
        Self { inner, state }
    }
}

impl<S: ErrorSink> ErrorSink for CountingSink<S> {
    async fn report(&self, error: &RelayError) {
        self.state.increment_errors().await;
        self.inner.report(error).await;
    }
}

async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let uptime = state.start_time.elapsed().unwrap_or_default().as_secs();
    let subscribed = *state.subscribed.read().await;
    let metrics = state.metrics.read().await.clone();

    let (status, code) = if subscribed {
        ("healthy", StatusCode::OK)
    } else {
        ("unhealthy", StatusCode::SERVICE_UNAVAILABLE)
    };

    (
        code,
        Json(HealthStatus {
            status: status.to_string(),
            uptime_seconds: uptime,
            subscribed,
            messages_received: metrics.messages_received,
            errors_reported: metrics.errors_reported,
        }),
    )
}

async fn metrics_handler(State(state): State<AppState>) -> Json<Metrics> {
    Json(state.metrics.read().await.clone())
}

/// Readiness check (subscribed to the notification subject)
async fn ready_handler(State(state): State<AppState>) -> StatusCode {
    if *state.subscribed.read().await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Liveness check (process is alive)
async fn live_handler() -> StatusCode {
    StatusCode::OK
}

pub fn create_health_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/ready", get(ready_handler))
        .route("/live", get(live_handler))
        .with_state(state)
}

pub async fn start_health_server(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = create_health_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(%addr, "Health check server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
