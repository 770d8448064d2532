//! Health, liveness, and readiness endpoints.
//!
//! `/__health` reports the relay state as JSON, `/__gtg` answers the
//! "good to go" readiness check and `/__ping` is a plain liveness check.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Lifecycle of the relay as seen by health checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    /// Clients are being created; no messages are consumed yet.
    Starting,
    /// Consuming and publishing.
    Ready,
    /// Shutdown was requested; in-flight work is finishing.
    Draining,
}

impl HealthState {
    /// Lowercase name used in the `/__health` body.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::Draining => "draining",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Ready,
            2 => Self::Draining,
            _ => Self::Starting,
        }
    }
}

/// Shared, lock-free holder of the current [`HealthState`].
#[derive(Debug)]
pub struct HealthStatus {
    state: AtomicU8,
}

impl HealthStatus {
    /// Creates a status in the `Starting` state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(HealthState::Starting as u8),
        }
    }

    /// Current state.
    pub fn state(&self) -> HealthState {
        HealthState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Moves from `Starting` to `Ready`; has no effect once draining.
    pub fn set_ready(&self) {
        // Draining is terminal.
        let _ = self.state.compare_exchange(
            HealthState::Starting as u8,
            HealthState::Ready as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Moves to `Draining` from any state.
    pub fn set_draining(&self) {
        self.state
            .store(HealthState::Draining as u8, Ordering::Release);
    }
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// State shared by the health handlers.
#[derive(Debug, Clone)]
pub struct HealthContext {
    /// Relay lifecycle, updated by the run command.
    pub status: Arc<HealthStatus>,
    /// Topic carrying metadata publish events.
    pub consumer_topic: String,
    /// Topic receiving concept annotations.
    pub producer_topic: String,
    /// When the context was created, for `uptime_secs`.
    pub start_time: Instant,
}

impl HealthContext {
    /// Creates a context whose uptime starts now.
    pub fn new(
        status: Arc<HealthStatus>,
        consumer_topic: impl Into<String>,
        producer_topic: impl Into<String>,
    ) -> Self {
        Self {
            status,
            consumer_topic: consumer_topic.into(),
            producer_topic: producer_topic.into(),
            start_time: Instant::now(),
        }
    }
}

/// Returns detailed health information as JSON.
///
/// Always returns 200; the `state` field tells whether the relay is ready.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use axum::extract::State;
/// use annotation_mapper::health::{health_handler, HealthContext, HealthStatus};
///
/// # tokio_test::block_on(async {
/// let ctx = HealthContext::new(Arc::new(HealthStatus::new()), "in", "out");
/// let body = health_handler(State(ctx)).await.0;
/// assert_eq!(body["state"], "starting");
/// assert_eq!(body["producer_topic"], "out");
/// # });
/// ```
pub async fn health_handler(State(ctx): State<HealthContext>) -> Json<serde_json::Value> {
    Json(json!({
        "state": ctx.status.state().as_str(),
        "consumer_topic": ctx.consumer_topic,
        "producer_topic": ctx.producer_topic,
        "uptime_secs": ctx.start_time.elapsed().as_secs(),
    }))
}

/// Readiness check: 200 when ready, 503 while starting or draining.
pub async fn gtg_handler(State(ctx): State<HealthContext>) -> StatusCode {
    if ctx.status.state() == HealthState::Ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Liveness check.
pub async fn ping_handler() -> &'static str {
    "pong"
}

/// Builds the health router.
pub fn router(ctx: HealthContext) -> Router {
    Router::new()
        .route("/__health", get(health_handler))
        .route("/__gtg", get(gtg_handler))
        .route("/__ping", get(ping_handler))
        .with_state(ctx)
}

/// Serves the health endpoints on `bind` until `shutdown` is cancelled.
///
/// # Errors
///
/// Returns an error if the address is invalid or cannot be bound.
pub async fn serve(
    bind: &str,
    ctx: HealthContext,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let addr: SocketAddr = bind.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(address = %listener.local_addr()?, "Health endpoints listening");

    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    Ok(())
}
