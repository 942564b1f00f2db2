//! HTTP control surface for remote activation.
//!
//! Four routes: `GET /health`, `POST /activate`, `POST /deactivate`,
//! `GET /status`. Mutating operations always answer with a structured
//! `{success, message}` body; only an unusable store surfaces as an HTTP
//! error status. The transport that exposes these routes to the outside
//! (reverse proxy, tunnel) is out of scope.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};

use crate::config::{ProcessorConfig, DEFAULT_AUTO_STOP_MINUTES, DEFAULT_INTERVAL_SECS};
use crate::control::{Controller, StatusCounts};

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ActivateRequest {
    pub interval: f64,
    pub max_iterations: Option<u64>,
    pub auto_stop_minutes: Option<u64>,
}

impl Default for ActivateRequest {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL_SECS,
            max_iterations: None,
            auto_stop_minutes: Some(DEFAULT_AUTO_STOP_MINUTES),
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    processor_running: bool,
    store: Option<String>,
    timestamp: String,
}

#[derive(Serialize)]
struct StatusResponse {
    success: bool,
    processor_running: bool,
    store: String,
    job_stats: StatusCounts,
    timestamp: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

/// Build the control-plane router. Public so tests can drive the real
/// handlers in process.
pub fn router(controller: Arc<Controller>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/activate", post(activate_handler))
        .route("/deactivate", post(deactivate_handler))
        .route("/status", get(status_handler))
        .layer(cors)
        .with_state(controller)
}

/// Bind and serve the control plane until `shutdown` is cancelled.
pub async fn serve(
    addr: SocketAddr,
    controller: Arc<Controller>,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "control plane listening");

    axum::serve(listener, router(controller))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
}

async fn health_handler(State(controller): State<Arc<Controller>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "online",
        processor_running: controller.is_running(),
        store: controller.store_identity(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

async fn activate_handler(
    State(controller): State<Arc<Controller>>,
    body: Option<Json<ActivateRequest>>,
) -> impl IntoResponse {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    tracing::info!(
        interval = request.interval,
        max_iterations = ?request.max_iterations,
        auto_stop_minutes = ?request.auto_stop_minutes,
        "activation requested"
    );

    let config = ProcessorConfig {
        interval_secs: request.interval,
        max_iterations: request.max_iterations,
        auto_stop_minutes: request.auto_stop_minutes,
    };
    Json(controller.start(config))
}

async fn deactivate_handler(State(controller): State<Arc<Controller>>) -> impl IntoResponse {
    tracing::info!("deactivation requested");
    Json(controller.stop().await)
}

async fn status_handler(State(controller): State<Arc<Controller>>) -> impl IntoResponse {
    match controller.status() {
        Ok(report) => (
            StatusCode::OK,
            Json(StatusResponse {
                success: true,
                processor_running: report.processor_running,
                store: report.store,
                job_stats: report.job_stats,
                timestamp: Utc::now().to_rfc3339(),
            }),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                success: false,
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}
