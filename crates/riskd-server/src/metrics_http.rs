//! HTTP endpoint for Prometheus scraping and state inspection.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use riskd_state::{InstrumentSnapshot, SharedRiskState};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::MetricsConfig;
use crate::error::{ServerError, ServerResult};

pub fn create_router(store: SharedRiskState) -> Router {
    Router::new()
        .route("/metrics", get(serve_metrics))
        .route("/api/snapshot", get(get_snapshot))
        .with_state(store)
}

async fn serve_metrics() -> Response {
    match riskd_telemetry::gather_text() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response()
        }
    }
}

async fn get_snapshot(State(store): State<SharedRiskState>) -> Json<Vec<InstrumentSnapshot>> {
    Json(store.snapshots())
}

/// Serve the metrics endpoint until `shutdown` is cancelled.
pub async fn run_metrics_server(
    config: MetricsConfig,
    store: SharedRiskState,
    shutdown: CancellationToken,
) -> ServerResult<()> {
    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| ServerError::Metrics(format!("bind {addr}: {e}")))?;
    info!(addr = %addr, "Starting metrics server");

    axum::serve(listener, create_router(store))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| ServerError::Metrics(e.to_string()))
}
