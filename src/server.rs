//! HTTP server for exposing Prometheus metrics.
//!
//! This module provides an Axum-based HTTP server that serves the metrics
//! endpoint for Prometheus scraping and a `/health` endpoint for health checks.

use crate::error::{ExporterError, Result};
use crate::metrics::MetricsCollector;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Shared application state.
#[derive(Clone)]
struct AppState {
    metrics: Arc<MetricsCollector>,
    metrics_path: Arc<str>,
}

/// Start the HTTP server.
///
/// # Arguments
///
/// * `listen_address` - Address to bind to (e.g., "127.0.0.1:9001")
/// * `metrics_path` - Path serving the metrics (e.g., "/metrics")
/// * `metrics` - Metrics collector instance
///
/// # Examples
///
/// ```no_run
/// use ott_mongodb_backup_exporter::{config::Settings, metrics::MetricsCollector, server::start_server};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() {
///     let settings = Arc::new(Settings::load(None).unwrap());
///     let metrics = MetricsCollector::new(settings.clone()).unwrap();
///     start_server(&settings.listen_address(), &settings.metrics_path, metrics)
///         .await
///         .unwrap();
/// }
/// ```
pub async fn start_server(
    listen_address: &str,
    metrics_path: &str,
    metrics: MetricsCollector,
) -> Result<()> {
    info!("Starting HTTP server on {}", listen_address);

    let listener = TcpListener::bind(listen_address).await?;
    serve(listener, metrics_path, metrics).await
}

/// Serve the exporter on an already bound listener.
pub async fn serve(
    listener: TcpListener,
    metrics_path: &str,
    metrics: MetricsCollector,
) -> Result<()> {
    let app = router(metrics_path, metrics);

    axum::serve(listener, app)
        .await
        .map_err(|e| ExporterError::Server(e.to_string()))?;

    Ok(())
}

/// Build the exporter routes.
pub fn router(metrics_path: &str, metrics: MetricsCollector) -> Router {
    let state = AppState {
        metrics: Arc::new(metrics),
        metrics_path: Arc::from(metrics_path),
    };

    Router::new()
        .route(metrics_path, get(metrics_handler))
        .route("/health", get(health_handler))
        .route("/", get(root_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Handler for the metrics endpoint.
async fn metrics_handler(State(state): State<AppState>) -> Response {
    debug!("Received metrics scrape request");

    // Collection walks the filesystem
    let metrics = Arc::clone(&state.metrics);
    let encoded = tokio::task::spawn_blocking(move || metrics.encode()).await;

    match encoded {
        Ok(Ok(body)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Ok(Err(e)) => {
            warn!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
                .into_response()
        }
        Err(e) => {
            warn!("Metrics collection task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Metrics collection task failed: {}", e),
            )
                .into_response()
        }
    }
}

/// Handler for /health endpoint.
async fn health_handler() -> Response {
    (StatusCode::OK, "OK").into_response()
}

/// Handler for root endpoint.
async fn root_handler(State(state): State<AppState>) -> Response {
    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head><title>OTT MongoDB Backup Exporter</title></head>
<body>
    <h1>OTT MongoDB Backup Exporter</h1>
    <ul>
        <li><a href="{path}">{path}</a> - Prometheus metrics</li>
        <li><a href="/health">/health</a> - Health check</li>
    </ul>
</body>
</html>
"#,
        path = state.metrics_path
    );

    (StatusCode::OK, Html(html)).into_response()
}
