//! Structured JSON logging and Prometheus metrics, shared by every binary.
//!
//! Each service calls [`init_logging`] once at startup and, if it wants a
//! `/metrics` scrape endpoint of its own in addition to its domain routes,
//! [`init_metrics`].

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::EnvFilter;

/// Initialize the process-wide structured JSON logger.
///
/// Emits one JSON record per line with `timestamp`, `level`, `target`
/// (service/module), and `fields` (arbitrary context). `service_name`
/// seeds the default log level directive so each binary is quiet by
/// default except for its own crate.
pub fn init_logging(service_name: &str) {
    let default_directive = format!("{service_name}=info,warn");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(false)
        .with_span_list(false)
        .init();
}

/// Error type for metrics initialization failures.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// The Prometheus exporter failed to bind or install.
    #[error("failed to start metrics exporter: {0}")]
    Installation(String),
}

/// Start a Prometheus metrics exporter listening on `addr`, exposing
/// `/metrics` for scraping. Every pipeline service runs one of these
/// alongside its domain HTTP/consumer surface.
pub fn init_metrics(addr: SocketAddr) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    tracing::info!(%addr, "Prometheus metrics exporter started");
    Ok(())
}
