//! Audit API Binary
//!
//! Read-only HTTP surface over the audit tables: per-SKU decision
//! history, recent failures, and aggregate statistics.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL`: Postgres connection string
//! - `AUDIT_API_HOST` / `AUDIT_API_PORT`: HTTP bind address (default: `0.0.0.0:8003`)
//! - `AUDIT_METRICS_PORT`: Prometheus `/metrics` port (default: 9004)

use std::net::SocketAddr;

use audit_service::config::Config;
use audit_service::db;
use audit_service::http::{create_router, AppState};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pricing_common::telemetry::init_logging("audit_api");

    let config = Config::from_env();
    tracing::info!(?config, "audit api starting");

    let metrics_addr: SocketAddr = format!("0.0.0.0:{}", config.metrics_port).parse()?;
    pricing_common::telemetry::init_metrics(metrics_addr)?;

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&config.database_url)
        .await?;
    db::run_migrations(&pool).await?;

    let app = create_router(AppState { pool });

    let addr: SocketAddr = format!("{}:{}", config.bind_host, config.bind_port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "audit api listening");

    let server = axum::serve(listener, app).with_graceful_shutdown(pricing_common::shutdown::signal());
    server.await?;

    tracing::info!("audit api stopped");
    Ok(())
}
