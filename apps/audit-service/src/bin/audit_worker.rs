//! Audit Worker Binary
//!
//! Consumes `recommended_prices` and `dead_letter_queue` concurrently and
//! persists both into Postgres for later inspection.
//!
//! # Environment Variables
//!
//! - `KAFKA_BROKER`: Kafka bootstrap servers (default: `kafka:9092`)
//! - `KAFKA_PRICES_TOPIC`: pricing decisions topic (default: `recommended_prices`)
//! - `KAFKA_DLQ_TOPIC`: dead letter topic (default: `dead_letter_queue`)
//! - `DATABASE_URL`: Postgres connection string
//! - `AUDIT_METRICS_PORT`: Prometheus `/metrics` port for the API (default: 9004);
//!   the worker listens one port above it so the two binaries can be colocated

use std::net::SocketAddr;

use audit_service::config::Config;
use audit_service::worker::AuditWorker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pricing_common::telemetry::init_logging("audit_worker");

    let config = Config::from_env();
    tracing::info!(?config, "audit worker starting");

    let metrics_addr: SocketAddr = format!("0.0.0.0:{}", config.metrics_port + 1).parse()?;
    pricing_common::telemetry::init_metrics(metrics_addr)?;

    let worker = AuditWorker::new(&config).await?;
    worker.run().await?;

    tracing::info!("audit worker stopped");
    Ok(())
}
