//! Scraper Service Binary
//!
//! Starts the async competitor-price fetcher behind an HTTP surface.
//!
//! # Environment Variables
//!
//! - `KAFKA_BROKER`: Kafka bootstrap servers (default: `kafka:9092`)
//! - `KAFKA_SCRAPER_TOPIC`: topic to publish `RawPrice` events to (default: `raw_prices`)
//! - `SCRAPER_HOST` / `SCRAPER_PORT`: HTTP bind address (default: `0.0.0.0:8001`)
//! - `MAX_CONCURRENT_REQUESTS`: outbound fetch concurrency cap (default: 100)
//! - `SCRAPE_TIMEOUT_MS`: per-fetch timeout (default: 5000)
//! - `SCRAPER_METRICS_PORT`: Prometheus `/metrics` port (default: 9001)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use scraper_service::config::Config;
use scraper_service::fetcher::Fetcher;
use scraper_service::http::{create_router, AppState};
use scraper_service::producer::RawPriceProducer;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pricing_common::telemetry::init_logging("scraper_service");

    let config = Config::from_env();
    tracing::info!(?config, "scraper service starting");

    let metrics_addr: SocketAddr = format!("0.0.0.0:{}", config.metrics_port).parse()?;
    pricing_common::telemetry::init_metrics(metrics_addr)?;

    let fetcher = Arc::new(Fetcher::new(
        config.max_concurrent_requests,
        Duration::from_millis(config.request_timeout_ms),
    ));
    let producer = Arc::new(RawPriceProducer::new(
        &config.kafka_broker,
        config.kafka_scraper_topic.clone(),
    )?);

    let state = AppState { fetcher, producer };
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.bind_host, config.bind_port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "scraper service listening");

    let server = axum::serve(listener, app).with_graceful_shutdown(pricing_common::shutdown::signal());
    server.await?;

    tracing::info!("scraper service stopped");
    Ok(())
}
