//! Pricing API Binary
//!
//! Low-latency price lookup: Redis cache first, static fallback table
//! second, 404 otherwise. Never blocks on the broker.
//!
//! # Environment Variables
//!
//! - `REDIS_HOST` / `REDIS_PORT` / `REDIS_DB` / `REDIS_TTL`: cache connection (default: localhost:6379/0, 3600s)
//! - `PRICING_API_HOST` / `PRICING_API_PORT`: HTTP bind address (default: `0.0.0.0:8002`)
//! - `PRICING_API_METRICS_PORT`: Prometheus `/metrics` port (default: 9003)

use std::net::SocketAddr;
use std::sync::Arc;

use pricing_api::cache::{CacheBackend, PriceCache};
use pricing_api::config::Config;
use pricing_api::http::{create_router, AppState};
use pricing_api::service::PricingService;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pricing_common::telemetry::init_logging("pricing_api");

    let config = Config::from_env();
    tracing::info!(?config, "pricing api starting");

    let metrics_addr: SocketAddr = format!("0.0.0.0:{}", config.metrics_port).parse()?;
    pricing_common::telemetry::init_metrics(metrics_addr)?;

    let cache = Arc::new(PriceCache::connect(&config).await?);
    cache.spawn_health_check();
    let cache: Arc<dyn CacheBackend> = cache;

    let service = Arc::new(PricingService::new(Arc::clone(&cache)));
    let state = AppState { service, cache };
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.bind_host, config.bind_port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "pricing api listening");

    let server = axum::serve(listener, app).with_graceful_shutdown(pricing_common::shutdown::signal());
    server.await?;

    tracing::info!("pricing api stopped");
    Ok(())
}
