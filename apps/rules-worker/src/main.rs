//! Rules Worker Binary
//!
//! Consumes `raw_prices`, evaluates each message against the pricing rules
//! engine, and publishes the outcome to `recommended_prices` or
//! `dead_letter_queue`.
//!
//! # Environment Variables
//!
//! - `KAFKA_BROKER`: Kafka bootstrap servers (default: `kafka:9092`)
//! - `KAFKA_SCRAPER_TOPIC`: input topic (default: `raw_prices`)
//! - `KAFKA_PRICES_TOPIC`: recommendation output topic (default: `recommended_prices`)
//! - `KAFKA_DLQ_TOPIC`: dead letter topic (default: `dead_letter_queue`)
//! - `MINIMUM_MARGIN` / `MAXIMUM_MARGIN`: margin clamp bounds (default: 0.10 / 0.50)
//! - `ELASTICITY_FACTOR`: demand elasticity multiplier (default: 1.5)
//! - `RULES_WORKER_METRICS_PORT`: Prometheus `/metrics` port (default: 9002)

use std::net::SocketAddr;
use std::sync::Arc;

use rules_worker::config::Config;
use rules_worker::engine::{EngineConfig, PricingRulesEngine};
use rules_worker::worker::RulesWorker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pricing_common::telemetry::init_logging("rules_worker");

    let config = Config::from_env();
    tracing::info!(?config, "rules worker starting");

    let metrics_addr: SocketAddr = format!("0.0.0.0:{}", config.metrics_port).parse()?;
    pricing_common::telemetry::init_metrics(metrics_addr)?;

    let engine_config = EngineConfig {
        elasticity_factor: config.elasticity_factor,
        ..EngineConfig::default()
    };
    let engine = Arc::new(PricingRulesEngine::new(engine_config));
    let worker = RulesWorker::new(&config, engine)?;

    worker.run().await?;

    tracing::info!("rules worker stopped");
    Ok(())
}
