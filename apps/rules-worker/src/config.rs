//! Environment-variable configuration for the rules worker.

/// Rules worker configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub kafka_broker: String,
    pub kafka_scraper_topic: String,
    pub kafka_prices_topic: String,
    pub kafka_dlq_topic: String,
    pub min_margin: f64,
    pub max_margin: f64,
    pub elasticity_factor: f64,
    pub metrics_port: u16,
}

impl Config {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            kafka_broker: env_or("KAFKA_BROKER", "kafka:9092"),
            kafka_scraper_topic: env_or("KAFKA_SCRAPER_TOPIC", "raw_prices"),
            kafka_prices_topic: env_or("KAFKA_PRICES_TOPIC", "recommended_prices"),
            kafka_dlq_topic: env_or("KAFKA_DLQ_TOPIC", "dead_letter_queue"),
            min_margin: env_parse_or("MINIMUM_MARGIN", 0.10),
            max_margin: env_parse_or("MAXIMUM_MARGIN", 0.50),
            elasticity_factor: env_parse_or("ELASTICITY_FACTOR", 1.5),
            metrics_port: env_parse_or("RULES_WORKER_METRICS_PORT", 9002),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
