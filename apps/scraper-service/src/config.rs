//! Environment-variable configuration for the scraper service.
//!
//! Every field has a documented default so the service boots in a local/dev
//! environment with no configuration at all.

/// Scraper service configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub kafka_broker: String,
    pub kafka_scraper_topic: String,
    pub bind_host: String,
    pub bind_port: u16,
    pub max_concurrent_requests: usize,
    pub request_timeout_ms: u64,
    pub metrics_port: u16,
}

impl Config {
    /// Load configuration from the environment, falling back to defaults
    /// for anything unset.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            kafka_broker: env_or("KAFKA_BROKER", "kafka:9092"),
            kafka_scraper_topic: env_or("KAFKA_SCRAPER_TOPIC", "raw_prices"),
            bind_host: env_or("SCRAPER_HOST", "0.0.0.0"),
            bind_port: env_parse_or("SCRAPER_PORT", 8001),
            max_concurrent_requests: env_parse_or("MAX_CONCURRENT_REQUESTS", 100),
            request_timeout_ms: env_parse_or("SCRAPE_TIMEOUT_MS", 5000),
            metrics_port: env_parse_or("SCRAPER_METRICS_PORT", 9001),
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
