//! Environment-variable configuration for the pricing API.

/// Pricing API configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub redis_host: String,
    pub redis_port: u16,
    pub redis_db: u8,
    pub redis_ttl_secs: u64,
    pub bind_host: String,
    pub bind_port: u16,
    pub metrics_port: u16,
}

impl Config {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            redis_host: env_or("REDIS_HOST", "localhost"),
            redis_port: env_parse_or("REDIS_PORT", 6379),
            redis_db: env_parse_or("REDIS_DB", 0),
            redis_ttl_secs: env_parse_or("REDIS_TTL", 3600),
            bind_host: env_or("PRICING_API_HOST", "0.0.0.0"),
            bind_port: env_parse_or("PRICING_API_PORT", 8002),
            metrics_port: env_parse_or("PRICING_API_METRICS_PORT", 9003),
        }
    }

    #[must_use]
    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}/{}", self.redis_host, self.redis_port, self.redis_db)
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
