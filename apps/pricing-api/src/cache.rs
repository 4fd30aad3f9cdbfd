//! Redis-backed price cache with a background keepalive health check.
//!
//! The read path must never block on a down cache: every lookup first
//! checks the cached health flag and returns `None` immediately if the
//! last ping failed, leaving the caller free to fall through to fallback
//! pricing without waiting on a connection timeout.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::PricingApiError;

const KEY_PREFIX: &str = "price:";
const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Port the pricing service reads/writes through. Lets tests exercise the
/// cache-miss and fallback paths with an in-memory double instead of a
/// live Redis instance.
#[async_trait::async_trait]
pub trait CacheBackend: Send + Sync {
    fn is_healthy(&self) -> bool;
    async fn get_price(&self, sku: &str) -> Option<Value>;
    async fn set_price(&self, sku: &str, data: Value) -> Result<(), PricingApiError>;
    async fn delete_price(&self, sku: &str) -> Result<(), PricingApiError>;
    async fn get_all_prices(&self) -> HashMap<String, Value>;
    async fn clear(&self) -> Result<(), PricingApiError>;
}

/// Wraps a Redis connection manager with a health flag updated by a
/// background keepalive task.
pub struct PriceCache {
    manager: ConnectionManager,
    healthy: Arc<AtomicBool>,
    ttl_secs: u64,
}

impl PriceCache {
    pub async fn connect(config: &Config) -> anyhow::Result<Self> {
        let client = redis::Client::open(config.redis_url())?;
        let manager = client.get_connection_manager().await?;

        Ok(Self {
            manager,
            healthy: Arc::new(AtomicBool::new(true)),
            ttl_secs: config.redis_ttl_secs,
        })
    }

    /// Spawn the 30s keepalive ping. On failure the cache is marked
    /// unhealthy and every read is bypassed until a ping succeeds again.
    pub fn spawn_health_check(&self) {
        let mut manager = self.manager.clone();
        let healthy = Arc::clone(&self.healthy);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(HEALTH_CHECK_INTERVAL);
            loop {
                interval.tick().await;
                let ok: bool = redis::cmd("PING")
                    .query_async::<String>(&mut manager)
                    .await
                    .is_ok();
                if !ok {
                    tracing::warn!("cache health check failed, bypassing cache");
                }
                healthy.store(ok, Ordering::Relaxed);
            }
        });
    }

}

#[async_trait::async_trait]
impl CacheBackend for PriceCache {
    fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }

    /// Fetch `price:<sku>`. Returns `None` on a miss, a deserialization
    /// failure, or a connection error — callers fall through to fallback
    /// pricing in every case, so no distinction is surfaced here.
    async fn get_price(&self, sku: &str) -> Option<Value> {
        let mut manager = self.manager.clone();
        let key = format!("{KEY_PREFIX}{sku}");
        let data: Option<String> = manager.get(&key).await.ok()?;
        data.and_then(|raw| serde_json::from_str(&raw).ok())
    }

    /// Write an arbitrary JSON blob into `price:<sku>` with the configured
    /// TTL, stamping `cached_at`.
    async fn set_price(&self, sku: &str, mut data: Value) -> Result<(), PricingApiError> {
        let mut manager = self.manager.clone();
        let key = format!("{KEY_PREFIX}{sku}");

        if let Some(obj) = data.as_object_mut() {
            obj.insert("cached_at".to_string(), json!(Utc::now().to_rfc3339()));
        }

        let payload =
            serde_json::to_string(&data).map_err(|e| PricingApiError::CacheWrite(e.to_string()))?;

        manager
            .set_ex::<_, _, ()>(&key, payload, self.ttl_secs)
            .await
            .map_err(|e| PricingApiError::CacheWrite(e.to_string()))?;

        Ok(())
    }

    async fn delete_price(&self, sku: &str) -> Result<(), PricingApiError> {
        let mut manager = self.manager.clone();
        let key = format!("{KEY_PREFIX}{sku}");
        manager
            .del::<_, ()>(&key)
            .await
            .map_err(|e| PricingApiError::CacheWrite(e.to_string()))
    }

    /// Scan every `price:*` key. Used by the batch read path.
    async fn get_all_prices(&self) -> HashMap<String, Value> {
        let mut manager = self.manager.clone();
        let keys: Vec<String> = manager
            .keys(format!("{KEY_PREFIX}*"))
            .await
            .unwrap_or_default();

        let mut result = HashMap::with_capacity(keys.len());
        for key in keys {
            let Ok(Some(raw)) = manager.get::<_, Option<String>>(&key).await else {
                continue;
            };
            let Ok(value) = serde_json::from_str(&raw) else {
                continue;
            };
            let sku = key.trim_start_matches(KEY_PREFIX).to_string();
            result.insert(sku, value);
        }
        result
    }

    async fn clear(&self) -> Result<(), PricingApiError> {
        let mut manager = self.manager.clone();
        redis::cmd("FLUSHDB")
            .query_async::<()>(&mut manager)
            .await
            .map_err(|e| PricingApiError::CacheWrite(e.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use serde_json::Value;

    use super::CacheBackend;
    use crate::error::PricingApiError;

    /// In-memory [`CacheBackend`] double: no TTL expiry, no network I/O.
    /// Lets tests drive the cache-hit / cache-miss / unhealthy-cache paths
    /// deterministically.
    #[derive(Default)]
    pub struct InMemoryCache {
        healthy: AtomicBool,
        entries: Mutex<HashMap<String, Value>>,
    }

    impl InMemoryCache {
        pub fn new() -> Self {
            Self {
                healthy: AtomicBool::new(true),
                entries: Mutex::new(HashMap::new()),
            }
        }

        pub fn set_healthy(&self, healthy: bool) {
            self.healthy.store(healthy, Ordering::Relaxed);
        }
    }

    #[async_trait::async_trait]
    impl CacheBackend for InMemoryCache {
        fn is_healthy(&self) -> bool {
            self.healthy.load(Ordering::Relaxed)
        }

        async fn get_price(&self, sku: &str) -> Option<Value> {
            self.entries.lock().unwrap().get(sku).cloned()
        }

        async fn set_price(&self, sku: &str, data: Value) -> Result<(), PricingApiError> {
            self.entries.lock().unwrap().insert(sku.to_string(), data);
            Ok(())
        }

        async fn delete_price(&self, sku: &str) -> Result<(), PricingApiError> {
            self.entries.lock().unwrap().remove(sku);
            Ok(())
        }

        async fn get_all_prices(&self) -> HashMap<String, Value> {
            self.entries.lock().unwrap().clone()
        }

        async fn clear(&self) -> Result<(), PricingApiError> {
            self.entries.lock().unwrap().clear();
            Ok(())
        }
    }
}
