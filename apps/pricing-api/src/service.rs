//! Cache-then-fallback price lookup strategy.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};

use crate::cache::CacheBackend;

/// Default per-SKU price used when the cache is unavailable or empty for
/// that SKU. Carries an explicit low confidence so callers can tell a
/// synthetic answer from a real decision.
fn default_fallback_prices() -> HashMap<&'static str, f64> {
    HashMap::from([
        ("SKU001", 100.00),
        ("SKU002", 250.00),
        ("SKU003", 50.00),
        ("SKU004", 1000.00),
    ])
}

/// Tiered price lookup: cache first, then a static fallback table, else
/// nothing. Never blocks on the broker.
pub struct PricingService {
    cache: Arc<dyn CacheBackend>,
    fallback_prices: HashMap<&'static str, f64>,
}

impl PricingService {
    #[must_use]
    pub fn new(cache: Arc<dyn CacheBackend>) -> Self {
        Self {
            cache,
            fallback_prices: default_fallback_prices(),
        }
    }

    /// Look up a recommended price for `sku`. Cache hit increments
    /// `cache_hits` and returns the cached payload with `source="cache"`.
    /// A miss (or unhealthy cache) increments `cache_misses`, then falls
    /// through to the static fallback table, incrementing `fallback_uses`
    /// on a hit there. `None` means 404 to the caller.
    pub async fn get_recommended_price(&self, sku: &str) -> Option<Value> {
        if self.cache.is_healthy() {
            if let Some(mut cached) = self.cache.get_price(sku).await {
                metrics::counter!("pricing_api_cache_hits_total").increment(1);
                if let Some(obj) = cached.as_object_mut() {
                    obj.insert("source".to_string(), json!("cache"));
                    obj.insert("retrieved_at".to_string(), json!(Utc::now().to_rfc3339()));
                }
                return Some(cached);
            }
        }
        metrics::counter!("pricing_api_cache_misses_total").increment(1);

        let fallback_price = self.fallback_prices.get(sku).copied()?;
        metrics::counter!("pricing_api_fallback_uses_total").increment(1);
        tracing::warn!(%sku, price = fallback_price, "serving fallback price, cache unavailable or empty");

        Some(json!({
            "sku": sku,
            "recommended_price": fallback_price,
            "current_price": fallback_price,
            "margin_pct": 0.20,
            "confidence": 0.3,
            "reason": "Fallback pricing",
            "competitor_prices": [],
            "source": "fallback",
            "retrieved_at": Utc::now().to_rfc3339(),
        }))
    }

    /// Fan out `get_recommended_price` over a batch of SKUs concurrently.
    pub async fn get_batch_prices(&self, skus: &[String]) -> HashMap<String, Value> {
        let futures = skus.iter().map(|sku| async move {
            let result = self.get_recommended_price(sku).await;
            (sku.clone(), result)
        });

        futures::future::join_all(futures)
            .await
            .into_iter()
            .filter_map(|(sku, result)| result.map(|v| (sku, v)))
            .collect()
    }

    pub async fn update_cache_price(&self, sku: &str, data: Value) -> bool {
        self.cache.set_price(sku, data).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::test_support::InMemoryCache;

    fn service_with(cache: Arc<InMemoryCache>) -> PricingService {
        PricingService::new(cache as Arc<dyn CacheBackend>)
    }

    #[tokio::test]
    async fn cache_hit_returns_cached_payload_with_source() {
        let cache = Arc::new(InMemoryCache::new());
        cache
            .set_price("SKU001", json!({"sku": "SKU001", "recommended_price": 93.10}))
            .await
            .unwrap();
        let service = service_with(cache);

        let result = service.get_recommended_price("SKU001").await.unwrap();
        assert_eq!(result["source"], "cache");
        assert_eq!(result["recommended_price"], 93.10);
    }

    #[tokio::test]
    async fn cache_miss_falls_back_to_static_table() {
        let cache = Arc::new(InMemoryCache::new());
        let service = service_with(cache);

        let result = service.get_recommended_price("SKU001").await.unwrap();
        assert_eq!(result["source"], "fallback");
        assert_eq!(result["recommended_price"], 100.00);
        assert_eq!(result["confidence"], 0.3);
    }

    #[tokio::test]
    async fn unhealthy_cache_is_bypassed_even_on_a_populated_key() {
        let cache = Arc::new(InMemoryCache::new());
        cache
            .set_price("SKU002", json!({"sku": "SKU002", "recommended_price": 210.0}))
            .await
            .unwrap();
        cache.set_healthy(false);
        let service = service_with(cache);

        let result = service.get_recommended_price("SKU002").await.unwrap();
        assert_eq!(result["source"], "fallback");
        assert_eq!(result["recommended_price"], 250.00);
    }

    #[tokio::test]
    async fn unknown_sku_with_no_cache_entry_and_no_fallback_is_none() {
        let cache = Arc::new(InMemoryCache::new());
        let service = service_with(cache);

        assert!(service.get_recommended_price("SKU999").await.is_none());
    }

    #[tokio::test]
    async fn batch_lookup_only_returns_skus_with_a_result() {
        let cache = Arc::new(InMemoryCache::new());
        let service = service_with(cache);

        let skus = vec!["SKU001".to_string(), "UNKNOWN".to_string()];
        let result = service.get_batch_prices(&skus).await;

        assert_eq!(result.len(), 1);
        assert!(result.contains_key("SKU001"));
    }
}
