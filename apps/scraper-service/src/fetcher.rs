//! Async fan-out fetcher over the competitor registry.
//!
//! A fixed competitor registry, a single global semaphore bounding
//! in-flight outbound requests, and a per-fetch simulated latency and
//! availability check stand in for real per-competitor HTTP clients: this
//! is a dispatcher over pluggable per-competitor fetchers, not a real
//! HTML/JSON scraper.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use tokio::sync::Semaphore;

/// A single competitor's registry entry: where we'd call, and with what
/// credential, if this were a live integration.
#[derive(Debug, Clone)]
pub struct CompetitorEntry {
    pub url: String,
    pub auth_token: String,
}

/// Static competitor registry. Unknown competitor ids passed to
/// [`Fetcher::scrape`] are silently skipped.
fn competitor_registry() -> HashMap<&'static str, CompetitorEntry> {
    HashMap::from([
        (
            "amazon",
            CompetitorEntry {
                url: "https://api.amazon.example/prices".to_string(),
                auth_token: "test_key_amazon".to_string(),
            },
        ),
        (
            "ebay",
            CompetitorEntry {
                url: "https://api.ebay.example/prices".to_string(),
                auth_token: "test_key_ebay".to_string(),
            },
        ),
        (
            "mercado_livre",
            CompetitorEntry {
                url: "https://api.mercadolivre.example/prices".to_string(),
                auth_token: "test_key_ml".to_string(),
            },
        ),
        (
            "shopee",
            CompetitorEntry {
                url: "https://api.shopee.example/prices".to_string(),
                auth_token: "test_key_shopee".to_string(),
            },
        ),
    ])
}

/// Known demo SKUs' simulated base price, used by the reference fetch
/// simulation to produce a stable-ish price per SKU.
fn base_price_for_sku(sku: &str) -> f64 {
    match sku {
        "SKU001" => 100.00,
        "SKU002" => 250.00,
        "SKU003" => 50.00,
        "SKU004" => 1000.00,
        _ => 100.00,
    }
}

/// Per-competitor variation band applied to the base price.
fn variation_band(competitor_id: &str) -> (f64, f64) {
    match competitor_id {
        "amazon" => (0.95, 1.05),
        "ebay" => (0.90, 1.10),
        "mercado_livre" => (0.85, 1.15),
        "shopee" => (0.92, 1.08),
        _ => (1.0, 1.0),
    }
}

/// A price observation for one `(sku, competitor)` pair.
#[derive(Debug, Clone, Serialize)]
pub struct CompetitorPrice {
    pub product_sku: String,
    pub competitor_id: String,
    pub price: f64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub availability: bool,
    pub source_url: String,
}

/// Async fan-out fetcher with a single global concurrency cap.
pub struct Fetcher {
    registry: HashMap<&'static str, CompetitorEntry>,
    semaphore: Arc<Semaphore>,
    timeout: Duration,
}

impl Fetcher {
    #[must_use]
    pub fn new(max_concurrent_requests: usize, timeout: Duration) -> Self {
        Self {
            registry: competitor_registry(),
            semaphore: Arc::new(Semaphore::new(max_concurrent_requests.max(1))),
            timeout,
        }
    }

    /// Known competitor ids, for the `GET /competitors` operator endpoint.
    #[must_use]
    pub fn known_competitors(&self) -> Vec<&'static str> {
        self.registry.keys().copied().collect()
    }

    /// Fetch prices for one SKU across the given competitors (or all known
    /// competitors if `None`). Unknown competitor ids are skipped. Each
    /// fetch failure (timeout, simulated or otherwise) is swallowed and
    /// logged — it never propagates, it just contributes no entry to the
    /// result.
    pub async fn scrape(
        &self,
        sku: &str,
        competitor_ids: Option<&[String]>,
    ) -> Vec<CompetitorPrice> {
        let ids: Vec<&str> = match competitor_ids {
            Some(ids) => ids.iter().map(String::as_str).collect(),
            None => self.registry.keys().copied().collect(),
        };

        let futures = ids.into_iter().filter_map(|id| {
            self.registry.get(id).map(|entry| {
                let sku = sku.to_string();
                let id = id.to_string();
                let entry = entry.clone();
                let semaphore = Arc::clone(&self.semaphore);
                let timeout = self.timeout;
                async move { fetch_one(semaphore, timeout, sku, id, entry).await }
            })
        });

        futures::future::join_all(futures)
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    /// Fan out across SKUs with full parallelism; the only bound is the
    /// shared semaphore over total outstanding HTTP operations.
    pub async fn scrape_batch(
        &self,
        skus: &[String],
        competitor_ids: Option<&[String]>,
    ) -> HashMap<String, Vec<CompetitorPrice>> {
        let futures = skus.iter().map(|sku| async move {
            let prices = self.scrape(sku, competitor_ids).await;
            (sku.clone(), prices)
        });

        futures::future::join_all(futures)
            .await
            .into_iter()
            .filter(|(_, prices)| !prices.is_empty())
            .collect()
    }
}

async fn fetch_one(
    semaphore: Arc<Semaphore>,
    timeout: Duration,
    sku: String,
    competitor_id: String,
    entry: CompetitorEntry,
) -> Option<CompetitorPrice> {
    let _permit = semaphore.acquire().await.ok()?;

    let result = tokio::time::timeout(timeout, simulate_fetch(&sku, &competitor_id)).await;

    match result {
        Ok(Some(price)) => Some(CompetitorPrice {
            product_sku: sku,
            competitor_id: competitor_id.clone(),
            price,
            timestamp: Utc::now(),
            availability: simulate_availability(),
            source_url: format!("{}?sku={}", entry.url, sku_placeholder()),
        }),
        Ok(None) => {
            tracing::warn!(%sku, %competitor_id, "competitor fetch returned no data");
            None
        }
        Err(_) => {
            tracing::warn!(%sku, %competitor_id, "competitor fetch timed out");
            None
        }
    }
}

fn sku_placeholder() -> &'static str {
    "{sku}"
}

/// Simulated competitor call: random latency, then a per-competitor-biased
/// price. Stands in for a real HTTP call; parsing real competitor
/// storefronts is out of scope here.
async fn simulate_fetch(sku: &str, competitor_id: &str) -> Option<f64> {
    let latency_ms = rand::rng().random_range(100..=300);
    tokio::time::sleep(Duration::from_millis(latency_ms)).await;

    let base = base_price_for_sku(sku);
    let (lo, hi) = variation_band(competitor_id);
    let multiplier = rand::rng().random_range(lo..=hi);
    Some(round_cents(base * multiplier))
}

/// 75% simulated availability.
fn simulate_availability() -> bool {
    rand::rng().random_range(0..4) != 0
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scrape_returns_entries_for_known_competitors() {
        let fetcher = Fetcher::new(10, Duration::from_secs(5));
        let prices = fetcher.scrape("SKU001", None).await;
        assert!(!prices.is_empty());
        for p in &prices {
            assert_eq!(p.product_sku, "SKU001");
            assert!(p.price > 0.0);
        }
    }

    #[tokio::test]
    async fn scrape_skips_unknown_competitors() {
        let fetcher = Fetcher::new(10, Duration::from_secs(5));
        let ids = vec!["not_a_real_competitor".to_string()];
        let prices = fetcher.scrape("SKU001", Some(&ids)).await;
        assert!(prices.is_empty());
    }

    #[tokio::test]
    async fn scrape_batch_only_returns_skus_with_data() {
        let fetcher = Fetcher::new(10, Duration::from_secs(5));
        let skus = vec!["SKU001".to_string(), "SKU002".to_string()];
        let result = fetcher.scrape_batch(&skus, None).await;
        assert_eq!(result.len(), 2);
        assert!(result.contains_key("SKU001"));
        assert!(result.contains_key("SKU002"));
    }
}
