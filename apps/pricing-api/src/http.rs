//! HTTP surface for the pricing API. Every route here is on the
//! latency-critical read path or a thin write-through to the cache; none
//! of them touch the broker.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::trace::TraceLayer;

use crate::cache::CacheBackend;
use crate::error::PricingApiError;
use crate::service::PricingService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PricingService>,
    pub cache: Arc<dyn CacheBackend>,
}

#[derive(Debug, Deserialize)]
pub struct BatchPriceRequest {
    pub skus: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchPriceResponse {
    pub prices: std::collections::HashMap<String, Value>,
    pub total_requested: usize,
    pub total_found: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub cache_healthy: bool,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/price/{sku}", get(get_price))
        .route("/prices/batch", post(get_batch_prices))
        .route("/price/{sku}/update", post(update_price))
        .route("/cache/clear", delete(clear_cache))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "pricing_api",
        cache_healthy: state.cache.is_healthy(),
    })
}

async fn get_price(
    State(state): State<AppState>,
    Path(sku): Path<String>,
) -> Result<Json<Value>, PricingApiError> {
    state
        .service
        .get_recommended_price(&sku)
        .await
        .map(Json)
        .ok_or(PricingApiError::NotFound(sku))
}

async fn get_batch_prices(
    State(state): State<AppState>,
    Json(request): Json<BatchPriceRequest>,
) -> Json<BatchPriceResponse> {
    let prices = state.service.get_batch_prices(&request.skus).await;
    Json(BatchPriceResponse {
        total_requested: request.skus.len(),
        total_found: prices.len(),
        prices,
    })
}

async fn update_price(
    State(state): State<AppState>,
    Path(sku): Path<String>,
    Json(data): Json<Value>,
) -> Json<Value> {
    let updated = state.service.update_cache_price(&sku, data).await;
    if updated {
        tracing::info!(%sku, "cache updated");
        Json(serde_json::json!({ "status": "updated", "sku": sku }))
    } else {
        tracing::warn!(%sku, "cache update failed");
        Json(serde_json::json!({ "status": "failed", "sku": sku }))
    }
}

async fn clear_cache(State(state): State<AppState>) -> Result<Json<Value>, PricingApiError> {
    state.cache.clear().await?;
    tracing::warn!("cache cleared");
    Ok(Json(serde_json::json!({ "status": "cache_cleared" })))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::cache::test_support::InMemoryCache;

    fn test_state(cache: Arc<InMemoryCache>) -> AppState {
        let cache: Arc<dyn CacheBackend> = cache;
        AppState {
            service: Arc::new(PricingService::new(Arc::clone(&cache))),
            cache,
        }
    }

    #[tokio::test]
    async fn get_price_returns_cached_value() {
        let cache = Arc::new(InMemoryCache::new());
        cache
            .set_price("SKU001", serde_json::json!({"sku": "SKU001", "recommended_price": 88.0}))
            .await
            .unwrap();
        let app = create_router(test_state(cache));

        let response = app
            .oneshot(Request::builder().uri("/price/SKU001").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["source"], "cache");
    }

    #[tokio::test]
    async fn get_price_falls_back_when_cache_is_empty() {
        let app = create_router(test_state(Arc::new(InMemoryCache::new())));

        let response = app
            .oneshot(Request::builder().uri("/price/SKU003").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["source"], "fallback");
    }

    #[tokio::test]
    async fn get_price_404s_on_unknown_sku() {
        let app = create_router(test_state(Arc::new(InMemoryCache::new())));

        let response = app
            .oneshot(Request::builder().uri("/price/NOPE").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
