//! HTTP surface for the scraper service.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::error::ScraperError;
use crate::fetcher::{CompetitorPrice, Fetcher};
use crate::producer::RawPriceProducer;

/// Shared application state for every handler.
#[derive(Clone)]
pub struct AppState {
    pub fetcher: Arc<Fetcher>,
    pub producer: Arc<RawPriceProducer>,
}

#[derive(Debug, Deserialize)]
pub struct ScrapeSingleRequest {
    pub sku: String,
    #[serde(default)]
    pub competitor_ids: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ScrapeBatchRequest {
    pub skus: Vec<String>,
    #[serde(default)]
    pub competitor_ids: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct PriceScrapeResponse {
    pub sku: String,
    pub prices: Vec<CompetitorPrice>,
    pub scrape_count: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CompetitorsResponse {
    pub competitors: Vec<&'static str>,
    pub total: usize,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/competitors", get(list_competitors))
        .route("/scrape/single", post(scrape_single))
        .route("/scrape/batch", post(scrape_batch))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "scraper",
    })
}

async fn list_competitors(State(state): State<AppState>) -> Json<CompetitorsResponse> {
    let competitors = state.fetcher.known_competitors();
    Json(CompetitorsResponse {
        total: competitors.len(),
        competitors,
    })
}

async fn scrape_single(
    State(state): State<AppState>,
    Json(request): Json<ScrapeSingleRequest>,
) -> Result<Json<PriceScrapeResponse>, ScraperError> {
    let prices = state
        .fetcher
        .scrape(&request.sku, request.competitor_ids.as_deref())
        .await;

    if prices.is_empty() {
        return Err(ScraperError::NotFound(request.sku));
    }

    if let Err(e) = state.producer.publish(&request.sku, &prices).await {
        tracing::error!(sku = %request.sku, error = %e, "failed to publish raw price event");
    }

    Ok(Json(PriceScrapeResponse {
        sku: request.sku,
        scrape_count: prices.len(),
        prices,
    }))
}

async fn scrape_batch(
    State(state): State<AppState>,
    Json(request): Json<ScrapeBatchRequest>,
) -> Json<HashMap<String, PriceScrapeResponse>> {
    let results = state
        .fetcher
        .scrape_batch(&request.skus, request.competitor_ids.as_deref())
        .await;

    let mut response = HashMap::with_capacity(results.len());
    for (sku, prices) in results {
        if let Err(e) = state.producer.publish(&sku, &prices).await {
            tracing::error!(%sku, error = %e, "failed to publish raw price event");
        }
        response.insert(
            sku.clone(),
            PriceScrapeResponse {
                sku,
                scrape_count: prices.len(),
                prices,
            },
        );
    }

    Json(response)
}
