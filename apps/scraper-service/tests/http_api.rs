//! HTTP surface integration tests for the scraper service.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use scraper_service::fetcher::Fetcher;
use scraper_service::http::{create_router, AppState};
use scraper_service::producer::RawPriceProducer;
use tower::ServiceExt;

fn test_state() -> AppState {
    AppState {
        fetcher: Arc::new(Fetcher::new(50, Duration::from_secs(5))),
        producer: Arc::new(
            RawPriceProducer::new("127.0.0.1:1", "raw_prices").expect("producer config is local only"),
        ),
    }
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let app = create_router(test_state());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn scrape_single_returns_prices_for_known_sku() {
    let app = create_router(test_state());
    let body = serde_json::json!({ "sku": "SKU001" }).to_string();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/scrape/single")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["sku"], "SKU001");
    assert!(json["scrape_count"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn scrape_batch_returns_only_skus_with_data() {
    let app = create_router(test_state());
    let body = serde_json::json!({ "skus": ["SKU001", "SKU002"] }).to_string();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/scrape/batch")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(json.get("SKU001").is_some());
    assert!(json.get("SKU002").is_some());
}
