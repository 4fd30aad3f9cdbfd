//! Error kinds for the pricing API's HTTP surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PricingApiError {
    /// No cache entry and no fallback entry for the SKU. The read path
    /// must never surface a 5xx from a cache miss — this is the only
    /// negative outcome of a lookup.
    #[error("no price available for SKU {0}")]
    NotFound(String),

    /// Cache write failed (connection down, serialization error).
    #[error("cache write failed: {0}")]
    CacheWrite(String),
}

impl IntoResponse for PricingApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::CacheWrite(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
