//! Payload types carried inside [`crate::Envelope`] on each topic.
//!
//! These are the `data` shapes shared verbatim between
//! producers and consumers so the wire format only needs to be defined once.

use serde::{Deserialize, Serialize};

/// `data` payload of a `raw_prices` envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPriceData {
    /// Absent when the producer couldn't determine a SKU at all; the
    /// rules worker treats that as fatal and routes the message to the
    /// dead letter queue rather than silently dropping it.
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub competitor_prices: Vec<f64>,
    #[serde(default)]
    pub inventory_level: Option<i64>,
    #[serde(default)]
    pub days_in_stock: Option<i64>,
    #[serde(default)]
    pub demand_forecast: Option<f64>,
}

/// `data` payload of a `recommended_price` envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedPriceData {
    pub sku: String,
    pub current_price: f64,
    pub recommended_price: f64,
    pub margin_pct: f64,
    pub confidence: f64,
    pub reason: String,
    pub competitor_prices: Vec<f64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A dead-lettered message, carrying enough context to reconstruct the
/// failure from the DLQ alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DlqRecord {
    pub original_message: String,
    pub error: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub processing_service: String,
}
