//! Kafka producer publishing `RawPrice` envelopes to the `raw_prices` topic.

use std::time::Duration;

use pricing_common::{Envelope, RawPriceData};
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};

use crate::error::ScraperError;
use crate::fetcher::CompetitorPrice;

/// Thin wrapper over an `rdkafka` producer, publishing one `raw_prices`
/// envelope per scraped SKU.
pub struct RawPriceProducer {
    producer: FutureProducer,
    topic: String,
}

impl RawPriceProducer {
    pub fn new(broker: &str, topic: impl Into<String>) -> Result<Self, ScraperError> {
        let producer = ClientConfig::new()
            .set("bootstrap.servers", broker)
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| ScraperError::Publish(e.to_string()))?;

        Ok(Self {
            producer,
            topic: topic.into(),
        })
    }

    /// Publish a `raw_prices` envelope for `sku`, summarizing the
    /// competitor observations collected for it. Downstream defaults
    /// (current_price, cost, inventory, etc.) are filled in by the rules
    /// worker, so the scraper only needs to forward what it actually
    /// observed.
    pub async fn publish(
        &self,
        sku: &str,
        competitor_prices: &[CompetitorPrice],
    ) -> Result<(), ScraperError> {
        let data = RawPriceData {
            sku: Some(sku.to_string()),
            current_price: None,
            cost: None,
            competitor_prices: competitor_prices.iter().map(|p| p.price).collect(),
            inventory_level: None,
            days_in_stock: None,
            demand_forecast: None,
        };

        let envelope = Envelope::new("raw_prices", data);
        let payload = envelope
            .to_json()
            .map_err(|e| ScraperError::Publish(e.to_string()))?;

        self.producer
            .send(
                FutureRecord::to(&self.topic).payload(&payload).key(sku),
                Duration::from_secs(5),
            )
            .await
            .map_err(|(e, _)| ScraperError::Publish(e.to_string()))?;

        Ok(())
    }
}
