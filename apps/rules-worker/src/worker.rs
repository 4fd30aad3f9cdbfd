//! Kafka consumer loop driving messages through the rules engine.
//!
//! Per-message state machine: `Received -> Parsed -> Evaluated -> Published
//! -> Acked`. Any transition failure other than a malformed envelope routes
//! the original bytes to the dead letter queue with the error string, then
//! acknowledges the upstream message — no in-process retry is attempted,
//! DLQ inspection is the retry path. A malformed envelope (bad JSON, or
//! missing `event_type`/`data`) cannot be usefully reparsed, so it is
//! logged and dropped instead of dead-lettered.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::StreamExt;
use pricing_common::{CommonError, DlqRecord, Envelope, RawPriceData, RecommendedPriceData};
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord};

use crate::config::Config;
use crate::engine::{margin_pct, PriceContext, PricingRulesEngine};
use crate::error::ProcessingError;

const DEFAULT_CURRENT_PRICE: f64 = 100.0;
const DEFAULT_COST: f64 = 50.0;
const DEFAULT_INVENTORY_LEVEL: i64 = 100;
const DEFAULT_DAYS_IN_STOCK: i64 = 30;
const DEFAULT_DEMAND_FORECAST: f64 = 0.5;

/// Consumes `raw_prices`, evaluates each message against the rules engine,
/// and publishes the outcome to either `recommended_prices` or
/// `dead_letter_queue`.
pub struct RulesWorker {
    engine: Arc<PricingRulesEngine>,
    consumer: StreamConsumer,
    prices_producer: FutureProducer,
    dlq_producer: FutureProducer,
    prices_topic: String,
    dlq_topic: String,
    min_margin: f64,
    max_margin: f64,
}

impl RulesWorker {
    pub fn new(config: &Config, engine: Arc<PricingRulesEngine>) -> anyhow::Result<Self> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.kafka_broker)
            .set("group.id", "rules_engine_group")
            .set("auto.offset.reset", "earliest")
            .set("enable.auto.commit", "false")
            .create()?;
        consumer.subscribe(&[config.kafka_scraper_topic.as_str()])?;

        let prices_producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.kafka_broker)
            .set("message.timeout.ms", "5000")
            .create()?;
        let dlq_producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.kafka_broker)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self {
            engine,
            consumer,
            prices_producer,
            dlq_producer,
            prices_topic: config.kafka_prices_topic.clone(),
            dlq_topic: config.kafka_dlq_topic.clone(),
            min_margin: config.min_margin,
            max_margin: config.max_margin,
        })
    }

    /// Run until the process receives a shutdown signal. A produce failure
    /// that survives the producer's own retry budget is treated as fatal —
    /// the pipeline is broken and the process exits rather than silently
    /// losing messages.
    pub async fn run(self) -> anyhow::Result<()> {
        tracing::info!("rules worker started, consuming from raw_prices");
        let mut stream = self.consumer.stream();

        loop {
            tokio::select! {
                biased;
                () = pricing_common::shutdown::signal() => {
                    tracing::info!("rules worker shutting down");
                    return Ok(());
                }
                next = stream.next() => {
                    let Some(message) = next else {
                        tracing::warn!("kafka stream ended");
                        return Ok(());
                    };
                    self.handle(message).await?;
                }
            }
        }
    }

    async fn handle(&self, message: rdkafka::error::KafkaResult<rdkafka::message::BorrowedMessage<'_>>) -> anyhow::Result<()> {
        let message = match message {
            Ok(m) => m,
            Err(e) => {
                tracing::error!(error = %e, "kafka consume error");
                return Ok(());
            }
        };

        let Some(payload) = message.payload() else {
            tracing::warn!("received message with empty payload, dropping");
            self.commit(&message);
            return Ok(());
        };

        match self.process(payload).await {
            Ok(()) => {}
            Err(ProcessingError::MalformedEnvelope(msg)) => {
                tracing::warn!(error = %msg, "dropping malformed envelope");
            }
            Err(ProcessingError::ProduceFailed(msg)) => {
                tracing::error!(error = %msg, "downstream produce failed after retries, pipeline is broken");
                anyhow::bail!("downstream produce failed: {msg}");
            }
            Err(e) => {
                if let Err(dlq_err) = self.send_to_dlq(payload, &e.to_string()).await {
                    tracing::error!(error = %dlq_err, "failed to write to dead letter queue");
                    anyhow::bail!("dlq produce failed: {dlq_err}");
                }
            }
        }

        self.commit(&message);
        Ok(())
    }

    fn commit(&self, message: &rdkafka::message::BorrowedMessage<'_>) {
        if let Err(e) = self.consumer.commit_message(message, CommitMode::Async) {
            tracing::error!(error = %e, "failed to commit kafka offset");
        }
    }

    async fn process(&self, raw: &[u8]) -> Result<(), ProcessingError> {
        let envelope = Envelope::<RawPriceData>::from_slice(raw).map_err(|e| match e {
            CommonError::MalformedEnvelope(msg) => ProcessingError::MalformedEnvelope(msg),
            CommonError::Serialize(err) => ProcessingError::MalformedEnvelope(err.to_string()),
        })?;

        if envelope.event_type != "raw_prices" {
            tracing::warn!(event_type = %envelope.event_type, "ignoring unrecognized event type");
            return Ok(());
        }

        let data = envelope.data;
        let sku = data
            .sku
            .ok_or_else(|| ProcessingError::MissingField("sku".to_string()))?;

        let cost = data.cost.unwrap_or(DEFAULT_COST);
        if cost < 0.0 {
            return Err(ProcessingError::PreconditionViolation(format!(
                "cost must be non-negative, got {cost}"
            )));
        }

        let context = PriceContext {
            sku: sku.clone(),
            current_price: data.current_price.unwrap_or(DEFAULT_CURRENT_PRICE),
            cost,
            competitor_prices: data.competitor_prices.clone(),
            inventory_level: data.inventory_level.unwrap_or(DEFAULT_INVENTORY_LEVEL),
            days_in_stock: data.days_in_stock.unwrap_or(DEFAULT_DAYS_IN_STOCK),
            demand_forecast: data
                .demand_forecast
                .unwrap_or(DEFAULT_DEMAND_FORECAST)
                .clamp(0.0, 1.0),
            min_margin: self.min_margin,
            max_margin: self.max_margin,
        };

        let (price, reason, confidence) = self.engine.calculate_price(&context);
        let margin = margin_pct(price, context.cost);

        tracing::info!(%sku, recommended_price = price, %reason, "price decision computed");

        let decision = RecommendedPriceData {
            sku: sku.clone(),
            current_price: context.current_price,
            recommended_price: price,
            margin_pct: margin,
            confidence,
            reason,
            competitor_prices: context.competitor_prices,
            created_at: Utc::now(),
        };

        self.publish_decision(&sku, decision).await
    }

    async fn publish_decision(&self, sku: &str, decision: RecommendedPriceData) -> Result<(), ProcessingError> {
        let envelope = Envelope::new("recommended_price", decision);
        let payload = envelope
            .to_json()
            .map_err(|e| ProcessingError::ProduceFailed(e.to_string()))?;

        self.prices_producer
            .send(
                FutureRecord::to(&self.prices_topic).payload(&payload).key(sku),
                Duration::from_secs(5),
            )
            .await
            .map_err(|(e, _)| ProcessingError::ProduceFailed(e.to_string()))?;

        Ok(())
    }

    async fn send_to_dlq(&self, original: &[u8], error: &str) -> Result<(), ProcessingError> {
        let record = DlqRecord {
            original_message: String::from_utf8_lossy(original).to_string(),
            error: error.to_string(),
            timestamp: Utc::now(),
            processing_service: "rules_engine".to_string(),
        };

        let payload = serde_json::to_string(&record)
            .map_err(|e| ProcessingError::ProduceFailed(e.to_string()))?;

        self.dlq_producer
            .send(
                FutureRecord::to(&self.dlq_topic).payload(&payload),
                Duration::from_secs(5),
            )
            .await
            .map_err(|(e, _)| ProcessingError::ProduceFailed(e.to_string()))?;

        tracing::info!(%error, "message routed to dead letter queue");
        Ok(())
    }
}
