//! Two independent Kafka consumers, run concurrently in one process:
//! `recommended_prices` into `pricing_decisions`, `dead_letter_queue` into
//! `pricing_failures`. A transient database error (connection, pool,
//! timeout) is logged and the message is left uncommitted so the broker
//! redelivers it. Malformed JSON and constraint violations are both
//! poison: the message itself is bad and will fail identically on every
//! redelivery, so both are logged and dropped instead.

use futures::StreamExt;
use pricing_common::{DlqRecord, Envelope, RecommendedPriceData};
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::{BorrowedMessage, Message};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::Config;
use crate::db;
use crate::error::RecordError;

pub struct AuditWorker {
    pool: PgPool,
    price_consumer: StreamConsumer,
    failure_consumer: StreamConsumer,
}

impl AuditWorker {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .connect(&config.database_url)
            .await?;
        db::run_migrations(&pool).await?;

        let price_consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.kafka_broker)
            .set("group.id", "audit_service_prices")
            .set("auto.offset.reset", "earliest")
            .set("enable.auto.commit", "false")
            .create()?;
        price_consumer.subscribe(&[config.kafka_prices_topic.as_str()])?;

        let failure_consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.kafka_broker)
            .set("group.id", "audit_service_failures")
            .set("auto.offset.reset", "earliest")
            .set("enable.auto.commit", "false")
            .create()?;
        failure_consumer.subscribe(&[config.kafka_dlq_topic.as_str()])?;

        Ok(Self {
            pool,
            price_consumer,
            failure_consumer,
        })
    }

    pub async fn run(self) -> anyhow::Result<()> {
        tracing::info!("audit worker started, consuming recommended_prices and dead_letter_queue");

        let prices = Self::process_prices(self.price_consumer, self.pool.clone());
        let failures = Self::process_failures(self.failure_consumer, self.pool.clone());

        tokio::select! {
            biased;
            () = pricing_common::shutdown::signal() => {
                tracing::info!("audit worker shutting down");
                Ok(())
            }
            result = async { tokio::try_join!(prices, failures) } => {
                result.map(|_| ())
            }
        }
    }

    async fn process_prices(consumer: StreamConsumer, pool: PgPool) -> anyhow::Result<()> {
        let mut stream = consumer.stream();
        while let Some(message) = stream.next().await {
            let message = match message {
                Ok(m) => m,
                Err(e) => {
                    tracing::error!(error = %e, "kafka consume error on recommended_prices");
                    continue;
                }
            };

            let Some(payload) = message.payload() else {
                commit(&consumer, &message);
                continue;
            };

            match record_price_decision(&pool, payload).await {
                Ok(()) => commit(&consumer, &message),
                Err(RecordError::Malformed(msg)) => {
                    tracing::warn!(error = %msg, "dropping malformed price decision message");
                    commit(&consumer, &message);
                }
                Err(RecordError::Constraint(msg)) => {
                    tracing::warn!(error = %msg, "dropping price decision message that violated a constraint");
                    commit(&consumer, &message);
                }
                Err(RecordError::Transient(msg)) => {
                    tracing::error!(error = %msg, "transient database error recording decision, leaving uncommitted");
                }
            }
        }
        Ok(())
    }

    async fn process_failures(consumer: StreamConsumer, pool: PgPool) -> anyhow::Result<()> {
        let mut stream = consumer.stream();
        while let Some(message) = stream.next().await {
            let message = match message {
                Ok(m) => m,
                Err(e) => {
                    tracing::error!(error = %e, "kafka consume error on dead_letter_queue");
                    continue;
                }
            };

            let Some(payload) = message.payload() else {
                commit(&consumer, &message);
                continue;
            };

            match record_failure(&pool, payload).await {
                Ok(()) => commit(&consumer, &message),
                Err(RecordError::Malformed(msg)) => {
                    tracing::warn!(error = %msg, "dropping malformed dlq message");
                    commit(&consumer, &message);
                }
                Err(RecordError::Constraint(msg)) => {
                    tracing::warn!(error = %msg, "dropping dlq message that violated a constraint");
                    commit(&consumer, &message);
                }
                Err(RecordError::Transient(msg)) => {
                    tracing::error!(error = %msg, "transient database error recording failure, leaving uncommitted");
                }
            }
        }
        Ok(())
    }
}

fn commit(consumer: &StreamConsumer, message: &BorrowedMessage<'_>) {
    if let Err(e) = consumer.commit_message(message, CommitMode::Async) {
        tracing::error!(error = %e, "failed to commit kafka offset");
    }
}

async fn record_price_decision(pool: &PgPool, payload: &[u8]) -> Result<(), RecordError> {
    let envelope = Envelope::<RecommendedPriceData>::from_slice(payload)
        .map_err(|e| RecordError::Malformed(e.to_string()))?;
    let data = envelope.data;

    db::record_pricing_decision(
        pool,
        &data.sku,
        data.current_price,
        data.recommended_price,
        data.margin_pct,
        data.confidence,
        &data.reason,
        &data.competitor_prices,
    )
    .await?;

    tracing::debug!(sku = %data.sku, "price decision recorded");
    Ok(())
}

async fn record_failure(pool: &PgPool, payload: &[u8]) -> Result<(), RecordError> {
    let record: DlqRecord =
        serde_json::from_slice(payload).map_err(|e| RecordError::Malformed(e.to_string()))?;

    db::record_failure(
        pool,
        &record.error,
        &record.processing_service,
        None,
        Some(&record.original_message),
    )
    .await?;

    tracing::debug!(service = %record.processing_service, "failure recorded");
    Ok(())
}
