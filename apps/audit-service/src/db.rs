//! PostgreSQL persistence for pricing decisions and pipeline failures.
//!
//! Queries are issued at runtime via `sqlx::query_as`/`sqlx::query`
//! rather than the compile-time `query!` macro family, since there is no
//! live database reachable at build time to verify against.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;

/// One row in `pricing_decisions`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PricingDecisionAudit {
    pub id: i64,
    pub sku: String,
    pub current_price: f64,
    pub recommended_price: f64,
    pub margin_pct: f64,
    pub confidence: f64,
    pub reason: Option<String>,
    pub competitor_prices: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// One row in `pricing_failures`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PricingFailureLog {
    pub id: i64,
    pub sku: Option<String>,
    pub error_message: String,
    pub original_message: Option<Value>,
    pub processing_service: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditStatistics {
    pub total_decisions: i64,
    pub total_failures: i64,
    pub avg_confidence: f64,
    pub avg_margin: f64,
}

/// Runs the pipeline's two audit tables into existence. Called once at
/// worker/API startup; idempotent.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pricing_decisions (
            id BIGSERIAL PRIMARY KEY,
            sku VARCHAR(50) NOT NULL,
            current_price DOUBLE PRECISION NOT NULL,
            recommended_price DOUBLE PRECISION NOT NULL,
            margin_pct DOUBLE PRECISION NOT NULL,
            confidence DOUBLE PRECISION NOT NULL,
            reason VARCHAR(500),
            competitor_prices JSONB,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            applied INTEGER NOT NULL DEFAULT 0,
            applied_at TIMESTAMPTZ
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_sku_created ON pricing_decisions (sku, created_at)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_created_at ON pricing_decisions (created_at)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pricing_failures (
            id BIGSERIAL PRIMARY KEY,
            sku VARCHAR(50),
            error_message VARCHAR(1000) NOT NULL,
            original_message JSONB,
            processing_service VARCHAR(100) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_service_created ON pricing_failures (processing_service, created_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn record_pricing_decision(
    pool: &PgPool,
    sku: &str,
    current_price: f64,
    recommended_price: f64,
    margin_pct: f64,
    confidence: f64,
    reason: &str,
    competitor_prices: &[f64],
) -> Result<i64, sqlx::Error> {
    const QUERY: &str = r#"
        INSERT INTO pricing_decisions
            (sku, current_price, recommended_price, margin_pct, confidence, reason, competitor_prices)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
    "#;

    let (id,): (i64,) = sqlx::query_as(QUERY)
        .bind(sku)
        .bind(current_price)
        .bind(recommended_price)
        .bind(margin_pct)
        .bind(confidence)
        .bind(reason)
        .bind(serde_json::to_value(competitor_prices).unwrap_or(Value::Null))
        .fetch_one(pool)
        .await?;

    Ok(id)
}

pub async fn record_failure(
    pool: &PgPool,
    error_message: &str,
    processing_service: &str,
    sku: Option<&str>,
    original_message: Option<&str>,
) -> Result<i64, sqlx::Error> {
    const QUERY: &str = r#"
        INSERT INTO pricing_failures (sku, error_message, original_message, processing_service)
        VALUES ($1, $2, $3, $4)
        RETURNING id
    "#;

    let (id,): (i64,) = sqlx::query_as(QUERY)
        .bind(sku)
        .bind(error_message)
        .bind(original_message.map(Value::String))
        .bind(processing_service)
        .fetch_one(pool)
        .await?;

    Ok(id)
}

pub async fn get_decisions_by_sku(
    pool: &PgPool,
    sku: &str,
    limit: i64,
) -> Result<Vec<PricingDecisionAudit>, sqlx::Error> {
    const QUERY: &str = r#"
        SELECT id, sku, current_price, recommended_price, margin_pct, confidence,
               reason, competitor_prices, created_at
        FROM pricing_decisions
        WHERE sku = $1
        ORDER BY created_at DESC
        LIMIT $2
    "#;

    sqlx::query_as(QUERY).bind(sku).bind(limit).fetch_all(pool).await
}

pub async fn get_recent_failures(
    pool: &PgPool,
    hours: i64,
    limit: i64,
) -> Result<Vec<PricingFailureLog>, sqlx::Error> {
    const QUERY: &str = r#"
        SELECT id, sku, error_message, original_message, processing_service, created_at
        FROM pricing_failures
        WHERE created_at >= now() - ($1 || ' hours')::interval
        ORDER BY created_at DESC
        LIMIT $2
    "#;

    sqlx::query_as(QUERY)
        .bind(hours.to_string())
        .bind(limit)
        .fetch_all(pool)
        .await
}

pub async fn get_statistics(pool: &PgPool) -> Result<AuditStatistics, sqlx::Error> {
    const QUERY: &str = r#"
        SELECT
            (SELECT COUNT(*) FROM pricing_decisions) AS total_decisions,
            (SELECT COUNT(*) FROM pricing_failures) AS total_failures,
            (SELECT COALESCE(AVG(confidence), 0.0) FROM pricing_decisions) AS avg_confidence,
            (SELECT COALESCE(AVG(margin_pct), 0.0) FROM pricing_decisions) AS avg_margin
    "#;

    let (total_decisions, total_failures, avg_confidence, avg_margin): (i64, i64, f64, f64) =
        sqlx::query_as(QUERY).fetch_one(pool).await?;

    Ok(AuditStatistics {
        total_decisions,
        total_failures,
        avg_confidence,
        avg_margin,
    })
}
