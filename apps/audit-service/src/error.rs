//! Error kinds for the audit API's HTTP surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditApiError {
    #[error("no decisions recorded for SKU {0}")]
    NoDecisions(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Outcome of recording one consumed message. `Malformed` and `Constraint`
/// are both poison: the message itself is bad and redelivery will fail
/// identically forever, so both are logged and the offset is committed
/// anyway. `Transient` is the database's fault, not the message's, so the
/// offset is left uncommitted and the broker redelivers once it recovers.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("transient database error: {0}")]
    Transient(String),
}

impl From<sqlx::Error> for RecordError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err)
                if db_err.is_unique_violation()
                    || db_err.is_check_violation()
                    || db_err.is_foreign_key_violation() =>
            {
                RecordError::Constraint(err.to_string())
            }
            _ => RecordError::Transient(err.to_string()),
        }
    }
}

impl IntoResponse for AuditApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NoDecisions(_) => StatusCode::NOT_FOUND,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
