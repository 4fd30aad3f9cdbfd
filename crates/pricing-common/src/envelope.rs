//! Canonical event envelope shared by every topic in the pipeline.
//!
//! Every message published to `raw_prices`, `recommended_prices`, or
//! `dead_letter_queue` is a JSON object of the shape
//! `{event_type, timestamp, data, metadata}`. Producers build one with
//! [`Envelope::new`], consumers parse one with [`Envelope::from_slice`] or
//! [`Envelope::from_str`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CommonError;

/// The standard JSON wrapper placed around every inter-service message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub data: T,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl<T> Envelope<T>
where
    T: Serialize,
{
    /// Build a new envelope, stamping the current UTC time.
    pub fn new(event_type: impl Into<String>, data: T) -> Self {
        Self {
            event_type: event_type.into(),
            timestamp: Utc::now(),
            data,
            metadata: HashMap::new(),
        }
    }

    /// Attach a metadata field, builder-style.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Serialize to a single-line JSON string.
    pub fn to_json(&self) -> Result<String, CommonError> {
        serde_json::to_string(self).map_err(CommonError::Serialize)
    }
}

impl<T> Envelope<T>
where
    T: for<'de> Deserialize<'de>,
{
    /// Parse an envelope from raw bytes.
    ///
    /// Fails with [`CommonError::MalformedEnvelope`] when `event_type`,
    /// `timestamp`, or `data` is absent or of the wrong shape — this is the
    /// one error kind that must never be routed to a DLQ (there is nothing
    /// to reconstruct the original message from if we can't even parse the
    /// envelope around it).
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CommonError> {
        serde_json::from_slice(bytes).map_err(|e| CommonError::MalformedEnvelope(e.to_string()))
    }

    /// Parse an envelope from a UTF-8 string.
    pub fn from_str(s: &str) -> Result<Self, CommonError> {
        Self::from_slice(s.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize as _;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Payload {
        sku: String,
        price: f64,
    }

    #[test]
    fn round_trips_through_json() {
        let original = Envelope::new(
            "raw_prices",
            Payload {
                sku: "SKU001".to_string(),
                price: 99.99,
            },
        )
        .with_metadata("source", "test");

        let json = original.to_json().unwrap();
        let parsed: Envelope<Payload> = Envelope::from_str(&json).unwrap();

        assert_eq!(parsed.event_type, original.event_type);
        assert_eq!(parsed.data, original.data);
        assert_eq!(parsed.metadata.get("source"), Some(&"test".to_string()));
    }

    #[test]
    fn rejects_missing_event_type() {
        let raw = r#"{"timestamp":"2024-01-01T00:00:00Z","data":{"sku":"SKU001","price":1.0}}"#;
        let err = Envelope::<Payload>::from_str(raw).unwrap_err();
        assert!(matches!(err, CommonError::MalformedEnvelope(_)));
    }

    #[test]
    fn rejects_missing_data() {
        let raw = r#"{"event_type":"raw_prices","timestamp":"2024-01-01T00:00:00Z"}"#;
        let err = Envelope::<Payload>::from_str(raw).unwrap_err();
        assert!(matches!(err, CommonError::MalformedEnvelope(_)));
    }

    #[test]
    fn rejects_garbage_json() {
        let err = Envelope::<Payload>::from_str("not json").unwrap_err();
        assert!(matches!(err, CommonError::MalformedEnvelope(_)));
    }
}
