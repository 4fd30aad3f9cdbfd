//! Error kinds specific to rules-worker message processing.
//!
//! Each variant carries its own DLQ-routing policy, matching the pipeline's
//! error-handling table: malformed envelopes are logged and dropped (they
//! cannot be usefully reparsed), everything else that fails during
//! processing is dead-lettered with the original bytes intact.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Envelope JSON is malformed or missing `event_type`/`data`. Logged
    /// and dropped; never dead-lettered, since there is nothing usable to
    /// replay.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Envelope parsed but is missing the `sku` field. Fatal; routed to
    /// the DLQ with the original bytes.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// The rules engine's precondition was violated (`cost < 0`). Routed
    /// to the DLQ with the original bytes.
    #[error("engine precondition violation: {0}")]
    PreconditionViolation(String),

    /// Publishing the recommendation (or DLQ record) to the broker failed
    /// after the producer's configured retry attempts.
    #[error("downstream produce failed: {0}")]
    ProduceFailed(String),
}
