//! Error kinds shared across every service in the pipeline.
//!
//! These map onto the error-handling policy: each variant here
//! carries the policy decision (DLQ vs. drop vs. retry-then-crash) as part
//! of its identity rather than leaving callers to infer it from a string.

use thiserror::Error;

/// Errors that can occur while building or parsing a pipeline envelope.
#[derive(Debug, Error)]
pub enum CommonError {
    /// The envelope itself could not be parsed — missing `event_type`,
    /// `timestamp`, or `data`, or invalid JSON. Never routed to a DLQ: there
    /// is no reliable way to reconstruct the failure from bytes that don't
    /// even parse as the envelope shape.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Failed to serialize an outgoing envelope.
    #[error("failed to serialize envelope: {0}")]
    Serialize(#[source] serde_json::Error),
}
