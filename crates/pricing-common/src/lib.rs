//! Shared building blocks for the dynamic pricing pipeline.
//!
//! Every inter-service message in the pipeline is wrapped in an [`envelope::Envelope`]
//! before it is published to a topic. This crate owns that schema plus the
//! telemetry and shutdown wiring common to all four pipeline services, so
//! none of them hand-roll their own JSON framing or logging setup.

pub mod envelope;
pub mod error;
pub mod schema;
pub mod shutdown;
pub mod telemetry;

pub use envelope::Envelope;
pub use error::CommonError;
pub use schema::{DlqRecord, RawPriceData, RecommendedPriceData};
