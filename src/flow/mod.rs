//! Flow sample ingestion and per-window aggregation.

pub mod aggregate;
pub mod sample;

pub use aggregate::{EdgeAggregate, EdgeMetrics};
pub use sample::{FlowSample, FlowWindow};
