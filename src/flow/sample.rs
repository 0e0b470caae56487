//! Raw flow samples and the per-window sample store.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::topology::EdgeId;

/// One traffic observation on a single edge within a window.
///
/// `rate` is the observed throughput in units/sec, `latency` the
/// observed transit latency in milliseconds, and `errors` the absolute
/// number of failed units observed during the window. Several samples
/// per edge per window are normal: each concurrent sub-flow reports
/// independently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowSample {
    pub rate: f64,
    pub latency: f64,
    pub errors: f64,
}

impl FlowSample {
    pub fn new(rate: f64, latency: f64, errors: f64) -> Self {
        FlowSample {
            rate,
            latency,
            errors,
        }
    }
}

/// All samples observed during one time window, keyed by edge.
///
/// A window is append-only while it is current and is replaced
/// wholesale when the next window begins; nothing in the system
/// mutates samples inside an existing window.
#[derive(Debug, Clone, Default)]
pub struct FlowWindow {
    index: u64,
    samples: HashMap<EdgeId, Vec<FlowSample>>,
}

impl FlowWindow {
    pub fn new(index: u64) -> Self {
        FlowWindow {
            index,
            samples: HashMap::new(),
        }
    }

    /// Sequence number of this window.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Record one sample against an edge.
    pub fn record(&mut self, edge: EdgeId, sample: FlowSample) {
        self.samples.entry(edge).or_default().push(sample);
    }

    /// Samples recorded for a single edge, if any.
    pub fn samples_for(&self, edge: &EdgeId) -> Option<&[FlowSample]> {
        self.samples.get(edge).map(|v| v.as_slice())
    }

    /// Iterate over all edges and their sample lists.
    pub fn iter(&self) -> impl Iterator<Item = (&EdgeId, &[FlowSample])> {
        self.samples.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Number of edges with at least one sample.
    pub fn edge_count(&self) -> usize {
        self.samples.len()
    }

    /// Total number of samples across all edges.
    pub fn sample_count(&self) -> usize {
        self.samples.values().map(|v| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
