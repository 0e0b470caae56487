//! Window aggregation: collapsing raw samples into per-edge aggregates.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::flow::sample::{FlowSample, FlowWindow};
use crate::topology::EdgeId;

/// Aggregated traffic for one edge over one window.
///
/// The folding rule treats concurrent sub-flows on an edge as sharing
/// the link: `rate` is the maximum sample rate (peak concurrent load,
/// not the sum), while `latency` and `errors` accumulate across
/// samples. Negative inputs are clamped to zero before folding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeAggregate {
    pub rate: f64,
    pub latency: f64,
    pub errors: f64,
}

impl EdgeAggregate {
    /// Fold one sample into the aggregate.
    pub fn absorb(&mut self, sample: &FlowSample) {
        self.rate = self.rate.max(sample.rate.max(0.0));
        self.latency += sample.latency.max(0.0);
        self.errors += sample.errors.max(0.0);
    }

    /// Aggregate a whole sample list.
    pub fn from_samples(samples: &[FlowSample]) -> Self {
        let mut agg = EdgeAggregate::default();
        for sample in samples {
            agg.absorb(sample);
        }
        agg
    }
}

/// Per-edge aggregates for one window.
///
/// Lookups for edges with no samples return the zero aggregate, so
/// downstream analysis never needs to distinguish "no entry" from
/// "no traffic".
#[derive(Debug, Clone, Default)]
pub struct EdgeMetrics {
    window: u64,
    aggregates: HashMap<EdgeId, EdgeAggregate>,
}

impl EdgeMetrics {
    /// Aggregate every edge of a window. Pure with respect to the input.
    pub fn from_window(window: &FlowWindow) -> Self {
        let mut aggregates = HashMap::with_capacity(window.edge_count());
        for (edge, samples) in window.iter() {
            aggregates.insert(edge.clone(), EdgeAggregate::from_samples(samples));
        }
        log::debug!(
            "Aggregated window {}: {} edge(s) from {} sample(s)",
            window.index(),
            aggregates.len(),
            window.sample_count()
        );
        EdgeMetrics {
            window: window.index(),
            aggregates,
        }
    }

    /// Window this aggregation was computed from.
    pub fn window(&self) -> u64 {
        self.window
    }

    /// Aggregate for an edge; zero-valued if the edge saw no samples.
    pub fn get(&self, edge: &EdgeId) -> EdgeAggregate {
        self.aggregates.get(edge).copied().unwrap_or_default()
    }

    /// Iterate over edges that actually carried samples.
    pub fn iter(&self) -> impl Iterator<Item = (&EdgeId, &EdgeAggregate)> {
        self.aggregates.iter()
    }

    /// Edges that carried samples, sorted for deterministic traversal.
    pub fn sorted_edges(&self) -> Vec<&EdgeId> {
        let mut edges: Vec<&EdgeId> = self.aggregates.keys().collect();
        edges.sort();
        edges
    }

    pub fn edge_count(&self) -> usize {
        self.aggregates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aggregates.is_empty()
    }
}
