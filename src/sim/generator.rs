//! Synthetic traffic generation.
//!
//! The generator plays the role of the external sample producer when no
//! real feed is attached: once per tick it emits a full window of flow
//! samples for every link in the model. Output is a pure function of
//! the seed, the tick sequence, and the link set, so a seeded session
//! replays identically.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::flow::{FlowSample, FlowWindow};
use crate::topology::TopologyModel;

/// Fraction of sub-flows that carry some errors.
const ERROR_FLOW_PROBABILITY: f64 = 0.1;

/// Seeded producer of per-window flow samples.
#[derive(Debug)]
pub struct TrafficGenerator {
    rng: StdRng,
}

impl TrafficGenerator {
    pub fn new(seed: u64) -> Self {
        log::debug!("Traffic generator seeded with {}", seed);
        TrafficGenerator {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Produce the sample window for one tick.
    ///
    /// Each link gets one to three concurrent sub-flows. Rates are drawn
    /// against the tighter endpoint capacity, latency includes the
    /// receiving node's processing time, and a minority of sub-flows
    /// carry errors proportional to their rate.
    pub fn next_window(&mut self, model: &TopologyModel, index: u64) -> FlowWindow {
        let mut window = FlowWindow::new(index);
        for edge in model.links() {
            let (capacity, processing) = match (model.node(&edge.from), model.node(&edge.to)) {
                (Some(from), Some(to)) => (
                    from.attrs.capacity.min(to.attrs.capacity),
                    to.attrs.processing,
                ),
                _ => {
                    log::error!("Link {} references a missing node; using defaults", edge);
                    (100.0, 0.0)
                }
            };

            let flows = self.rng.gen_range(1..=3);
            for _ in 0..flows {
                let rate = self.rng.gen_range(0.1..=1.0) * capacity / flows as f64;
                let latency = processing + self.rng.gen_range(1.0..20.0);
                let errors = if self.rng.gen_bool(ERROR_FLOW_PROBABILITY) {
                    rate * self.rng.gen_range(0.0..0.08)
                } else {
                    0.0
                };
                window.record(edge.clone(), FlowSample::new(rate, latency, errors));
            }
        }
        log::debug!(
            "Window {}: {} sample(s) across {} link(s)",
            index,
            window.sample_count(),
            window.edge_count()
        );
        window
    }
}
