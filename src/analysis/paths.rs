//! Path analysis: deriving per-pair traffic statistics from edge aggregates.
//!
//! Paths are not enumerated as explicit node sequences. For each
//! (origin, sink) pair the analyzer attributes an edge to the pair when
//! the edge leaves the origin or enters the sink. The rule deliberately
//! over-counts shared edges instead of performing full path enumeration,
//! trading precision for responsiveness on every recomputation. Stats
//! fold attributed edges as rate = max, latency = sum, errors = sum.

use rayon::prelude::*;

use crate::analysis::types::{
    CriticalPath, PathAnalysis, PathFilter, PathStats, TrafficSummary, HIGH_LATENCY_THRESHOLD,
    MAX_CRITICAL_PATHS, PACKET_LOSS_THRESHOLD, TOP_PATHS_LIMIT,
};
use crate::flow::EdgeMetrics;
use crate::topology::TopologyModel;

/// Derive the stats for a single (source, sink) pair.
///
/// A pair with no attributed edges yields the all-zero fallback path
/// with hops = 2, so every origin/sink combination is always present
/// in the output.
pub fn derive_path(source: &str, sink: &str, metrics: &EdgeMetrics) -> PathStats {
    let mut rate: f64 = 0.0;
    let mut latency = 0.0;
    let mut errors = 0.0;
    let mut attributed = 0usize;

    for (edge, agg) in metrics.iter() {
        if edge.from == source || edge.to == sink {
            attributed += 1;
            rate = rate.max(agg.rate);
            latency += agg.latency;
            errors += agg.errors;
        }
    }

    let drop_rate = if rate > 0.0 { errors / rate } else { 0.0 };
    let hops = attributed.max(2);
    PathStats::new(source, sink, hops, rate, latency, drop_rate)
}

/// Compute the full path analysis for the current topology and window.
///
/// Pairs are enumerated origin-major in id order, which fixes discovery
/// order; pair derivation itself is order-independent, so the parallel
/// map cannot perturb results. Never fails: an empty or origin-less
/// topology produces an empty analysis with a 100% healthy summary.
pub fn analyze_paths(model: &TopologyModel, metrics: &EdgeMetrics) -> PathAnalysis {
    let origins = model.traffic_origins();
    let terminals = model.traffic_terminals();

    let mut pairs = Vec::with_capacity(origins.len() * terminals.len());
    for origin in &origins {
        for terminal in &terminals {
            pairs.push((origin.id.as_str(), terminal.id.as_str()));
        }
    }

    let paths: Vec<PathStats> = pairs
        .par_iter()
        .map(|&(source, sink)| derive_path(source, sink, metrics))
        .collect();

    let critical = extract_critical(&paths);
    let summary = summarize(&paths, critical.len());
    log::debug!(
        "Analyzed {} path(s) over {} sampled edge(s): {} critical",
        paths.len(),
        metrics.edge_count(),
        critical.len()
    );

    PathAnalysis {
        paths,
        critical,
        summary,
    }
}

/// Extract paths violating latency or loss thresholds, tagged with the
/// specific violations, capped at [`MAX_CRITICAL_PATHS`] in discovery
/// order.
pub fn extract_critical(paths: &[PathStats]) -> Vec<CriticalPath> {
    paths
        .iter()
        .filter_map(|path| {
            let violations = path.violations();
            if violations.is_empty() {
                None
            } else {
                Some(CriticalPath {
                    path: path.clone(),
                    violations,
                })
            }
        })
        .take(MAX_CRITICAL_PATHS)
        .collect()
}

/// Apply a console filter to the path list.
pub fn filter_paths<'a>(paths: &'a [PathStats], filter: PathFilter) -> Vec<&'a PathStats> {
    match filter {
        PathFilter::All => paths.iter().collect(),
        PathFilter::Critical => paths
            .iter()
            .filter(|p| p.latency > HIGH_LATENCY_THRESHOLD)
            .collect(),
        PathFilter::Lossy => paths
            .iter()
            .filter(|p| p.drop_rate > PACKET_LOSS_THRESHOLD)
            .collect(),
        PathFilter::Top => {
            let mut ranked: Vec<&PathStats> = paths.iter().collect();
            // Stable sort keeps discovery order among equal rates.
            ranked.sort_by(|a, b| {
                b.rate
                    .partial_cmp(&a.rate)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            ranked.truncate(TOP_PATHS_LIMIT);
            ranked
        }
    }
}

/// Summarize a path list. `problematic` is the extracted critical-path
/// count, which is capped, not the raw violation count.
pub fn summarize(paths: &[PathStats], problematic: usize) -> TrafficSummary {
    let total = paths.len();
    let active = paths.iter().filter(|p| p.is_active()).count();
    let healthy_percentage = if total == 0 {
        100.0
    } else {
        (total - problematic) as f64 / total as f64 * 100.0
    };

    let nonzero_latencies: Vec<f64> = paths
        .iter()
        .map(|p| p.latency)
        .filter(|l| *l > 0.0)
        .collect();
    let avg_latency = if nonzero_latencies.is_empty() {
        0.0
    } else {
        nonzero_latencies.iter().sum::<f64>() / nonzero_latencies.len() as f64
    };

    TrafficSummary {
        total_paths: total,
        active_paths: active,
        problematic_paths: problematic,
        healthy_percentage,
        avg_latency,
        total_throughput: paths.iter().map(|p| p.rate).sum(),
    }
}
