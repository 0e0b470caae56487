//! Structural topology analysis: connectivity, boundaries, bottlenecks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analysis::types::BOTTLENECK_UTILIZATION_THRESHOLD;
use crate::flow::EdgeMetrics;
use crate::topology::{EdgeId, TopologyModel};

/// Directed node-to-node adjacency derived strictly from links.
///
/// Links are directed, so the matrix is not symmetric in general:
/// `a -> b` does not imply `b -> a`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectivityMatrix {
    /// Node ids in sorted order; row/column indices follow this order.
    pub nodes: Vec<String>,
    pub matrix: Vec<Vec<bool>>,
}

impl ConnectivityMatrix {
    pub fn build(model: &TopologyModel) -> Self {
        let nodes: Vec<String> = model.nodes().map(|n| n.id.clone()).collect();
        let index: BTreeMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();

        let mut matrix = vec![vec![false; nodes.len()]; nodes.len()];
        for edge in model.links() {
            if let (Some(&from), Some(&to)) = (index.get(edge.from.as_str()), index.get(edge.to.as_str())) {
                matrix[from][to] = true;
            }
        }
        ConnectivityMatrix { nodes, matrix }
    }

    /// Whether a direct link `from -> to` exists. Unknown ids read as
    /// unconnected.
    pub fn is_connected(&self, from: &str, to: &str) -> bool {
        let find = |id: &str| self.nodes.iter().position(|n| n == id);
        match (find(from), find(to)) {
            (Some(f), Some(t)) => self.matrix[f][t],
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Boundary-crossing traffic structure for one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupCrossings {
    pub group: String,
    pub members: usize,
    /// Links entering the group from outside.
    pub inbound: Vec<EdgeId>,
    /// Links leaving the group to the outside.
    pub outbound: Vec<EdgeId>,
}

impl GroupCrossings {
    pub fn crossing_count(&self) -> usize {
        self.inbound.len() + self.outbound.len()
    }
}

/// Boundary analysis across all groups.
///
/// A topology without groups yields the explicit empty result rather
/// than an error, so callers can render a "no boundary groups" state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryAnalysis {
    pub groups: Vec<GroupCrossings>,
}

impl BoundaryAnalysis {
    pub fn analyze(model: &TopologyModel) -> Self {
        let groups = model
            .groups()
            .map(|group| {
                let mut inbound = Vec::new();
                let mut outbound = Vec::new();
                for edge in model.links() {
                    let from_in = group.contains(&edge.from);
                    let to_in = group.contains(&edge.to);
                    match (from_in, to_in) {
                        (false, true) => inbound.push(edge.clone()),
                        (true, false) => outbound.push(edge.clone()),
                        _ => {}
                    }
                }
                GroupCrossings {
                    group: group.name.clone(),
                    members: group.members.len(),
                    inbound,
                    outbound,
                }
            })
            .collect();
        BoundaryAnalysis { groups }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// A node whose inbound load approaches or exceeds its capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bottleneck {
    pub node: String,
    /// Sum of aggregate rates over inbound links.
    pub in_rate: f64,
    pub capacity: f64,
    pub utilization: f64,
    /// Inbound aggregate latency plus the node's own processing time.
    pub latency_contribution: f64,
}

/// Bottleneck scan output, highest utilization first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BottleneckReport {
    pub threshold: f64,
    pub bottlenecks: Vec<Bottleneck>,
}

impl BottleneckReport {
    pub fn is_empty(&self) -> bool {
        self.bottlenecks.is_empty()
    }
}

/// Identify nodes whose utilization (inRate/capacity) exceeds
/// `threshold`. Nodes with a non-positive capacity cannot be rated and
/// are skipped with a diagnostic instead of failing the scan.
pub fn find_bottlenecks(
    model: &TopologyModel,
    metrics: &EdgeMetrics,
    threshold: f64,
) -> BottleneckReport {
    let mut bottlenecks = Vec::new();
    for node in model.nodes() {
        let inbound = model.links_into(&node.id);
        let in_rate: f64 = inbound.iter().map(|e| metrics.get(e).rate).sum();
        let in_latency: f64 = inbound.iter().map(|e| metrics.get(e).latency).sum();

        if node.attrs.capacity <= 0.0 {
            log::error!(
                "Skipping bottleneck rating for node {}: non-positive capacity {}",
                node.id,
                node.attrs.capacity
            );
            continue;
        }
        let utilization = in_rate / node.attrs.capacity;
        if utilization > threshold {
            bottlenecks.push(Bottleneck {
                node: node.id.clone(),
                in_rate,
                capacity: node.attrs.capacity,
                utilization,
                latency_contribution: in_latency + node.attrs.processing,
            });
        }
    }
    bottlenecks.sort_by(|a, b| {
        b.utilization
            .partial_cmp(&a.utilization)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    BottleneckReport {
        threshold,
        bottlenecks,
    }
}

/// Shorthand using the default utilization threshold.
pub fn find_default_bottlenecks(model: &TopologyModel, metrics: &EdgeMetrics) -> BottleneckReport {
    find_bottlenecks(model, metrics, BOTTLENECK_UTILIZATION_THRESHOLD)
}

/// Structural overview of the topology for console display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyOverview {
    pub total_nodes: usize,
    pub total_links: usize,
    pub total_groups: usize,
    /// Node count per kind name, sorted by kind name.
    pub kind_counts: BTreeMap<String, usize>,
    /// Nodes with no links in either direction, in id order.
    pub isolated: Vec<String>,
}

impl TopologyOverview {
    pub fn build(model: &TopologyModel) -> Self {
        let mut kind_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut isolated = Vec::new();
        for node in model.nodes() {
            *kind_counts.entry(node.kind.as_str().to_string()).or_insert(0) += 1;
            let connected = model.links().any(|e| e.touches(&node.id));
            if !connected {
                isolated.push(node.id.clone());
            }
        }
        TopologyOverview {
            total_nodes: model.node_count(),
            total_links: model.link_count(),
            total_groups: model.group_count(),
            kind_counts,
            isolated,
        }
    }
}
