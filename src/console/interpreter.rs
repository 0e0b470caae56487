//! Command interpretation: structural mutations and console rendering.
//!
//! Every operation here is atomic over the topology model: it either
//! fully applies and returns its confirmation lines, or fails without
//! touching the model. The [`Transcript`] is the single sink for all
//! console output, interactive or scripted, so ordering in the
//! transcript always reflects execution order.

use crate::analysis::structure::{
    BottleneckReport, BoundaryAnalysis, ConnectivityMatrix, TopologyOverview,
};
use crate::analysis::types::{PathAnalysis, PathFilter};
use crate::analysis::paths::filter_paths;
use crate::console::command::CommandError;
use crate::topology::{Node, NodeAttribute, NodeKind, TopologyModel};

/// Ordered console output with a flush cursor.
///
/// Lines accumulate for the life of the session; the cursor lets the
/// interactive front end print only what appeared since its last flush
/// while tests inspect the full history.
#[derive(Debug, Default)]
pub struct Transcript {
    lines: Vec<String>,
    flushed: usize,
}

impl Transcript {
    pub fn new() -> Self {
        Transcript::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn extend(&mut self, lines: impl IntoIterator<Item = String>) {
        self.lines.extend(lines);
    }

    /// Full history in execution order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines appended since the previous call, advancing the cursor.
    pub fn drain_unflushed(&mut self) -> &[String] {
        let start = self.flushed;
        self.flushed = self.lines.len();
        &self.lines[start..]
    }
}

// ----------------------------------------------------------------------
// Structural mutations
// ----------------------------------------------------------------------

fn unknown_attr_lines(unknown: &[String]) -> Vec<String> {
    unknown
        .iter()
        .map(|key| format!("Ignored unknown attribute '{}'", key))
        .collect()
}

/// `node add`: insert a node, reporting ignored attribute keys.
pub fn add_node(
    model: &mut TopologyModel,
    id: &str,
    kind: NodeKind,
    attrs: &[NodeAttribute],
    unknown_attrs: &[String],
) -> Result<Vec<String>, CommandError> {
    let mut node = Node::new(id, kind);
    for attr in attrs {
        node.attrs.apply(*attr);
    }
    model.add_node(node)?;
    let mut lines = unknown_attr_lines(unknown_attrs);
    lines.push(format!("Added node {} ({})", id, kind));
    Ok(lines)
}

/// `node remove`: delete a node, reporting each cascade-removed link.
pub fn remove_node(model: &mut TopologyModel, id: &str) -> Result<Vec<String>, CommandError> {
    let removed = model.remove_node(id)?;
    let mut lines: Vec<String> = removed
        .removed_links
        .iter()
        .map(|edge| format!("Removed link {}", edge))
        .collect();
    lines.push(format!("Removed node {}", id));
    Ok(lines)
}

/// `node set`: update attributes on an existing node.
pub fn set_node(
    model: &mut TopologyModel,
    id: &str,
    attrs: &[NodeAttribute],
    unknown_attrs: &[String],
) -> Result<Vec<String>, CommandError> {
    model.set_node_attrs(id, attrs)?;
    let mut lines = unknown_attr_lines(unknown_attrs);
    lines.push(format!("Updated node {}", id));
    Ok(lines)
}

/// `link add`.
pub fn add_link(
    model: &mut TopologyModel,
    from: &str,
    to: &str,
) -> Result<Vec<String>, CommandError> {
    model.add_link(from, to)?;
    Ok(vec![format!("Added link {} -> {}", from, to)])
}

/// `link remove`.
pub fn remove_link(
    model: &mut TopologyModel,
    from: &str,
    to: &str,
) -> Result<Vec<String>, CommandError> {
    model.remove_link(from, to)?;
    Ok(vec![format!("Removed link {} -> {}", from, to)])
}

/// `group add`.
pub fn add_group(
    model: &mut TopologyModel,
    name: &str,
    members: &[String],
) -> Result<Vec<String>, CommandError> {
    model.add_group(name, members.iter().cloned())?;
    let size = model
        .group(name)
        .map(|g| g.members.len())
        .unwrap_or(members.len());
    Ok(vec![format!("Added group {} ({} members)", name, size)])
}

/// `group remove`.
pub fn remove_group(model: &mut TopologyModel, name: &str) -> Result<Vec<String>, CommandError> {
    model.remove_group(name)?;
    Ok(vec![format!("Removed group {}", name)])
}

// ----------------------------------------------------------------------
// Analytics rendering
// ----------------------------------------------------------------------

/// Render the `paths` verb output for a given filter.
pub fn render_paths(analysis: &PathAnalysis, filter: PathFilter) -> Vec<String> {
    if analysis.paths.is_empty() {
        return vec!["No source/sink pairs in topology.".to_string()];
    }
    let selected = filter_paths(&analysis.paths, filter);
    if selected.is_empty() {
        return vec![format!("No paths match filter '{}'.", filter.as_str())];
    }
    let mut lines = vec![format!(
        "Paths [{}]: showing {} of {}",
        filter.as_str(),
        selected.len(),
        analysis.paths.len()
    )];
    for path in selected {
        lines.push(format!("  {}", path));
    }
    lines
}

/// Render the `summary` verb output.
pub fn render_summary(analysis: &PathAnalysis) -> Vec<String> {
    let s = &analysis.summary;
    vec![
        format!(
            "Traffic summary: {} paths ({} active, {} problematic)",
            s.total_paths, s.active_paths, s.problematic_paths
        ),
        format!(
            "Healthy: {:.1}%  Avg latency: {:.2}ms  Throughput: {:.2} units/sec",
            s.healthy_percentage, s.avg_latency, s.total_throughput
        ),
    ]
}

/// Render the `matrix` verb output as one adjacency row per node.
pub fn render_matrix(matrix: &ConnectivityMatrix) -> Vec<String> {
    if matrix.is_empty() {
        return vec!["Topology is empty.".to_string()];
    }
    let width = matrix.nodes.iter().map(|n| n.len()).max().unwrap_or(0);
    let mut lines = vec![format!("Connectivity matrix ({} nodes):", matrix.len())];
    for (i, node) in matrix.nodes.iter().enumerate() {
        let targets: Vec<&str> = matrix
            .nodes
            .iter()
            .enumerate()
            .filter(|(j, _)| matrix.matrix[i][*j])
            .map(|(_, id)| id.as_str())
            .collect();
        let arrow = if targets.is_empty() {
            "-".to_string()
        } else {
            targets.join(", ")
        };
        lines.push(format!("  {:width$} -> {}", node, arrow, width = width));
    }
    lines
}

/// Render the `groups` verb output.
pub fn render_groups(analysis: &BoundaryAnalysis) -> Vec<String> {
    if analysis.is_empty() {
        return vec!["No boundary groups defined.".to_string()];
    }
    let mut lines = vec![format!("Boundary groups: {}", analysis.groups.len())];
    for group in &analysis.groups {
        lines.push(format!(
            "  {} ({} members): {} crossing link(s) ({} in, {} out)",
            group.group,
            group.members,
            group.crossing_count(),
            group.inbound.len(),
            group.outbound.len()
        ));
    }
    lines
}

/// Render the `bottlenecks` verb output.
pub fn render_bottlenecks(report: &BottleneckReport) -> Vec<String> {
    if report.is_empty() {
        return vec![format!(
            "No bottlenecks above {:.0}% utilization.",
            report.threshold * 100.0
        )];
    }
    let mut lines = vec![format!("Bottlenecks: {}", report.bottlenecks.len())];
    for hot in &report.bottlenecks {
        lines.push(format!(
            "  {}: {:.0}% utilized ({:.2}/{:.2} units/sec), latency contribution {:.2}ms",
            hot.node,
            hot.utilization * 100.0,
            hot.in_rate,
            hot.capacity,
            hot.latency_contribution
        ));
    }
    lines
}

/// Render the `topo` verb output.
pub fn render_topo(overview: &TopologyOverview) -> Vec<String> {
    let mut lines = vec![format!(
        "Topology: {} nodes, {} links, {} groups",
        overview.total_nodes, overview.total_links, overview.total_groups
    )];
    if !overview.kind_counts.is_empty() {
        let counts: Vec<String> = overview
            .kind_counts
            .iter()
            .map(|(kind, count)| format!("{}: {}", kind, count))
            .collect();
        lines.push(format!("  {}", counts.join(", ")));
    }
    if !overview.isolated.is_empty() {
        lines.push(format!("  Isolated: {}", overview.isolated.join(", ")));
    }
    lines
}
