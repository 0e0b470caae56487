//! Report generation for topology analytics.
//!
//! Generates both JSON and human-readable text reports.

use std::fs;
use std::path::Path;

use chrono::Utc;
use color_eyre::eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::paths::analyze_paths;
use crate::analysis::structure::{
    find_default_bottlenecks, BottleneckReport, BoundaryAnalysis, ConnectivityMatrix,
    TopologyOverview,
};
use crate::analysis::types::PathAnalysis;
use crate::flow::EdgeMetrics;
use crate::topology::TopologyModel;

/// Complete analytics output for one window, ready for serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub generated_at: String,
    pub window: u64,
    pub overview: TopologyOverview,
    pub path_analysis: PathAnalysis,
    pub connectivity: ConnectivityMatrix,
    pub boundaries: BoundaryAnalysis,
    pub bottlenecks: BottleneckReport,
}

impl AnalyticsReport {
    /// Run every analyzer against a consistent model/metrics snapshot.
    pub fn build(model: &TopologyModel, metrics: &EdgeMetrics) -> Self {
        AnalyticsReport {
            generated_at: Utc::now().to_rfc3339(),
            window: metrics.window(),
            overview: TopologyOverview::build(model),
            path_analysis: analyze_paths(model, metrics),
            connectivity: ConnectivityMatrix::build(model),
            boundaries: BoundaryAnalysis::analyze(model),
            bottlenecks: find_default_bottlenecks(model, metrics),
        }
    }
}

/// Generate JSON report
pub fn generate_json_report(report: &AnalyticsReport, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)
        .context("Failed to serialize report to JSON")?;

    fs::write(output_path, json)
        .with_context(|| format!("Failed to write JSON report to {}", output_path.display()))?;

    log::info!("JSON report written to {}", output_path.display());
    Ok(())
}

/// Render the human-readable text report.
pub fn render_text_report(report: &AnalyticsReport) -> String {
    let mut lines: Vec<String> = Vec::new();

    // Header
    lines.push("=".repeat(80));
    lines.push("                        FLOWSCOPE TOPOLOGY ANALYTICS".to_string());
    lines.push("=".repeat(80));
    lines.push(String::new());

    // Metadata
    lines.push(format!("Generated: {}", report.generated_at));
    lines.push(format!("Window: {}", report.window));
    lines.push(format!("Nodes: {}", report.overview.total_nodes));
    lines.push(format!("Links: {}", report.overview.total_links));
    lines.push(format!("Groups: {}", report.overview.total_groups));
    for (kind, count) in &report.overview.kind_counts {
        lines.push(format!("  {}: {}", kind, count));
    }
    if !report.overview.isolated.is_empty() {
        lines.push(format!(
            "Isolated nodes: {}",
            report.overview.isolated.join(", ")
        ));
    }
    lines.push(String::new());

    // Traffic summary
    lines.push("=".repeat(80));
    lines.push("                             TRAFFIC SUMMARY".to_string());
    lines.push("=".repeat(80));
    lines.push(String::new());

    let summary = &report.path_analysis.summary;
    lines.push(format!("Total paths: {}", summary.total_paths));
    lines.push(format!("Active paths: {}", summary.active_paths));
    lines.push(format!("Problematic paths: {}", summary.problematic_paths));
    lines.push(format!("Healthy: {:.1}%", summary.healthy_percentage));
    lines.push(format!("Average latency: {:.2}ms", summary.avg_latency));
    lines.push(format!("Total throughput: {:.2} units/sec", summary.total_throughput));
    lines.push(String::new());

    // Paths
    if !report.path_analysis.paths.is_empty() {
        lines.push("Paths:".to_string());
        for path in &report.path_analysis.paths {
            lines.push(format!("  {}", path));
        }
        lines.push(String::new());
    }

    // Critical paths
    if !report.path_analysis.critical.is_empty() {
        lines.push("=".repeat(80));
        lines.push("                             CRITICAL PATHS".to_string());
        lines.push("=".repeat(80));
        lines.push(String::new());

        for (i, critical) in report.path_analysis.critical.iter().enumerate() {
            let tags: Vec<&str> = critical.violations.iter().map(|v| v.as_str()).collect();
            lines.push(format!(
                "  {}. {} -> {}: latency {:.2}ms, drop {:.4} ({})",
                i + 1,
                critical.path.source,
                critical.path.sink,
                critical.path.latency,
                critical.path.drop_rate,
                tags.join(", ")
            ));
        }
        lines.push(String::new());
    }

    // Boundary crossings
    lines.push("=".repeat(80));
    lines.push("                            BOUNDARY GROUPS".to_string());
    lines.push("=".repeat(80));
    lines.push(String::new());

    if report.boundaries.is_empty() {
        lines.push("No boundary groups defined.".to_string());
    } else {
        for group in &report.boundaries.groups {
            lines.push(format!(
                "  {} ({} members): {} crossing link(s), {} in / {} out",
                group.group,
                group.members,
                group.crossing_count(),
                group.inbound.len(),
                group.outbound.len()
            ));
        }
    }
    lines.push(String::new());

    // Bottlenecks
    if !report.bottlenecks.is_empty() {
        lines.push("=".repeat(80));
        lines.push("                              BOTTLENECKS".to_string());
        lines.push("=".repeat(80));
        lines.push(String::new());

        for (i, hot) in report.bottlenecks.bottlenecks.iter().enumerate() {
            lines.push(format!(
                "  {}. {}: {:.0}% utilized ({:.2}/{:.2} units/sec), latency contribution {:.2}ms",
                i + 1,
                hot.node,
                hot.utilization * 100.0,
                hot.in_rate,
                hot.capacity,
                hot.latency_contribution
            ));
        }
        lines.push(String::new());
    }

    // Footer
    lines.push("=".repeat(80));
    lines.join("\n")
}

/// Generate human-readable text report
pub fn generate_text_report(report: &AnalyticsReport, output_path: &Path) -> Result<()> {
    let content = render_text_report(report);
    fs::write(output_path, content)
        .with_context(|| format!("Failed to write text report to {}", output_path.display()))?;

    log::info!("Text report written to {}", output_path.display());
    Ok(())
}

/// Print a summary to stdout
pub fn print_summary(report: &AnalyticsReport) {
    println!("\n=== TOPOLOGY ANALYTICS SUMMARY ===\n");
    println!("Nodes: {}", report.overview.total_nodes);
    println!("Links: {}", report.overview.total_links);
    println!("Window: {}", report.window);

    let summary = &report.path_analysis.summary;
    println!("\nTraffic:");
    println!("  Paths: {} ({} active)", summary.total_paths, summary.active_paths);
    println!("  Healthy: {:.1}%", summary.healthy_percentage);
    println!("  Avg latency: {:.2}ms", summary.avg_latency);
    println!("  Throughput: {:.2} units/sec", summary.total_throughput);

    if !report.path_analysis.critical.is_empty() {
        println!("\nCritical paths: {}", report.path_analysis.critical.len());
    }
    if !report.bottlenecks.is_empty() {
        println!("Bottlenecks: {}", report.bottlenecks.bottlenecks.len());
    }

    println!();
}
