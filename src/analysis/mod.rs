//! Traffic analytics for topology models.
//!
//! This module provides the derived views over a topology and its
//! current window of edge aggregates: per-pair path statistics,
//! critical-path extraction, connectivity/boundary/bottleneck
//! structure, and report generation.

pub mod paths;
pub mod report;
pub mod structure;
pub mod types;

pub use paths::{analyze_paths, derive_path, extract_critical, filter_paths, summarize};
pub use report::{generate_json_report, generate_text_report, render_text_report, AnalyticsReport};
pub use structure::{
    find_bottlenecks, find_default_bottlenecks, Bottleneck, BottleneckReport, BoundaryAnalysis,
    ConnectivityMatrix, GroupCrossings, TopologyOverview,
};
pub use types::{
    CriticalPath, PathAnalysis, PathFilter, PathHealth, PathStats, ThresholdViolation,
    TrafficSummary,
};
