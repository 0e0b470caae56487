//! Core data types for path and traffic analysis.

use serde::{Deserialize, Serialize};

/// Latency above which a path is considered slow (milliseconds).
pub const HIGH_LATENCY_THRESHOLD: f64 = 100.0;

/// Drop rate above which a path is considered lossy.
pub const PACKET_LOSS_THRESHOLD: f64 = 0.01;

/// Latency at which a path's health becomes critical (milliseconds).
pub const SEVERE_LATENCY_THRESHOLD: f64 = 200.0;

/// Drop rate at which a path's health becomes critical.
pub const SEVERE_LOSS_THRESHOLD: f64 = 0.05;

/// Cap on the extracted critical-path list.
pub const MAX_CRITICAL_PATHS: usize = 5;

/// Cap on the `top` filter output.
pub const TOP_PATHS_LIMIT: usize = 10;

/// Default utilization (inRate/capacity) above which a node is flagged
/// as a bottleneck.
pub const BOTTLENECK_UTILIZATION_THRESHOLD: f64 = 0.8;

/// Three-state health of a path.
///
/// Classification is an ordered precedence check: the critical tier is
/// tested first, so a path can never satisfy the critical criteria yet
/// be reported as degraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathHealth {
    Healthy,
    Degraded,
    Critical,
}

impl PathHealth {
    /// Classify from end-to-end latency and drop rate.
    pub fn classify(latency: f64, drop_rate: f64) -> PathHealth {
        if drop_rate > SEVERE_LOSS_THRESHOLD || latency > SEVERE_LATENCY_THRESHOLD {
            PathHealth::Critical
        } else if drop_rate > PACKET_LOSS_THRESHOLD || latency > HIGH_LATENCY_THRESHOLD {
            PathHealth::Degraded
        } else {
            PathHealth::Healthy
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PathHealth::Healthy => "healthy",
            PathHealth::Degraded => "degraded",
            PathHealth::Critical => "critical",
        }
    }
}

impl std::fmt::Display for PathHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A threshold a critical path has violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThresholdViolation {
    #[serde(rename = "High latency")]
    HighLatency,
    #[serde(rename = "Packet loss")]
    PacketLoss,
}

impl ThresholdViolation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThresholdViolation::HighLatency => "High latency",
            ThresholdViolation::PacketLoss => "Packet loss",
        }
    }
}

impl std::fmt::Display for ThresholdViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Derived traffic statistics for one (source, sink) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathStats {
    pub source: String,
    pub sink: String,
    pub hops: usize,
    pub rate: f64,
    pub latency: f64,
    pub drop_rate: f64,
    pub health: PathHealth,
}

impl PathStats {
    /// Build a path record, deriving its health.
    pub fn new(
        source: impl Into<String>,
        sink: impl Into<String>,
        hops: usize,
        rate: f64,
        latency: f64,
        drop_rate: f64,
    ) -> Self {
        PathStats {
            source: source.into(),
            sink: sink.into(),
            hops,
            rate,
            latency,
            drop_rate,
            health: PathHealth::classify(latency, drop_rate),
        }
    }

    /// Thresholds this path currently violates, in fixed order.
    pub fn violations(&self) -> Vec<ThresholdViolation> {
        let mut violations = Vec::new();
        if self.latency > HIGH_LATENCY_THRESHOLD {
            violations.push(ThresholdViolation::HighLatency);
        }
        if self.drop_rate > PACKET_LOSS_THRESHOLD {
            violations.push(ThresholdViolation::PacketLoss);
        }
        violations
    }

    /// True if the path carried any traffic this window.
    pub fn is_active(&self) -> bool {
        self.rate > 0.0
    }
}

impl std::fmt::Display for PathStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> {}: {} hops, rate {:.2}, latency {:.2}ms, drop {:.4} [{}]",
            self.source, self.sink, self.hops, self.rate, self.latency, self.drop_rate, self.health
        )
    }
}

/// A path flagged for violating latency or loss thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalPath {
    pub path: PathStats,
    pub violations: Vec<ThresholdViolation>,
}

/// Console filter applied to the path list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathFilter {
    #[default]
    All,
    /// Latency above [`HIGH_LATENCY_THRESHOLD`].
    Critical,
    /// Drop rate above [`PACKET_LOSS_THRESHOLD`].
    Lossy,
    /// Highest rate first, capped at [`TOP_PATHS_LIMIT`].
    Top,
}

impl PathFilter {
    pub fn parse(s: &str) -> Option<PathFilter> {
        match s {
            "all" => Some(PathFilter::All),
            "critical" => Some(PathFilter::Critical),
            "lossy" => Some(PathFilter::Lossy),
            "top" => Some(PathFilter::Top),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PathFilter::All => "all",
            PathFilter::Critical => "critical",
            PathFilter::Lossy => "lossy",
            PathFilter::Top => "top",
        }
    }
}

/// Aggregate summary across all paths of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficSummary {
    pub total_paths: usize,
    /// Paths with rate > 0.
    pub active_paths: usize,
    /// Number of extracted critical paths.
    pub problematic_paths: usize,
    pub healthy_percentage: f64,
    /// Mean latency over paths with nonzero latency; 0 if none qualify.
    pub avg_latency: f64,
    /// Sum of all path rates.
    pub total_throughput: f64,
}

/// Full output of one path-analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathAnalysis {
    pub paths: Vec<PathStats>,
    pub critical: Vec<CriticalPath>,
    pub summary: TrafficSummary,
}
