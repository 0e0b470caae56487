//! Core types for the traffic topology.
//!
//! A topology is a directed graph of processing nodes joined by links,
//! optionally partitioned into named boundary groups. These types carry
//! no behaviour beyond identity, parsing, and display; all graph
//! mutation lives in [`crate::topology::model`].

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Functional role of a node in the traffic graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Pure traffic producer (no inbound traffic expected).
    Source,
    /// Entry point that also originates traffic into the graph.
    Ingress,
    /// Intermediate processing stage.
    Service,
    /// Terminal consumer of traffic.
    Sink,
}

impl NodeKind {
    /// All recognized kinds, in declaration order.
    pub const ALL: [NodeKind; 4] = [
        NodeKind::Source,
        NodeKind::Ingress,
        NodeKind::Service,
        NodeKind::Sink,
    ];

    /// Parse a kind from its canonical name. Matching is case-insensitive
    /// so console input like `service` and `Service` both work.
    pub fn parse(s: &str) -> Option<NodeKind> {
        match s.to_ascii_lowercase().as_str() {
            "source" => Some(NodeKind::Source),
            "ingress" => Some(NodeKind::Ingress),
            "service" => Some(NodeKind::Service),
            "sink" => Some(NodeKind::Sink),
            _ => None,
        }
    }

    /// Canonical display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Source => "Source",
            NodeKind::Ingress => "Ingress",
            NodeKind::Service => "Service",
            NodeKind::Sink => "Sink",
        }
    }

    /// True for kinds that originate traffic (path-analysis start points).
    pub fn originates_traffic(&self) -> bool {
        matches!(self, NodeKind::Source | NodeKind::Ingress)
    }

    /// True for kinds that terminate traffic (path-analysis end points).
    pub fn terminates_traffic(&self) -> bool {
        matches!(self, NodeKind::Sink)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mutable per-node properties.
///
/// `capacity` is the nominal throughput the node can absorb (units/sec),
/// used for bottleneck utilization. `processing` is the fixed latency
/// contribution of the node in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeAttributes {
    pub capacity: f64,
    pub processing: f64,
}

impl Default for NodeAttributes {
    fn default() -> Self {
        NodeAttributes {
            capacity: 100.0,
            processing: 0.0,
        }
    }
}

/// A single validated `key=value` attribute update.
///
/// Attributes are parsed into a tagged variant rather than a raw string
/// map so that malformed values are rejected at parse time and new
/// attributes require an explicit variant here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeAttribute {
    Capacity(f64),
    Processing(f64),
}

impl NodeAttribute {
    /// Parse a single attribute from its key and value tokens.
    ///
    /// Returns `Ok(None)` for keys this version does not recognize, so
    /// callers can report them as diagnostics without failing the whole
    /// command. Malformed or out-of-range values for known keys are hard
    /// errors.
    pub fn parse(key: &str, value: &str) -> Result<Option<NodeAttribute>, String> {
        match key {
            "capacity" => {
                let v: f64 = value
                    .parse()
                    .map_err(|_| format!("capacity must be a number, got '{}'", value))?;
                if !v.is_finite() || v <= 0.0 {
                    return Err(format!("capacity must be a positive number, got '{}'", value));
                }
                Ok(Some(NodeAttribute::Capacity(v)))
            }
            "processing" => {
                let v: f64 = value
                    .parse()
                    .map_err(|_| format!("processing must be a number, got '{}'", value))?;
                if !v.is_finite() || v < 0.0 {
                    return Err(format!(
                        "processing must be a non-negative number, got '{}'",
                        value
                    ));
                }
                Ok(Some(NodeAttribute::Processing(v)))
            }
            _ => Ok(None),
        }
    }

    /// The attribute key as it appears in console input.
    pub fn key(&self) -> &'static str {
        match self {
            NodeAttribute::Capacity(_) => "capacity",
            NodeAttribute::Processing(_) => "processing",
        }
    }
}

impl NodeAttributes {
    /// Apply one parsed attribute update in place.
    pub fn apply(&mut self, attr: NodeAttribute) {
        match attr {
            NodeAttribute::Capacity(v) => self.capacity = v,
            NodeAttribute::Processing(v) => self.processing = v,
        }
    }
}

/// A traffic-processing node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    #[serde(default)]
    pub attrs: NodeAttributes,
}

impl Node {
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Node {
            id: id.into(),
            kind,
            attrs: NodeAttributes::default(),
        }
    }

    pub fn with_attrs(id: impl Into<String>, kind: NodeKind, attrs: NodeAttributes) -> Self {
        Node {
            id: id.into(),
            kind,
            attrs,
        }
    }
}

/// Identity of a directed link: the ordered `(from, to)` pair.
///
/// Links carry no attributes of their own; the pair is the whole
/// identity, and at most one link may exist per pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId {
    pub from: String,
    pub to: String,
}

impl EdgeId {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        EdgeId {
            from: from.into(),
            to: to.into(),
        }
    }

    /// True if `node_id` is either endpoint.
    pub fn touches(&self, node_id: &str) -> bool {
        self.from == node_id || self.to == node_id
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// A named set of node ids used for boundary-crossing analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryGroup {
    pub name: String,
    pub members: BTreeSet<String>,
}

impl BoundaryGroup {
    pub fn new(name: impl Into<String>, members: impl IntoIterator<Item = String>) -> Self {
        BoundaryGroup {
            name: name.into(),
            members: members.into_iter().collect(),
        }
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.members.contains(node_id)
    }
}
