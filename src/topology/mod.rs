//! Traffic topology module.
//!
//! This module contains the node/link/group type definitions and the
//! mutable [`TopologyModel`] that owns them.

pub mod model;
pub mod types;

// Re-export key types for easier access
pub use model::{ModelError, RemovedNode, TopologyModel};
pub use types::{BoundaryGroup, EdgeId, Node, NodeAttribute, NodeAttributes, NodeKind};
