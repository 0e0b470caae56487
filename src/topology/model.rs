//! The mutable topology graph and its invariants.
//!
//! [`TopologyModel`] is the single authoritative store for nodes, links,
//! and boundary groups. Every mutation validates its preconditions and
//! either applies completely or leaves the model untouched; partial
//! application is never possible because each operation touches the
//! collections only after all checks have passed.
//!
//! Node and group maps are `BTreeMap`s and the link set is a `BTreeSet`
//! so that iteration order (and therefore analysis output and report
//! ordering) is deterministic across runs.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use super::types::{BoundaryGroup, EdgeId, Node, NodeAttribute, NodeKind};

/// Errors raised by model mutations.
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    /// The operation references something that does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// The operation would violate a model invariant.
    #[error("validation failed: {0}")]
    Validation(String),
}

/// Result of removing a node, reporting the links that went with it.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedNode {
    pub node: Node,
    /// Incident links removed by the cascade, in deterministic order.
    pub removed_links: Vec<EdgeId>,
}

/// The directed traffic graph: nodes, links, and boundary groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopologyModel {
    nodes: BTreeMap<String, Node>,
    links: BTreeSet<EdgeId>,
    groups: BTreeMap<String, BoundaryGroup>,
}

impl TopologyModel {
    pub fn new() -> Self {
        TopologyModel::default()
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// All nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// All links in `(from, to)` order.
    pub fn links(&self) -> impl Iterator<Item = &EdgeId> {
        self.links.iter()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn has_link(&self, from: &str, to: &str) -> bool {
        self.links
            .contains(&EdgeId::new(from.to_string(), to.to_string()))
    }

    /// All boundary groups in name order.
    pub fn groups(&self) -> impl Iterator<Item = &BoundaryGroup> {
        self.groups.values()
    }

    pub fn group(&self, name: &str) -> Option<&BoundaryGroup> {
        self.groups.get(name)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes that originate traffic (Source and Ingress), in id order.
    pub fn traffic_origins(&self) -> Vec<&Node> {
        self.nodes
            .values()
            .filter(|n| n.kind.originates_traffic())
            .collect()
    }

    /// Nodes that terminate traffic (Sink), in id order.
    pub fn traffic_terminals(&self) -> Vec<&Node> {
        self.nodes
            .values()
            .filter(|n| n.kind.terminates_traffic())
            .collect()
    }

    /// Links arriving at `node_id`, in deterministic order.
    pub fn links_into(&self, node_id: &str) -> Vec<&EdgeId> {
        self.links.iter().filter(|e| e.to == node_id).collect()
    }

    /// Links leaving `node_id`, in deterministic order.
    pub fn links_out_of(&self, node_id: &str) -> Vec<&EdgeId> {
        self.links.iter().filter(|e| e.from == node_id).collect()
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Add a node. Fails if a node with the same id already exists.
    pub fn add_node(&mut self, node: Node) -> Result<(), ModelError> {
        if self.nodes.contains_key(&node.id) {
            return Err(ModelError::Validation(format!(
                "node '{}' already exists",
                node.id
            )));
        }
        log::debug!("Adding node {} ({})", node.id, node.kind);
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Remove a node and cascade-remove every link that touches it.
    ///
    /// The removed links are returned so the caller can report each one;
    /// the cascade is a documented side effect, never silent.
    pub fn remove_node(&mut self, id: &str) -> Result<RemovedNode, ModelError> {
        let node = self
            .nodes
            .remove(id)
            .ok_or_else(|| ModelError::NotFound(format!("node '{}' does not exist", id)))?;

        let removed_links: Vec<EdgeId> = self
            .links
            .iter()
            .filter(|e| e.touches(id))
            .cloned()
            .collect();
        for edge in &removed_links {
            self.links.remove(edge);
        }

        // Membership in groups is also cleaned up; empty groups remain.
        for group in self.groups.values_mut() {
            group.members.remove(id);
        }

        log::debug!(
            "Removed node {} and {} incident link(s)",
            id,
            removed_links.len()
        );
        Ok(RemovedNode {
            node,
            removed_links,
        })
    }

    /// Update attributes of an existing node.
    pub fn set_node_attrs(&mut self, id: &str, attrs: &[NodeAttribute]) -> Result<(), ModelError> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| ModelError::NotFound(format!("node '{}' does not exist", id)))?;
        for attr in attrs {
            node.attrs.apply(*attr);
        }
        Ok(())
    }

    /// Add a directed link between two existing nodes.
    ///
    /// Both endpoints must exist, and the pair must not already be
    /// linked; link identity is the `(from, to)` pair itself.
    pub fn add_link(&mut self, from: &str, to: &str) -> Result<(), ModelError> {
        if !self.nodes.contains_key(from) {
            return Err(ModelError::NotFound(format!(
                "node '{}' does not exist",
                from
            )));
        }
        if !self.nodes.contains_key(to) {
            return Err(ModelError::NotFound(format!("node '{}' does not exist", to)));
        }
        let edge = EdgeId::new(from.to_string(), to.to_string());
        if self.links.contains(&edge) {
            return Err(ModelError::Validation(format!(
                "link {} already exists",
                edge
            )));
        }
        log::debug!("Adding link {}", edge);
        self.links.insert(edge);
        Ok(())
    }

    /// Remove a directed link.
    pub fn remove_link(&mut self, from: &str, to: &str) -> Result<(), ModelError> {
        if !self.nodes.contains_key(from) {
            return Err(ModelError::NotFound(format!(
                "node '{}' does not exist",
                from
            )));
        }
        if !self.nodes.contains_key(to) {
            return Err(ModelError::NotFound(format!("node '{}' does not exist", to)));
        }
        let edge = EdgeId::new(from.to_string(), to.to_string());
        if !self.links.remove(&edge) {
            return Err(ModelError::NotFound(format!("link {} does not exist", edge)));
        }
        log::debug!("Removed link {}", edge);
        Ok(())
    }

    /// Create a boundary group over existing nodes.
    pub fn add_group(
        &mut self,
        name: &str,
        members: impl IntoIterator<Item = String>,
    ) -> Result<(), ModelError> {
        if self.groups.contains_key(name) {
            return Err(ModelError::Validation(format!(
                "group '{}' already exists",
                name
            )));
        }
        let group = BoundaryGroup::new(name.to_string(), members);
        for member in &group.members {
            if !self.nodes.contains_key(member.as_str()) {
                return Err(ModelError::NotFound(format!(
                    "node '{}' does not exist",
                    member
                )));
            }
        }
        log::debug!("Adding group {} ({} members)", name, group.members.len());
        self.groups.insert(name.to_string(), group);
        Ok(())
    }

    /// Remove a boundary group. Member nodes are unaffected.
    pub fn remove_group(&mut self, name: &str) -> Result<BoundaryGroup, ModelError> {
        self.groups
            .remove(name)
            .ok_or_else(|| ModelError::NotFound(format!("group '{}' does not exist", name)))
    }

    /// Replace the entire model with a freshly validated one.
    ///
    /// Used by document loading: the incoming model has already passed
    /// structural validation, so the swap is atomic by construction.
    pub fn replace(&mut self, other: TopologyModel) {
        *self = other;
    }

    /// Check referential integrity of the whole graph.
    ///
    /// The per-operation validations make violations unreachable through
    /// the public API; this exists for models assembled from documents
    /// and as a debugging aid. Returns every violation found.
    pub fn integrity_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        for edge in &self.links {
            if !self.nodes.contains_key(&edge.from) {
                violations.push(format!("link {} references missing node '{}'", edge, edge.from));
            }
            if !self.nodes.contains_key(&edge.to) {
                violations.push(format!("link {} references missing node '{}'", edge, edge.to));
            }
        }
        for group in self.groups.values() {
            for member in &group.members {
                if !self.nodes.contains_key(member.as_str()) {
                    violations.push(format!(
                        "group '{}' references missing node '{}'",
                        group.name, member
                    ));
                }
            }
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::types::NodeAttributes;

    fn base_model() -> TopologyModel {
        let mut model = TopologyModel::new();
        model.add_node(Node::new("gen", NodeKind::Source)).unwrap();
        model.add_node(Node::new("gw", NodeKind::Ingress)).unwrap();
        model.add_node(Node::new("app", NodeKind::Service)).unwrap();
        model.add_node(Node::new("store", NodeKind::Sink)).unwrap();
        model.add_link("gen", "gw").unwrap();
        model.add_link("gw", "app").unwrap();
        model.add_link("app", "store").unwrap();
        model
    }

    #[test]
    fn test_add_node_rejects_duplicate() {
        let mut model = base_model();
        let err = model.add_node(Node::new("app", NodeKind::Service)).unwrap_err();
        assert_eq!(
            err,
            ModelError::Validation("node 'app' already exists".to_string())
        );
        assert_eq!(model.node_count(), 4);
    }

    #[test]
    fn test_remove_node_cascades_links() {
        let mut model = base_model();
        let removed = model.remove_node("app").unwrap();
        assert_eq!(removed.node.id, "app");
        assert_eq!(
            removed.removed_links,
            vec![EdgeId::new("app", "store"), EdgeId::new("gw", "app")]
        );
        assert_eq!(model.link_count(), 1);
        assert!(model.has_link("gen", "gw"));
        assert!(!model.has_link("gw", "app"));
    }

    #[test]
    fn test_remove_missing_node() {
        let mut model = base_model();
        let err = model.remove_node("ghost").unwrap_err();
        assert_eq!(
            err,
            ModelError::NotFound("node 'ghost' does not exist".to_string())
        );
    }

    #[test]
    fn test_remove_then_readd_leaves_links_gone() {
        let mut model = base_model();
        model.remove_node("app").unwrap();
        model.add_node(Node::new("app", NodeKind::Service)).unwrap();
        // The node is back but its former links are not.
        assert!(model.has_node("app"));
        assert!(!model.has_link("gw", "app"));
        assert!(!model.has_link("app", "store"));
        assert_eq!(model.link_count(), 1);
    }

    #[test]
    fn test_add_link_requires_endpoints() {
        let mut model = base_model();
        let err = model.add_link("gen", "ghost").unwrap_err();
        assert_eq!(
            err,
            ModelError::NotFound("node 'ghost' does not exist".to_string())
        );
        let err = model.add_link("ghost", "gen").unwrap_err();
        assert!(matches!(err, ModelError::NotFound(_)));
    }

    #[test]
    fn test_add_duplicate_link_rejected() {
        let mut model = base_model();
        let err = model.add_link("gen", "gw").unwrap_err();
        assert_eq!(
            err,
            ModelError::Validation("link gen -> gw already exists".to_string())
        );
        assert_eq!(model.link_count(), 3);
    }

    #[test]
    fn test_reverse_direction_is_a_distinct_link() {
        let mut model = base_model();
        model.add_link("gw", "gen").unwrap();
        assert!(model.has_link("gen", "gw"));
        assert!(model.has_link("gw", "gen"));
        assert_eq!(model.link_count(), 4);
    }

    #[test]
    fn test_remove_link_missing() {
        let mut model = base_model();
        let err = model.remove_link("gen", "app").unwrap_err();
        assert_eq!(
            err,
            ModelError::NotFound("link gen -> app does not exist".to_string())
        );
        let err = model.remove_link("ghost", "app").unwrap_err();
        assert_eq!(
            err,
            ModelError::NotFound("node 'ghost' does not exist".to_string())
        );
    }

    #[test]
    fn test_set_node_attrs() {
        let mut model = base_model();
        model
            .set_node_attrs(
                "app",
                &[NodeAttribute::Capacity(250.0), NodeAttribute::Processing(3.0)],
            )
            .unwrap();
        let node = model.node("app").unwrap();
        assert_eq!(node.attrs.capacity, 250.0);
        assert_eq!(node.attrs.processing, 3.0);

        let err = model
            .set_node_attrs("ghost", &[NodeAttribute::Capacity(1.0)])
            .unwrap_err();
        assert!(matches!(err, ModelError::NotFound(_)));
    }

    #[test]
    fn test_group_lifecycle() {
        let mut model = base_model();
        model
            .add_group("frontend", vec!["gw".to_string(), "app".to_string()])
            .unwrap();
        assert_eq!(model.group_count(), 1);
        assert!(model.group("frontend").unwrap().contains("gw"));

        let err = model
            .add_group("frontend", vec!["store".to_string()])
            .unwrap_err();
        assert!(matches!(err, ModelError::Validation(_)));

        let err = model
            .add_group("backend", vec!["ghost".to_string()])
            .unwrap_err();
        assert!(matches!(err, ModelError::NotFound(_)));
        // Failed creation must not leave a partial group behind.
        assert_eq!(model.group_count(), 1);

        let removed = model.remove_group("frontend").unwrap();
        assert_eq!(removed.name, "frontend");
        assert!(model.has_node("gw"));
        assert_eq!(model.group_count(), 0);
    }

    #[test]
    fn test_remove_node_prunes_group_membership() {
        let mut model = base_model();
        model
            .add_group("frontend", vec!["gw".to_string(), "app".to_string()])
            .unwrap();
        model.remove_node("gw").unwrap();
        let group = model.group("frontend").unwrap();
        assert!(!group.contains("gw"));
        assert!(group.contains("app"));
    }

    #[test]
    fn test_traffic_origins_and_terminals_sorted() {
        let model = base_model();
        let origins: Vec<&str> = model.traffic_origins().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(origins, vec!["gen", "gw"]);
        let terminals: Vec<&str> = model
            .traffic_terminals()
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(terminals, vec!["store"]);
    }

    #[test]
    fn test_links_into_and_out_of() {
        let model = base_model();
        let into_app: Vec<String> = model.links_into("app").iter().map(|e| e.to_string()).collect();
        assert_eq!(into_app, vec!["gw -> app"]);
        let out_of_app: Vec<String> = model
            .links_out_of("app")
            .iter()
            .map(|e| e.to_string())
            .collect();
        assert_eq!(out_of_app, vec!["app -> store"]);
    }

    #[test]
    fn test_self_loop_allowed() {
        let mut model = base_model();
        model.add_link("app", "app").unwrap();
        assert!(model.has_link("app", "app"));
        let removed = model.remove_node("app").unwrap();
        // The self loop appears once in the cascade report.
        assert!(removed.removed_links.contains(&EdgeId::new("app", "app")));
        assert_eq!(
            removed
                .removed_links
                .iter()
                .filter(|e| **e == EdgeId::new("app", "app"))
                .count(),
            1
        );
    }

    #[test]
    fn test_replace_swaps_everything() {
        let mut model = base_model();
        let mut fresh = TopologyModel::new();
        fresh
            .add_node(Node::with_attrs(
                "only",
                NodeKind::Service,
                NodeAttributes::default(),
            ))
            .unwrap();
        model.replace(fresh);
        assert_eq!(model.node_count(), 1);
        assert!(model.has_node("only"));
        assert_eq!(model.link_count(), 0);
        assert_eq!(model.group_count(), 0);
    }

    #[test]
    fn test_integrity_violations_empty_for_api_built_model() {
        let model = base_model();
        assert!(model.integrity_violations().is_empty());
    }
}
