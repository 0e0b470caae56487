//! Topology document loading, validation, and saving.
//!
//! Documents are YAML with `nodes`, `links`, `groups`, and optional
//! `simulation` settings. Loading validates referential integrity up
//! front and rejects the whole document on any violation, so a model is
//! only ever built from a document that is known to be consistent.

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::topology::{Node, NodeAttributes, NodeKind, TopologyModel};

/// Errors from document load/save.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse document: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("structural integrity violation: {0}")]
    Integrity(String),
}

fn default_capacity() -> f64 {
    100.0
}

fn default_tick_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_seed() -> u64 {
    42
}

/// One node entry in a topology document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: String,
    pub kind: NodeKind,
    #[serde(default = "default_capacity")]
    pub capacity: f64,
    #[serde(default)]
    pub processing: f64,
}

/// One directed link entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkSpec {
    pub from: String,
    pub to: String,
}

/// One boundary group entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub name: String,
    #[serde(default)]
    pub members: Vec<String>,
}

/// Simulation settings carried alongside the topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSettings {
    /// Wall-clock interval between traffic windows, e.g. `250ms` or `2s`.
    #[serde(with = "humantime_serde", default = "default_tick_interval")]
    pub tick_interval: Duration,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        SimulationSettings {
            tick_interval: default_tick_interval(),
            seed: default_seed(),
        }
    }
}

/// A complete topology document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologyDocument {
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub links: Vec<LinkSpec>,
    #[serde(default)]
    pub groups: Vec<GroupSpec>,
    #[serde(default)]
    pub simulation: Option<SimulationSettings>,
}

impl TopologyDocument {
    /// Check referential integrity and value sanity of the document.
    ///
    /// Returns the first violation found; loading is all-or-nothing, so
    /// one violation is enough to reject.
    pub fn validate(&self) -> Result<(), LoadError> {
        let mut seen_nodes = std::collections::BTreeSet::new();
        for node in &self.nodes {
            if !seen_nodes.insert(node.id.as_str()) {
                return Err(LoadError::Integrity(format!(
                    "duplicate node id '{}'",
                    node.id
                )));
            }
            if !node.capacity.is_finite() || node.capacity <= 0.0 {
                return Err(LoadError::Integrity(format!(
                    "node '{}': capacity must be a positive number",
                    node.id
                )));
            }
            if !node.processing.is_finite() || node.processing < 0.0 {
                return Err(LoadError::Integrity(format!(
                    "node '{}': processing must be a non-negative number",
                    node.id
                )));
            }
        }

        let mut seen_links = std::collections::BTreeSet::new();
        for link in &self.links {
            for endpoint in [&link.from, &link.to] {
                if !seen_nodes.contains(endpoint.as_str()) {
                    return Err(LoadError::Integrity(format!(
                        "link {} -> {} references missing node '{}'",
                        link.from, link.to, endpoint
                    )));
                }
            }
            if !seen_links.insert((link.from.as_str(), link.to.as_str())) {
                return Err(LoadError::Integrity(format!(
                    "duplicate link {} -> {}",
                    link.from, link.to
                )));
            }
        }

        let mut seen_groups = std::collections::BTreeSet::new();
        for group in &self.groups {
            if !seen_groups.insert(group.name.as_str()) {
                return Err(LoadError::Integrity(format!(
                    "duplicate group '{}'",
                    group.name
                )));
            }
            for member in &group.members {
                if !seen_nodes.contains(member.as_str()) {
                    return Err(LoadError::Integrity(format!(
                        "group '{}' references missing node '{}'",
                        group.name, member
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Build a model from a validated document.
pub fn document_to_model(doc: &TopologyDocument) -> Result<TopologyModel, LoadError> {
    doc.validate()?;
    let mut model = TopologyModel::new();
    for spec in &doc.nodes {
        let node = Node::with_attrs(
            spec.id.clone(),
            spec.kind,
            NodeAttributes {
                capacity: spec.capacity,
                processing: spec.processing,
            },
        );
        model
            .add_node(node)
            .map_err(|e| LoadError::Integrity(e.to_string()))?;
    }
    for link in &doc.links {
        model
            .add_link(&link.from, &link.to)
            .map_err(|e| LoadError::Integrity(e.to_string()))?;
    }
    for group in &doc.groups {
        model
            .add_group(&group.name, group.members.iter().cloned())
            .map_err(|e| LoadError::Integrity(e.to_string()))?;
    }
    Ok(model)
}

/// Export the current model as a document ("read full topology").
pub fn model_to_document(model: &TopologyModel) -> TopologyDocument {
    TopologyDocument {
        nodes: model
            .nodes()
            .map(|n| NodeSpec {
                id: n.id.clone(),
                kind: n.kind,
                capacity: n.attrs.capacity,
                processing: n.attrs.processing,
            })
            .collect(),
        links: model
            .links()
            .map(|e| LinkSpec {
                from: e.from.clone(),
                to: e.to.clone(),
            })
            .collect(),
        groups: model
            .groups()
            .map(|g| GroupSpec {
                name: g.name.clone(),
                members: g.members.iter().cloned().collect(),
            })
            .collect(),
        simulation: None,
    }
}

/// Load and validate a topology document from a YAML file.
pub fn load_document(path: &Path) -> Result<TopologyDocument, LoadError> {
    log::info!("Loading topology document from {}", path.display());
    let file = File::open(path)?;
    let doc: TopologyDocument = serde_yaml::from_reader(file)?;
    doc.validate()?;
    log::info!(
        "Loaded document: {} node(s), {} link(s), {} group(s)",
        doc.nodes.len(),
        doc.links.len(),
        doc.groups.len()
    );
    Ok(doc)
}

/// Load a document and build its model in one step.
pub fn load_model(path: &Path) -> Result<(TopologyModel, Option<SimulationSettings>), LoadError> {
    let doc = load_document(path)?;
    let model = document_to_model(&doc)?;
    Ok((model, doc.simulation))
}

/// Write a document as YAML.
pub fn save_document(doc: &TopologyDocument, path: &Path) -> Result<(), LoadError> {
    let yaml = serde_yaml::to_string(doc)?;
    std::fs::write(path, yaml)?;
    log::info!("Saved topology document to {}", path.display());
    Ok(())
}
