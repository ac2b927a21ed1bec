//! Pose templates: named nodes and their connectivity

use crate::error::{LabelsError, Result};
use crate::model::id::Uid;

/// A pose template: an ordered list of named nodes plus directed edges.
///
/// Edges are stored as pairs of node positions. Cloning keeps the identity
/// ([`Skeleton::same_as`]); use [`Skeleton::duplicate`] for a structurally
/// identical skeleton with a new identity.
#[derive(Debug, Clone)]
pub struct Skeleton {
    uid: Uid,
    pub name: String,
    nodes: Vec<String>,
    edges: Vec<(usize, usize)>,
}

impl Default for Skeleton {
    fn default() -> Self {
        Self::new("Skeleton")
    }
}

impl Skeleton {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            uid: Uid::fresh(),
            name: name.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Build a skeleton from node names and edges given by node name.
    pub fn from_names<S: AsRef<str>>(
        name: impl Into<String>,
        nodes: &[S],
        edges: &[(S, S)],
    ) -> Result<Self> {
        let mut skeleton = Self::new(name);
        skeleton.add_nodes(nodes)?;
        for (src, dst) in edges {
            skeleton.add_edge(src.as_ref(), dst.as_ref())?;
        }
        Ok(skeleton)
    }

    pub fn uid(&self) -> Uid {
        self.uid
    }

    /// Identity comparison (not structural; see `StructuralEq`)
    pub fn same_as(&self, other: &Skeleton) -> bool {
        self.uid == other.uid
    }

    /// Same structure, new identity
    pub fn duplicate(&self) -> Self {
        Self {
            uid: Uid::fresh(),
            ..self.clone()
        }
    }

    /// Append a node, returning its position.
    pub fn add_node(&mut self, name: impl Into<String>) -> Result<usize> {
        let name = name.into();
        if self.node_index(&name).is_some() {
            return Err(LabelsError::InvalidSkeleton(format!(
                "node '{}' already exists in skeleton '{}'",
                name, self.name
            )));
        }
        self.nodes.push(name);
        Ok(self.nodes.len() - 1)
    }

    pub fn add_nodes<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        for name in names {
            self.add_node(name.as_ref())?;
        }
        Ok(())
    }

    /// Add a directed edge between two existing nodes. Adding an edge twice
    /// is a no-op.
    pub fn add_edge(&mut self, source: &str, destination: &str) -> Result<()> {
        let src = self.require_node(source)?;
        let dst = self.require_node(destination)?;
        self.add_edge_by_index(src, dst)
    }

    pub fn add_edge_by_index(&mut self, source: usize, destination: usize) -> Result<()> {
        if source >= self.nodes.len() || destination >= self.nodes.len() {
            return Err(LabelsError::InvalidSkeleton(format!(
                "edge ({}, {}) out of range for {} nodes",
                source,
                destination,
                self.nodes.len()
            )));
        }
        if !self.edges.contains(&(source, destination)) {
            self.edges.push((source, destination));
        }
        Ok(())
    }

    fn require_node(&self, name: &str) -> Result<usize> {
        self.node_index(name).ok_or_else(|| {
            LabelsError::InvalidSkeleton(format!(
                "no node '{}' in skeleton '{}'",
                name, self.name
            ))
        })
    }

    pub fn node_index(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n == name)
    }

    pub fn node_names(&self) -> &[String] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    /// Edges as `(source name, destination name)`
    pub fn edge_names(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.edges
            .iter()
            .map(|&(s, d)| (self.nodes[s].as_str(), self.nodes[d].as_str()))
    }

    /// Edge list in a canonical order, for set comparison.
    pub(crate) fn sorted_edges(&self) -> Vec<(usize, usize)> {
        let mut edges = self.edges.clone();
        edges.sort_unstable();
        edges
    }
}
