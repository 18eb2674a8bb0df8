//! Tagged directed graph used for both pattern and target graphs
//!
//! Backed by a petgraph `DiGraph` plus a tag → index map. Node iteration
//! follows insertion order; callers needing a stable order regardless of
//! how the graph was built use [`Graph::sorted_tags`].

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};

use super::{Edge, Node, NodeTag};
use crate::errors::{GraphError, Result};

#[derive(Debug, Clone, Default)]
pub struct Graph {
    inner: DiGraph<Node, Edge>,
    index: HashMap<NodeTag, NodeIndex>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node.
    ///
    /// Re-inserting an identical node is a no-op. Reusing a tag with
    /// different text is a [`GraphError::ConflictingNode`].
    pub fn add_node(&mut self, node: Node) -> Result<()> {
        if let Some(&idx) = self.index.get(&node.tag) {
            let existing = &self.inner[idx];
            if existing.text == node.text {
                return Ok(());
            }
            return Err(GraphError::ConflictingNode {
                tag: node.tag,
                first: existing.text.clone(),
                second: node.text,
            });
        }

        let tag = node.tag;
        let idx = self.inner.add_node(node);
        self.index.insert(tag, idx);
        Ok(())
    }

    /// Insert an edge between two existing nodes.
    ///
    /// Returns `false` when an endpoint is missing or the edge already exists.
    pub fn add_edge(&mut self, edge: Edge) -> bool {
        let (Some(&src), Some(&dst)) = (self.index.get(&edge.src), self.index.get(&edge.dst))
        else {
            return false;
        };
        if self.inner.find_edge(src, dst).is_some() {
            return false;
        }
        self.inner.add_edge(src, dst, edge);
        true
    }

    pub fn node(&self, tag: NodeTag) -> Option<&Node> {
        self.index.get(&tag).map(|&idx| &self.inner[idx])
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.inner.node_weights()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.inner.edge_weights()
    }

    pub fn has_edge(&self, src: NodeTag, dst: NodeTag) -> bool {
        match (self.index.get(&src), self.index.get(&dst)) {
            (Some(&s), Some(&d)) => self.inner.find_edge(s, d).is_some(),
            _ => false,
        }
    }

    pub fn edge(&self, src: NodeTag, dst: NodeTag) -> Option<&Edge> {
        let s = *self.index.get(&src)?;
        let d = *self.index.get(&dst)?;
        self.inner.find_edge(s, d).map(|e| &self.inner[e])
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.node_count() == 0
    }

    /// All node tags, ascending
    pub fn sorted_tags(&self) -> Vec<NodeTag> {
        let mut tags: Vec<NodeTag> = self.index.keys().copied().collect();
        tags.sort_unstable();
        tags
    }

    /// Copy of the given nodes and the listed edges between them.
    ///
    /// Unknown tags are ignored, as are edges this graph does not contain.
    pub fn subgraph(&self, tags: &[NodeTag], edges: &[(NodeTag, NodeTag)]) -> Graph {
        let mut sub = Graph::new();
        for &tag in tags {
            if let Some(node) = self.node(tag) {
                // Tags come from this graph, so they cannot conflict.
                let _ = sub.add_node(node.clone());
            }
        }
        for &(src, dst) in edges {
            if let Some(edge) = self.edge(src, dst) {
                sub.add_edge(edge.clone());
            }
        }
        sub
    }

    fn sorted_edges(&self) -> Vec<&Edge> {
        let mut edges: Vec<&Edge> = self.inner.edge_weights().collect();
        edges.sort_by_key(|e| e.endpoints());
        edges
    }

    fn sorted_nodes(&self) -> Vec<&Node> {
        let mut nodes: Vec<&Node> = self.inner.node_weights().collect();
        nodes.sort_by_key(|n| n.tag);
        nodes
    }
}

/// Structural equality: same nodes and same edges, regardless of insertion order.
impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        self.node_count() == other.node_count()
            && self.edge_count() == other.edge_count()
            && self.sorted_nodes() == other.sorted_nodes()
            && self.sorted_edges() == other.sorted_edges()
    }
}

impl Eq for Graph {}
