//! Attributed directed graph keyed by string node ids.
//!
//! # Overview
//!
//! [`ForkGraph`] wraps a petgraph [`DiGraph`] with:
//!
//! - an `id → NodeIndex` map so callers address nodes by their composite id,
//! - typed per-node attributes `N` and per-edge [`EdgeAttributes`],
//! - graph-level attributes `G`.
//!
//! ## Ordering
//!
//! Nodes are never removed, so petgraph's node indices follow insertion
//! order and [`ForkGraph::node_ids`] iterates in that order. Builders insert
//! nodes sorted by slot, which makes iteration order the slot order without
//! reordering anything after the fact.
//!
//! petgraph yields neighbours most-recent-edge first. [`ForkGraph::children`]
//! re-sorts by edge index so children come back in edge insertion order,
//! which the "first encountered wins" tie-breaks depend on.
//!
//! ## Acyclicity
//!
//! [`ForkGraph::add_edge`] only accepts a parent at a strictly lower slot
//! than its child, so every graph built through it is a DAG and the
//! subtree walks in [`crate::graph::metrics`] always terminate.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;
use std::fmt;

use petgraph::Direction;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;

use crate::error::{EdgeError, LookupError};

// ---------------------------------------------------------------------------
// Node contract
// ---------------------------------------------------------------------------

/// Attributes every laid-out node exposes to the layout passes.
pub trait LayoutNode {
    fn slot(&self) -> u64;
    fn block_root(&self) -> &str;
    fn canonical(&self) -> bool;
    fn set_canonical(&mut self, canonical: bool);
    /// Vertical lane. 0 is the canonical centerline.
    fn offset(&self) -> i64;
    fn set_offset(&mut self, offset: i64);
}

/// Composite node id: `slot ++ block_root ++ parent_root`.
///
/// Two blocks with the same root but different parents (or the same block
/// replayed across merges) therefore never collide.
#[must_use]
pub fn node_id(slot: u64, block_root: &str, parent_root: &str) -> String {
    format!("{slot}{block_root}{parent_root}")
}

// ---------------------------------------------------------------------------
// Edges
// ---------------------------------------------------------------------------

/// Stable identifier of an edge within one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EdgeId(usize);

impl EdgeId {
    fn index(self) -> EdgeIndex {
        EdgeIndex::new(self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Attributes on a parent → child edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EdgeAttributes {
    /// `child.slot - parent.slot`.
    pub distance: u64,
}

/// Borrowed view of one edge.
#[derive(Debug, Clone, Copy)]
pub struct EdgeView<'a> {
    pub id: EdgeId,
    pub source: &'a str,
    pub target: &'a str,
    pub attributes: &'a EdgeAttributes,
}

// ---------------------------------------------------------------------------
// ForkGraph
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Entry<N> {
    id: String,
    attributes: N,
}

/// Attributed DAG of blocks.
#[derive(Debug, Clone)]
pub struct ForkGraph<N, G> {
    graph: DiGraph<Entry<N>, EdgeAttributes>,
    index: HashMap<String, NodeIndex>,
    attributes: G,
}

impl<N, G> ForkGraph<N, G> {
    /// Create an empty graph with the given graph-level attributes.
    #[must_use]
    pub fn new(attributes: G) -> Self {
        Self::with_capacity(0, attributes)
    }

    #[must_use]
    pub fn with_capacity(nodes: usize, attributes: G) -> Self {
        Self {
            graph: DiGraph::with_capacity(nodes, nodes),
            index: HashMap::with_capacity(nodes),
            attributes,
        }
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    #[must_use]
    pub fn contains_node(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Insert a node. Returns `false` (and leaves the graph untouched) when
    /// `id` is already present.
    pub fn add_node(&mut self, id: impl Into<String>, attributes: N) -> bool {
        let id = id.into();
        if self.index.contains_key(&id) {
            return false;
        }
        let idx = self.graph.add_node(Entry {
            id: id.clone(),
            attributes,
        });
        self.index.insert(id, idx);
        true
    }

    /// Node ids in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.graph.node_indices().map(|idx| self.graph[idx].id.as_str())
    }

    /// `(id, attributes)` pairs in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (&str, &N)> + '_ {
        self.graph
            .node_indices()
            .map(|idx| (self.graph[idx].id.as_str(), &self.graph[idx].attributes))
    }

    /// All attributes of a node.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::NodeNotFound`] if `id` is not in the graph.
    pub fn node(&self, id: &str) -> Result<&N, LookupError> {
        self.lookup(id).map(|idx| &self.graph[idx].attributes)
    }

    #[cfg(test)]
    pub(crate) fn node_mut(&mut self, id: &str) -> Result<&mut N, LookupError> {
        let idx = self.lookup(id)?;
        Ok(&mut self.graph[idx].attributes)
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeView<'_>> + '_ {
        self.graph.edge_references().map(|edge| EdgeView {
            id: EdgeId(edge.id().index()),
            source: self.graph[edge.source()].id.as_str(),
            target: self.graph[edge.target()].id.as_str(),
            attributes: edge.weight(),
        })
    }

    /// Attributes of one edge.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::EdgeNotFound`] for an unknown edge id.
    pub fn edge(&self, id: EdgeId) -> Result<&EdgeAttributes, LookupError> {
        self.graph
            .edge_weight(id.index())
            .ok_or(LookupError::EdgeNotFound(id))
    }

    /// `(source id, target id)` of an edge.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::EdgeNotFound`] for an unknown edge id.
    pub fn edge_endpoints(&self, id: EdgeId) -> Result<(&str, &str), LookupError> {
        let (source, target) = self
            .graph
            .edge_endpoints(id.index())
            .ok_or(LookupError::EdgeNotFound(id))?;
        Ok((self.graph[source].id.as_str(), self.graph[target].id.as_str()))
    }

    /// Attributes of the node an edge starts at (the parent).
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::EdgeNotFound`] for an unknown edge id.
    pub fn source_attributes(&self, id: EdgeId) -> Result<&N, LookupError> {
        let (source, _) = self
            .graph
            .edge_endpoints(id.index())
            .ok_or(LookupError::EdgeNotFound(id))?;
        Ok(&self.graph[source].attributes)
    }

    /// Attributes of the node an edge points to (the child).
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::EdgeNotFound`] for an unknown edge id.
    pub fn target_attributes(&self, id: EdgeId) -> Result<&N, LookupError> {
        let (_, target) = self
            .graph
            .edge_endpoints(id.index())
            .ok_or(LookupError::EdgeNotFound(id))?;
        Ok(&self.graph[target].attributes)
    }

    /// Child ids of `id`, in edge insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::NodeNotFound`] if `id` is not in the graph.
    pub fn children(&self, id: &str) -> Result<Vec<&str>, LookupError> {
        let idx = self.lookup(id)?;
        Ok(self
            .children_at(idx)
            .into_iter()
            .map(|child| self.graph[child].id.as_str())
            .collect())
    }

    /// Parent id of `id`, if it has one in the graph.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::NodeNotFound`] if `id` is not in the graph.
    pub fn parent(&self, id: &str) -> Result<Option<&str>, LookupError> {
        let idx = self.lookup(id)?;
        Ok(self
            .parent_at(idx)
            .map(|parent| self.graph[parent].id.as_str()))
    }

    /// Graph-level attributes.
    #[must_use]
    pub fn attributes(&self) -> &G {
        &self.attributes
    }

    pub(crate) fn attributes_mut(&mut self) -> &mut G {
        &mut self.attributes
    }

    // -- index-level helpers used by the layout passes ----------------------

    pub(crate) fn lookup(&self, id: &str) -> Result<NodeIndex, LookupError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| LookupError::NodeNotFound(id.to_string()))
    }

    pub(crate) fn indices(&self) -> impl DoubleEndedIterator<Item = NodeIndex> {
        self.graph.node_indices()
    }

    pub(crate) fn id_at(&self, idx: NodeIndex) -> &str {
        &self.graph[idx].id
    }

    pub(crate) fn at(&self, idx: NodeIndex) -> &N {
        &self.graph[idx].attributes
    }

    pub(crate) fn at_mut(&mut self, idx: NodeIndex) -> &mut N {
        &mut self.graph[idx].attributes
    }

    pub(crate) fn children_at(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut edges: Vec<(EdgeIndex, NodeIndex)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|edge| (edge.id(), edge.target()))
            .collect();
        edges.sort_unstable_by_key(|(edge, _)| *edge);
        edges.into_iter().map(|(_, child)| child).collect()
    }

    pub(crate) fn parent_at(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .map(|edge| (edge.id(), edge.source()))
            .min_by_key(|(edge, _)| *edge)
            .map(|(_, parent)| parent)
    }
}

impl<N: LayoutNode, G> ForkGraph<N, G> {
    /// Add a directed `parent → child` edge.
    ///
    /// # Errors
    ///
    /// - [`EdgeError::MissingEndpoint`] if either node is absent.
    /// - [`EdgeError::SelfLoop`] if `parent == child`.
    /// - [`EdgeError::Exists`] if the edge is already present.
    /// - [`EdgeError::NotAscending`] if the parent's slot is not strictly
    ///   below the child's.
    pub fn add_edge(&mut self, parent: &str, child: &str) -> Result<EdgeId, EdgeError> {
        let parent_idx = self
            .index
            .get(parent)
            .copied()
            .ok_or_else(|| EdgeError::MissingEndpoint(parent.to_string()))?;
        let child_idx = self
            .index
            .get(child)
            .copied()
            .ok_or_else(|| EdgeError::MissingEndpoint(child.to_string()))?;

        if parent_idx == child_idx {
            return Err(EdgeError::SelfLoop(child.to_string()));
        }
        if self.graph.contains_edge(parent_idx, child_idx) {
            return Err(EdgeError::Exists {
                parent: parent.to_string(),
                child: child.to_string(),
            });
        }

        let parent_slot = self.graph[parent_idx].attributes.slot();
        let child_slot = self.graph[child_idx].attributes.slot();
        if parent_slot >= child_slot {
            return Err(EdgeError::NotAscending {
                parent: parent.to_string(),
                parent_slot,
                child: child.to_string(),
                child_slot,
            });
        }

        let edge = self.graph.add_edge(
            parent_idx,
            child_idx,
            EdgeAttributes {
                distance: child_slot - parent_slot,
            },
        );
        Ok(EdgeId(edge.index()))
    }

    /// First node (in iteration order) whose block root is `block_root`.
    #[must_use]
    pub fn find_by_block_root(&self, block_root: &str) -> Option<&str> {
        self.nodes()
            .find(|(_, attrs)| attrs.block_root() == block_root)
            .map(|(id, _)| id)
    }
}

// ---------------------------------------------------------------------------
// Named attribute access and export
// ---------------------------------------------------------------------------

impl<N: Serialize, G> ForkGraph<N, G> {
    /// Fetch one attribute of a node by its serialized (camelCase) name.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::NodeNotFound`] for an unknown node and
    /// [`LookupError::AttributeNotFound`] when the node has no such
    /// attribute (including optional attributes that are unset).
    pub fn node_attribute(&self, id: &str, name: &str) -> Result<serde_json::Value, LookupError> {
        let attrs = self.node(id)?;
        let missing = || LookupError::AttributeNotFound {
            id: id.to_string(),
            name: name.to_string(),
        };
        match serde_json::to_value(attrs) {
            Ok(serde_json::Value::Object(mut map)) => map.remove(name).ok_or_else(missing),
            _ => Err(missing()),
        }
    }
}

/// Serializable dump of a whole graph, for the export/download layer.
#[derive(Debug, Serialize)]
pub struct GraphExport<'a, N, G> {
    pub attributes: &'a G,
    pub nodes: Vec<NodeExport<'a, N>>,
    pub edges: Vec<EdgeExport<'a>>,
}

#[derive(Debug, Serialize)]
pub struct NodeExport<'a, N> {
    pub key: &'a str,
    pub attributes: &'a N,
}

#[derive(Debug, Serialize)]
pub struct EdgeExport<'a> {
    pub key: String,
    pub source: &'a str,
    pub target: &'a str,
    pub attributes: &'a EdgeAttributes,
}

impl<N, G> ForkGraph<N, G> {
    /// Borrowed export of the graph in iteration order.
    #[must_use]
    pub fn export(&self) -> GraphExport<'_, N, G> {
        GraphExport {
            attributes: &self.attributes,
            nodes: self
                .nodes()
                .map(|(key, attributes)| NodeExport { key, attributes })
                .collect(),
            edges: self
                .edges()
                .map(|edge| EdgeExport {
                    key: edge.id.to_string(),
                    source: edge.source,
                    target: edge.target,
                    attributes: edge.attributes,
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
