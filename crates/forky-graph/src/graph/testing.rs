//! Graph fixtures for unit tests.

use crate::graph::attributes::{GraphAttributes, GraphKind, WeightedNode};
use crate::graph::store::ForkGraph;
use crate::model::Weight;

pub type TestGraph = ForkGraph<WeightedNode, GraphAttributes>;

pub fn test_node(slot: u64, offset: i64, weight: u64) -> WeightedNode {
    let mut node = WeightedNode::new(slot, format!("0x{slot:02x}"), Weight::from(weight));
    node.offset = offset;
    node
}

/// Build a graph from `(id, slot, weight)` nodes and `(parent, child)` edges.
/// Each node's block root is its id.
pub fn test_graph(nodes: &[(&str, u64, u64)], edges: &[(&str, &str)]) -> TestGraph {
    let mut graph = TestGraph::new(GraphAttributes::new(GraphKind::Weighted));
    for &(id, slot, weight) in nodes {
        let mut node = test_node(slot, 0, weight);
        node.block_root = id.to_string();
        assert!(graph.add_node(id, node), "duplicate test node {id}");
    }
    for &(parent, child) in edges {
        graph.add_edge(parent, child).expect("test edge");
    }
    graph
}
