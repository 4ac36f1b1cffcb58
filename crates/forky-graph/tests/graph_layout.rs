//! Regression topologies for graph construction and lane assignment.

use forky_graph::graph::{
    GraphAttributes, GraphKind, WeightedNode, assign_offsets, deepest_descendant_slot,
    fork_count_beneath, heaviest_among, node_id,
};
use forky_graph::model::{BlockRecord, Checkpoint, CheckpointKind, ForkChoiceData, Weight};
use forky_graph::{GraphError, WeightedGraph, build_weighted_graph};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn graph_of(nodes: &[(&str, u64, u64)], edges: &[(&str, &str)]) -> WeightedGraph {
    let mut graph = WeightedGraph::new(GraphAttributes::new(GraphKind::Weighted));
    for &(id, slot, weight) in nodes {
        assert!(graph.add_node(id, WeightedNode::new(slot, id, Weight::from(weight))));
    }
    for &(parent, child) in edges {
        graph.add_edge(parent, child).expect("valid edge");
    }
    graph
}

fn offset(graph: &WeightedGraph, id: &str) -> i64 {
    graph.node(id).expect("node exists").offset
}

fn record(slot: u64, root: &str, parent: &str, weight: &str) -> BlockRecord {
    BlockRecord {
        slot: slot.to_string(),
        block_root: root.to_string(),
        parent_root: parent.to_string(),
        justified_epoch: "5".to_string(),
        finalized_epoch: "4".to_string(),
        weight: weight.to_string(),
        validity: "VALID".to_string(),
        execution_block_hash: "0x00".to_string(),
        extra_data: None,
    }
}

fn checkpoint(epoch: &str, root: &str) -> Option<Checkpoint> {
    Some(Checkpoint {
        epoch: epoch.to_string(),
        root: root.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Subtree metrics
// ---------------------------------------------------------------------------

#[test]
fn last_slot_with_forks() {
    let graph = graph_of(
        &[("A", 1, 1), ("B", 2, 1), ("C", 3, 1), ("D", 4, 1), ("E", 5, 1), ("F", 6, 1), ("G", 7, 1)],
        &[("A", "B"), ("B", "C"), ("C", "D"), ("B", "E"), ("E", "F"), ("F", "G")],
    );
    assert_eq!(deepest_descendant_slot(&graph, "A"), Ok(7));
    assert_eq!(deepest_descendant_slot(&graph, "C"), Ok(4));
}

#[test]
fn fork_count_over_nested_branches() {
    let graph = graph_of(
        &[("A", 1, 1), ("B", 2, 1), ("C", 3, 1), ("D", 4, 1), ("E", 5, 1), ("F", 6, 1), ("G", 7, 1)],
        &[("A", "B"), ("B", "C"), ("B", "D"), ("D", "E"), ("D", "F"), ("F", "G")],
    );
    assert_eq!(fork_count_beneath(&graph, "A"), Ok(2));
    assert_eq!(fork_count_beneath(&graph, "E"), Ok(0));
}

#[test]
fn heaviest_of_siblings() {
    let graph = graph_of(&[("A", 1, 1), ("B", 1, 2), ("C", 1, 3), ("D", 1, 4)], &[]);
    assert_eq!(heaviest_among(&graph, &["A", "B", "C", "D"]), Ok(Some("D")));
    let equal = graph_of(&[("A", 1, 5), ("B", 1, 5), ("C", 1, 5)], &[]);
    assert_eq!(heaviest_among(&equal, &["A", "B", "C"]), Ok(Some("A")));
}

// ---------------------------------------------------------------------------
// Offset assignment
// ---------------------------------------------------------------------------

fn diamond_fork(start: i64) -> WeightedGraph {
    let mut graph = WeightedGraph::new(GraphAttributes::new(GraphKind::Weighted));
    for (id, slot, weight) in [("A", 1, 10u64), ("B", 2, 9), ("C", 3, 7), ("D", 3, 8), ("E", 4, 5)] {
        let mut node = WeightedNode::new(slot, id, Weight::from(weight));
        if id == "A" {
            node.offset = start;
        }
        graph.add_node(id, node);
    }
    for (parent, child) in [("A", "B"), ("B", "C"), ("B", "D"), ("C", "E")] {
        graph.add_edge(parent, child).expect("valid edge");
    }
    graph
}

#[test]
fn offsets_for_two_equal_branches() {
    let mut graph = graph_of(
        &[("A", 1, 10), ("B", 2, 9), ("C", 3, 6), ("D", 3, 8), ("E", 4, 5), ("F", 4, 7)],
        &[("A", "B"), ("B", "C"), ("B", "D"), ("C", "E"), ("D", "F")],
    );
    assign_offsets(&mut graph, "A", 0, 1).expect("known node");
    for id in ["A", "B", "C", "E"] {
        assert_eq!(offset(&graph, id), 0, "{id}");
    }
    assert_eq!(offset(&graph, "D"), 1);
    assert_eq!(offset(&graph, "F"), 1);
}

#[test]
fn offsets_for_multiple_forks() {
    let mut graph = graph_of(
        &[
            ("A", 1, 10),
            ("B", 2, 9),
            ("C", 3, 7),
            ("D", 3, 8),
            ("E", 4, 5),
            ("F", 4, 6),
            ("G", 4, 4),
            ("H", 5, 3),
        ],
        &[("A", "B"), ("B", "C"), ("B", "D"), ("C", "E"), ("D", "F"), ("D", "G"), ("G", "H")],
    );
    assign_offsets(&mut graph, "A", 0, 1).expect("known node");
    for id in ["A", "B", "D", "G", "H"] {
        assert_eq!(offset(&graph, id), 0, "{id}");
    }
    assert_eq!(offset(&graph, "F"), 1);
    assert_eq!(offset(&graph, "C"), 2);
    assert_eq!(offset(&graph, "E"), 2);
}

#[test]
fn offsets_for_three_siblings() {
    let mut graph = graph_of(
        &[("A", 1, 10), ("B", 2, 9), ("C", 3, 7), ("D", 3, 8), ("E", 4, 5), ("F", 4, 6), ("G", 4, 4)],
        &[("A", "B"), ("B", "C"), ("B", "D"), ("B", "F"), ("C", "E"), ("D", "G")],
    );
    assign_offsets(&mut graph, "A", 0, 1).expect("known node");
    for id in ["A", "B", "C", "E"] {
        assert_eq!(offset(&graph, id), 0, "{id}");
    }
    assert_eq!(offset(&graph, "D"), 1);
    assert_eq!(offset(&graph, "G"), 1);
    assert_eq!(offset(&graph, "F"), 2);
}

#[test]
fn offsets_from_custom_start_and_direction() {
    for (start, direction, expected_d) in [(2, 1, 3), (0, -1, -1), (-2, -1, -3)] {
        let mut graph = diamond_fork(start);
        assign_offsets(&mut graph, "A", start, direction).expect("known node");
        for id in ["A", "B", "C", "E"] {
            assert_eq!(offset(&graph, id), start, "{id} from {start}/{direction}");
        }
        assert_eq!(offset(&graph, "D"), expected_d);
        assert!(!graph.node("D").expect("D").canonical);
    }
}

// ---------------------------------------------------------------------------
// Full snapshots
// ---------------------------------------------------------------------------

const FINALIZED: &str = "0x38da44a74a79c6db9160fd904bd0866708a0b73e474e532fe6a66030c1b6a249";
const JUSTIFIED: &str = "0xcdf6c13f41d8c8ad8a384eeabd706d912f311452d18dea1d718646d1f99419ab";
const R11: &str = "0xba6e14383eed82ed37a4ab6a40e90b846a27b40156154ef9921355750f9017b7";
const R13: &str = "0x3826a79abf5838c59b7f9175b2c4b94aa5100388a21260a321f143129ac93e34";
const R14A: &str = "0xae1a9582aa9ef20d54cdebbf6191bc70bdede1ce5d84aae46e24dee8de9000af";
const R14B: &str = "0xd8c76a49aac7b30a2093d100a78e4dcab0958237e73eb16564f982355621e148";
const R15A: &str = "0x61409665a49600482dd5e7c2d9cbbff823c9d7b2329f8dee62b02dde0b097106";
const R15C: &str = "0x83dc0753b6545509ee9a787bde7fac63ba378e9a7ddc857932ecef25fb1602f1";

fn mainnet_like_snapshot() -> ForkChoiceData {
    let pre = "0xaecade68feb38aff5f30103fac04f458ba127db0fad9c17839aa19e727ee6cd6";
    ForkChoiceData {
        justified_checkpoint: checkpoint("6", JUSTIFIED),
        finalized_checkpoint: checkpoint("5", FINALIZED),
        fork_choice_nodes: vec![
            record(9, pre, "0x411573c3628091fa4e4b30ce4fb92ffb660516fad16177f35d1465494ce6e4cb", "5728638123638428947"),
            record(10, FINALIZED, pre, "4728638123638428947"),
            record(11, R11, FINALIZED, "4728638123638428337"),
            record(12, JUSTIFIED, R11, "4728638123638427444"),
            record(13, R13, JUSTIFIED, "4728638123638427066"),
            record(14, R14A, R13, "4728638123638426102"),
            record(14, R14B, R13, "3728638123638426102"),
            record(15, R15A, R14A, "4728638123638425941"),
            record(15, "0xa105e19946cce5e298ee5d4ffa8ed742cc0995ba8900a4c6754556234bcb8edc", R14B, "2728638123638425941"),
            record(15, R15C, R14B, "2328638123638425941"),
            record(16, "0x48322324d97ffad9c9c504e1734858e65061d609b995ea47267d59ce6a9c81a3", R15A, "4728638123638425107"),
            record(16, "0x20eeedb58320e290e6ce52be804d93c611093aebcb5ed731327c413427c648dd", R15C, "328638123638425107"),
            record(16, "0xb4118f963947490c4a804638ac6971687662600c20924c4e12c5c143e776fec0", R15A, "1728638123638425107"),
            record(16, "0x513106a410d8bc72d9c4fffcb6d040333af7b2461bb53eb8f49a64471fa2a8f5", R15A, "728638123638425107"),
        ],
    }
}

#[test]
fn mainnet_like_snapshot_counts() {
    let data = mainnet_like_snapshot();
    let graph = build_weighted_graph(&data).expect("valid snapshot");
    let attrs = graph.attributes();

    assert_eq!(attrs.slot_start, 10);
    assert_eq!(attrs.slot_end, 16);
    assert_eq!(attrs.forks, 5);
    assert_eq!(graph.node_count(), data.fork_choice_nodes.len() - 1);
    assert_eq!(graph.edge_count(), data.fork_choice_nodes.len() - 2);
    assert!(graph.nodes().all(|(_, n)| !n.orphaned));
}

#[test]
fn mainnet_like_snapshot_layout() {
    let graph = build_weighted_graph(&mainnet_like_snapshot()).expect("valid snapshot");
    let node = |slot, root: &str, parent: &str| graph.node(&node_id(slot, root, parent)).expect("node").clone();

    let finalized = node(10, FINALIZED, "0xaecade68feb38aff5f30103fac04f458ba127db0fad9c17839aa19e727ee6cd6");
    assert_eq!(finalized.checkpoint, Some(CheckpointKind::Finalized));
    assert_eq!(node(12, JUSTIFIED, R11).checkpoint, Some(CheckpointKind::Justified));

    // Two light slot-16 siblings take lanes -1 and +1 first (latest parent
    // slot first); the slot-14 fork overlaps both and goes one lane further
    // out on the lower side.
    let lower = node(16, "0x513106a410d8bc72d9c4fffcb6d040333af7b2461bb53eb8f49a64471fa2a8f5", R15A);
    let upper = node(16, "0xb4118f963947490c4a804638ac6971687662600c20924c4e12c5c143e776fec0", R15A);
    assert_eq!((lower.offset, upper.offset), (-1, 1));
    assert!((upper.weight_percentage_compared_to_heaviest_neighbor - 36.55).abs() < 1e-9);

    let fork = node(14, R14B, R13);
    assert!(!fork.canonical);
    assert_eq!(fork.offset, -2);
    assert!((fork.weight_percentage_compared_to_heaviest_neighbor - 78.85).abs() < 1e-9);
    // Inside the fork the deeper branch keeps the fork's lane.
    assert_eq!(node(15, R15C, R14B).offset, -2);
    assert_eq!(
        node(15, "0xa105e19946cce5e298ee5d4ffa8ed742cc0995ba8900a4c6754556234bcb8edc", R14B).offset,
        -3
    );

    let head = graph.attributes().head.clone().expect("head");
    assert_eq!(
        head,
        node_id(16, "0x48322324d97ffad9c9c504e1734858e65061d609b995ea47267d59ce6a9c81a3", R15A)
    );
    assert!(graph.nodes().filter(|(_, n)| n.canonical).all(|(_, n)| n.offset == 0));
}

#[test]
fn orphan_with_unknown_parent_is_flagged() {
    let data = ForkChoiceData {
        justified_checkpoint: checkpoint("6", "0x"),
        finalized_checkpoint: checkpoint("5", "0x"),
        fork_choice_nodes: vec![
            record(10, FINALIZED, "0xaecade68feb38aff5f30103fac04f458ba127db0fad9c17839aa19e727ee6cd6", "4728638123638428947"),
            record(11, R11, "0x0000", "4728638123638428337"),
        ],
    };
    let graph = build_weighted_graph(&data).expect("valid snapshot");
    assert_eq!(graph.node_attribute(&node_id(11, R11, "0x0000"), "orphaned"), Ok(serde_json::json!(true)));
    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn invalid_payloads_are_graph_errors() {
    assert_eq!(build_weighted_graph(&ForkChoiceData::default()).err(), Some(GraphError::InvalidPayload));

    let mut data = mainnet_like_snapshot();
    data.fork_choice_nodes[3].slot = "abc".to_string();
    let err = build_weighted_graph(&data).expect_err("bad slot");
    assert_eq!(err.code(), "G1002");
    assert_eq!(err.record().map(|r| r.block_root.as_str()), Some(JUSTIFIED));
}
