//! Build a laid-out graph from one fork choice snapshot.
//!
//! # Overview
//!
//! 1. Validate the payload and parse every slot and weight.
//! 2. Keep the blocks from the highest slot down to the finalized
//!    checkpoint (inclusive). Older blocks are dropped; if the finalized
//!    root is absent every block is kept and the first block at the lowest
//!    slot stands in for it as the root.
//! 3. Insert nodes in ascending slot order and link each to its parent.
//!    Blocks other than the root whose parent cannot be linked become
//!    orphans.
//! 4. Run the shared layout passes: canonical selection, fork placement and
//!    orphan placement, then record weight percentages at fork points.

use std::collections::HashMap;

use tracing::{debug, instrument, warn};

use crate::error::GraphError;
use crate::graph::{
    ForkGraph, GraphAttributes, GraphKind, OrphanReference, WeightedNode, lay_out, node_id,
};
use crate::model::{BlockRecord, Checkpoint, CheckpointKind, ForkChoiceData, Weight};

/// Graph built from a single snapshot.
pub type WeightedGraph = ForkGraph<WeightedNode, GraphAttributes>;

struct Parsed<'a> {
    record: &'a BlockRecord,
    slot: u64,
    weight: Weight,
}

fn parse_records(records: &[BlockRecord]) -> Result<Vec<Parsed<'_>>, GraphError> {
    records
        .iter()
        .map(|record| {
            let slot = record
                .parsed_slot()
                .ok_or_else(|| GraphError::InvalidSlot(Box::new(record.clone())))?;
            let weight = record
                .parsed_weight()
                .ok_or_else(|| GraphError::InvalidWeight(Box::new(record.clone())))?;
            Ok(Parsed { record, slot, weight })
        })
        .collect()
}

/// Build a [`WeightedGraph`] from a snapshot's fork choice data.
///
/// The graph id is left empty; [`crate::ProcessedSnapshot::process`] fills
/// it in from the snapshot metadata.
///
/// # Errors
///
/// - [`GraphError::InvalidPayload`] if there are no blocks or either
///   checkpoint is missing.
/// - [`GraphError::InvalidSlot`] / [`GraphError::InvalidWeight`] for the
///   first record whose slot or weight does not parse.
#[instrument(skip_all, fields(records = data.fork_choice_nodes.len()))]
pub fn build_weighted_graph(data: &ForkChoiceData) -> Result<WeightedGraph, GraphError> {
    let (Some(finalized), Some(justified)) = (&data.finalized_checkpoint, &data.justified_checkpoint)
    else {
        return Err(GraphError::InvalidPayload);
    };
    if data.fork_choice_nodes.is_empty() {
        return Err(GraphError::InvalidPayload);
    }

    let mut parsed = parse_records(&data.fork_choice_nodes)?;

    // Stable sorts: equal slots keep their input order throughout.
    parsed.sort_by(|a, b| b.slot.cmp(&a.slot));
    let cutoff = parsed
        .iter()
        .position(|p| p.record.block_root == finalized.root)
        .map_or(parsed.len(), |i| i + 1);
    parsed.truncate(cutoff);
    parsed.sort_by_key(|p| p.slot);

    let mut attributes = GraphAttributes::new(GraphKind::Weighted);
    attributes.slot_start = parsed.first().map_or(0, |p| p.slot);
    attributes.slot_end = parsed.last().map_or(0, |p| p.slot);
    let mut graph = WeightedGraph::with_capacity(parsed.len(), attributes);

    let mut by_root: HashMap<&str, String> = HashMap::with_capacity(parsed.len());
    let mut inserted: Vec<(String, &BlockRecord)> = Vec::with_capacity(parsed.len());
    for Parsed { record, slot, weight } in parsed {
        let id = node_id(slot, &record.block_root, &record.parent_root);
        if !graph.add_node(id.clone(), weighted_node(record, slot, weight, finalized, justified)) {
            warn!(%id, "duplicate block in snapshot, keeping the first");
            continue;
        }
        by_root.entry(record.block_root.as_str()).or_insert_with(|| id.clone());
        inserted.push((id, record));
    }

    let root = match inserted.iter().find(|(_, record)| record.block_root == finalized.root) {
        Some((id, _)) => Some(id.clone()),
        None => {
            let first = inserted.first().map(|(id, _)| id.clone());
            debug!(root = ?first, "finalized block not in snapshot, rooting at the lowest slot");
            first
        }
    };

    let mut orphans = Vec::new();
    for (id, record) in &inserted {
        if root.as_ref() == Some(id) {
            continue;
        }
        let linked = match by_root.get(record.parent_root.as_str()) {
            Some(parent) if !record.parent_root.is_empty() => graph
                .add_edge(parent, id)
                .map_err(|err| debug!(%id, %err, "edge rejected"))
                .is_ok(),
            _ => false,
        };
        if !linked {
            if let Ok(idx) = graph.lookup(id) {
                graph.at_mut(idx).orphaned = true;
                orphans.push(OrphanReference::at(&graph, idx));
            }
        }
    }

    let layout = lay_out(&mut graph, orphans);
    for point in &layout.fork_points {
        let heaviest = graph.at(point.heaviest).weight.clone();
        for &sibling in &point.siblings {
            let node = graph.at_mut(sibling);
            node.weight_percentage_compared_to_heaviest_neighbor = node.weight.percentage_of(&heaviest);
        }
    }

    let attributes = graph.attributes_mut();
    attributes.forks = layout.forks;
    attributes.head = layout.head;

    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        forks = layout.forks,
        "built weighted graph"
    );
    Ok(graph)
}

fn weighted_node(
    record: &BlockRecord,
    slot: u64,
    weight: Weight,
    finalized: &Checkpoint,
    justified: &Checkpoint,
) -> WeightedNode {
    let mut node = WeightedNode::new(slot, record.block_root.clone(), weight);
    node.parent_root = (!record.parent_root.is_empty()).then(|| record.parent_root.clone());
    node.checkpoint = CheckpointKind::classify(&record.block_root, finalized, justified);
    node.validity = record.validity.to_lowercase();
    node.execution_block_hash.clone_from(&record.execution_block_hash);
    node.extra_data.clone_from(&record.extra_data);
    node
}
