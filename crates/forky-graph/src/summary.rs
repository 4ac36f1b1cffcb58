//! Tabular summaries over an aggregated graph.
//!
//! [`source_summaries`] gives one row per source snapshot; [`block_summary`]
//! describes how the sources disagree about a single block.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::aggregate::AggregatedGraph;
use crate::error::LookupError;
use crate::graph::{SourceCheckpoint, SourceValidity};
use crate::model::{Checkpoint, Weight};
use crate::view::ProcessedSnapshot;

/// One source's view next to the aggregated consensus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSummary {
    pub source: String,
    pub snapshot_id: String,
    pub fetched_at: DateTime<Utc>,
    /// `None` when the source's head could not be resolved.
    pub head_slot: Option<u64>,
    pub head_root: Option<String>,
    pub finalized: Option<Checkpoint>,
    pub justified: Option<Checkpoint>,
    /// The source's head is the aggregated head.
    pub is_canonical_head: bool,
}

/// Summarize each source against `aggregated`, in input order.
///
/// A source whose head cannot be looked up still gets a row, with the head
/// columns empty.
#[must_use]
pub fn source_summaries(snapshots: &[ProcessedSnapshot], aggregated: &AggregatedGraph) -> Vec<SourceSummary> {
    let consensus_head = aggregated.attributes().base.head.as_deref();
    snapshots
        .iter()
        .map(|processed| {
            let metadata = &processed.snapshot.metadata;
            let head_id = processed.graph.attributes().head.as_deref();
            let head = head_id.and_then(|id| match processed.graph.node(id) {
                Ok(node) => Some(node),
                Err(err) => {
                    warn!(source = %metadata.node, %err, "head lookup failed");
                    None
                }
            });
            if head_id.is_none() {
                warn!(source = %metadata.node, "source has no head");
            }

            SourceSummary {
                source: metadata.node.clone(),
                snapshot_id: metadata.id.clone(),
                fetched_at: metadata.fetched_at,
                head_slot: head.map(|node| node.slot),
                head_root: head.map(|node| node.block_root.clone()),
                finalized: processed.snapshot.data.finalized_checkpoint.clone(),
                justified: processed.snapshot.data.justified_checkpoint.clone(),
                is_canonical_head: head.is_some() && head_id == consensus_head,
            }
        })
        .collect()
}

/// Cross-source view of one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockSummary {
    pub id: String,
    pub slot: u64,
    pub block_root: String,
    pub validities: Vec<SourceValidity>,
    pub checkpoints: Vec<SourceCheckpoint>,
    pub highest_weight: Weight,
    pub seen_by: Vec<String>,
    pub canonical_for: Vec<String>,
    pub orphaned_in: Vec<String>,
    /// Some source reported a validity other than `valid`.
    pub has_invalid: bool,
    /// Some source could not link this block to its parent.
    pub has_orphaned: bool,
}

/// Describe the block with `block_root` in `graph`.
///
/// # Errors
///
/// Returns [`LookupError::BlockRootNotFound`] if no merged node has that
/// root.
pub fn block_summary(graph: &AggregatedGraph, block_root: &str) -> Result<BlockSummary, LookupError> {
    let id = graph
        .find_by_block_root(block_root)
        .ok_or_else(|| LookupError::BlockRootNotFound(block_root.to_string()))?;
    let node = graph.node(id)?;
    Ok(BlockSummary {
        id: id.to_string(),
        slot: node.slot,
        block_root: node.block_root.clone(),
        validities: node.validities.clone(),
        checkpoints: node.checkpoints.clone(),
        highest_weight: node.highest_weight.clone(),
        seen_by: node.seen_by_nodes.clone(),
        canonical_for: node.canonical_for_nodes.clone(),
        orphaned_in: node.orphaned.clone(),
        has_invalid: node.has_invalid(),
        has_orphaned: !node.orphaned.is_empty(),
    })
}
