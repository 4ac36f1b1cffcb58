//! Graph storage and the layout passes that run over it.
//!
//! # Overview
//!
//! ```text
//! store       ForkGraph: attributed DAG keyed by composite node id
//! attributes  node/graph attribute types and fork-choice ranking
//! metrics     subtree walks: deepest slot, fork count, heaviest child
//! canonical   canonical chain selection, fork detection, head
//! offset      lane assignment for fork branches
//! orphan      lane assignment for parentless blocks
//! ```
//!
//! Builders ([`crate::weighted`], [`crate::aggregate`]) populate a graph and
//! then run, in order: orphan detachment, canonical selection, fork
//! placement and orphan placement.

pub mod attributes;
pub(crate) mod canonical;
pub mod metrics;
pub mod offset;
pub mod orphan;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use attributes::{
    AggregatedGraphAttributes, AggregatedNode, AggregatedSource, ForkChoiceRank, GraphAttributes,
    GraphKind, SourceCheckpoint, SourceValidity, WeightedNode,
};
pub use metrics::{
    apply_to_descendants, deepest_descendant_slot, fork_count_beneath, heaviest_aggregated_among,
    heaviest_among,
};
pub use offset::{ForkReference, assign_offsets, fork_offsets};
pub use orphan::OrphanReference;
pub use store::{EdgeAttributes, EdgeId, EdgeView, ForkGraph, LayoutNode, node_id};

use canonical::{canonical_head, detach_orphans, select_canonical};

/// Outcome of the shared layout passes.
pub(crate) struct Layout {
    pub forks: usize,
    pub head: Option<String>,
    pub fork_points: Vec<canonical::ForkPoint>,
}

/// Run every layout pass over a populated graph.
pub(crate) fn lay_out<N: LayoutNode + ForkChoiceRank, G>(
    graph: &mut ForkGraph<N, G>,
    mut orphans: Vec<OrphanReference>,
) -> Layout {
    detach_orphans(graph, &orphans);
    let mut selection = select_canonical(graph);
    offset::place_forks(graph, &mut selection.references, &mut orphans);
    orphan::place_orphans(graph, &mut orphans);
    Layout {
        forks: selection.forks,
        head: canonical_head(graph).map(|idx| graph.id_at(idx).to_string()),
        fork_points: selection.fork_points,
    }
}
