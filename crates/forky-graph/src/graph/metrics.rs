//! Structural metrics over the descendant tree of a node.
//!
//! # Overview
//!
//! | Function | Answers |
//! |----------|---------|
//! | [`deepest_descendant_slot`] | highest slot reachable from a node (inclusive) |
//! | [`fork_count_beneath`] | number of extra branches below a node |
//! | [`heaviest_among`] | which candidate wins a fork comparison |
//! | [`apply_to_descendants`] | bulk attribute update over a subtree |
//!
//! All walks use an explicit stack, so deep chains cannot overflow the call
//! stack. The public functions take node ids; the layout passes use the
//! index-level variants directly.

use petgraph::graph::NodeIndex;

use crate::error::LookupError;
use crate::graph::attributes::{AggregatedNode, ForkChoiceRank};
use crate::graph::store::{ForkGraph, LayoutNode};

/// Highest slot among `id` and all of its descendants.
///
/// A leaf returns its own slot.
///
/// # Errors
///
/// Returns [`LookupError::NodeNotFound`] if `id` is not in the graph.
pub fn deepest_descendant_slot<N: LayoutNode, G>(
    graph: &ForkGraph<N, G>,
    id: &str,
) -> Result<u64, LookupError> {
    Ok(deepest_descendant_slot_at(graph, graph.lookup(id)?))
}

pub(crate) fn deepest_descendant_slot_at<N: LayoutNode, G>(
    graph: &ForkGraph<N, G>,
    idx: NodeIndex,
) -> u64 {
    let mut deepest = graph.at(idx).slot();
    let mut stack = vec![idx];
    while let Some(current) = stack.pop() {
        for child in graph.children_at(current) {
            deepest = deepest.max(graph.at(child).slot());
            stack.push(child);
        }
    }
    deepest
}

/// Number of additional branches beneath `id`.
///
/// Each node with `k > 1` children contributes `k - 1`, summed over the
/// whole subtree. A chain returns 0.
///
/// # Errors
///
/// Returns [`LookupError::NodeNotFound`] if `id` is not in the graph.
pub fn fork_count_beneath<N, G>(graph: &ForkGraph<N, G>, id: &str) -> Result<usize, LookupError> {
    Ok(fork_count_beneath_at(graph, graph.lookup(id)?))
}

pub(crate) fn fork_count_beneath_at<N, G>(graph: &ForkGraph<N, G>, idx: NodeIndex) -> usize {
    let mut forks = 0;
    let mut stack = vec![idx];
    while let Some(current) = stack.pop() {
        let children = graph.children_at(current);
        forks += children.len().saturating_sub(1);
        stack.extend(children);
    }
    forks
}

/// Lane height a branch rooted at `idx` occupies: itself plus one per fork.
pub(crate) fn branch_height_at<N, G>(graph: &ForkGraph<N, G>, idx: NodeIndex) -> usize {
    1 + fork_count_beneath_at(graph, idx)
}

/// The candidate that ranks highest. Ties keep the earlier candidate.
///
/// Returns `Ok(None)` for an empty candidate list.
///
/// # Errors
///
/// Returns [`LookupError::NodeNotFound`] if any candidate is not in the
/// graph.
pub fn heaviest_among<'g, N: ForkChoiceRank, G>(
    graph: &'g ForkGraph<N, G>,
    candidates: &[&str],
) -> Result<Option<&'g str>, LookupError> {
    let indices = candidates
        .iter()
        .map(|id| graph.lookup(id))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(heaviest_at(graph, &indices).map(|idx| graph.id_at(idx)))
}

/// [`heaviest_among`] over aggregated nodes.
///
/// Ranks by the number of sources calling a block canonical, then highest
/// weight, then number of sources that saw it, then block root.
///
/// # Errors
///
/// Returns [`LookupError::NodeNotFound`] if any candidate is not in the
/// graph.
pub fn heaviest_aggregated_among<'g, G>(
    graph: &'g ForkGraph<AggregatedNode, G>,
    candidates: &[&str],
) -> Result<Option<&'g str>, LookupError> {
    heaviest_among(graph, candidates)
}

pub(crate) fn heaviest_at<N: ForkChoiceRank, G>(
    graph: &ForkGraph<N, G>,
    candidates: &[NodeIndex],
) -> Option<NodeIndex> {
    candidates.iter().copied().reduce(|best, next| {
        if graph.at(best).rank_cmp(graph.at(next)).is_lt() {
            next
        } else {
            best
        }
    })
}

/// Apply `update` to every descendant of `id`, excluding `id` itself.
///
/// # Errors
///
/// Returns [`LookupError::NodeNotFound`] if `id` is not in the graph.
pub fn apply_to_descendants<N, G>(
    graph: &mut ForkGraph<N, G>,
    id: &str,
    update: impl FnMut(&mut N),
) -> Result<(), LookupError> {
    let idx = graph.lookup(id)?;
    apply_to_descendants_at(graph, idx, update);
    Ok(())
}

pub(crate) fn apply_to_descendants_at<N, G>(
    graph: &mut ForkGraph<N, G>,
    idx: NodeIndex,
    mut update: impl FnMut(&mut N),
) {
    let mut stack = graph.children_at(idx);
    while let Some(current) = stack.pop() {
        update(graph.at_mut(current));
        stack.extend(graph.children_at(current));
    }
}

/// Mark `idx` and its whole subtree non-canonical.
pub(crate) fn mark_branch_non_canonical<N: LayoutNode, G>(
    graph: &mut ForkGraph<N, G>,
    idx: NodeIndex,
) {
    graph.at_mut(idx).set_canonical(false);
    apply_to_descendants_at(graph, idx, |node| node.set_canonical(false));
}
