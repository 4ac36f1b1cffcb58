//! Vertical lane assignment for non-canonical branches.
//!
//! # Overview
//!
//! The canonical chain sits on lane 0. Every fork branch hanging off it is
//! described by a [`ForkReference`] and placed in two steps:
//!
//! 1. [`fork_offsets`] picks a lane for each branch root so branches whose
//!    slot ranges overlap never share lanes, alternating above and below
//!    the centerline.
//! 2. [`assign_offsets`] fans each branch's descendants out away from the
//!    centerline, reserving one lane per nested fork.
//!
//! Positive offsets render above the canonical chain, negative below.

use std::cmp::Reverse;

use petgraph::graph::NodeIndex;
use serde::Serialize;

use crate::error::LookupError;
use crate::graph::metrics::{branch_height_at, deepest_descendant_slot_at};
use crate::graph::orphan::OrphanReference;
use crate::graph::store::{ForkGraph, LayoutNode};

/// A branch that left the canonical chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForkReference {
    /// Slot of the branch root.
    pub slot: u64,
    /// Slot of the canonical block the branch forked from.
    pub parent_slot: u64,
    /// Id of the branch root.
    pub node_id: String,
    /// Lanes the branch occupies: 1 plus its nested forks.
    pub height: usize,
    /// Deepest slot in the branch.
    pub last_slot: u64,
    /// Lane assigned to the branch root.
    pub offset: i64,
}

impl ForkReference {
    pub(crate) fn at<N: LayoutNode, G>(graph: &ForkGraph<N, G>, parent: NodeIndex, root: NodeIndex) -> Self {
        Self {
            slot: graph.at(root).slot(),
            parent_slot: graph.at(parent).slot(),
            node_id: graph.id_at(root).to_string(),
            height: branch_height_at(graph, root),
            last_slot: deepest_descendant_slot_at(graph, root),
            offset: 0,
        }
    }

    /// Outermost lane the branch reaches on its side of the centerline.
    #[must_use]
    pub fn outer_lane(&self) -> i64 {
        let spread = i64::try_from(self.height.saturating_sub(1)).unwrap_or(i64::MAX);
        if self.offset > 0 {
            self.offset.saturating_add(spread)
        } else {
            self.offset.saturating_sub(spread)
        }
    }
}

/// Direction a lane fans out in: away from the centerline.
#[must_use]
pub const fn direction_of(offset: i64) -> i64 {
    if offset > 0 { 1 } else { -1 }
}

/// Pick the next free lane given the current upper and lower bounds,
/// preferring whichever side is less displaced.
#[must_use]
pub const fn next_lane(highest: i64, lowest: i64) -> i64 {
    if lowest.unsigned_abs() > highest.unsigned_abs() {
        highest + 1
    } else {
        lowest - 1
    }
}

/// Offset every descendant of `id` relative to `offset`.
///
/// A single child stays on the parent's lane. Multiple children are ordered
/// by deepest slot, then branch height (both descending), then block root,
/// and stacked `direction`-wards, each reserving as many lanes as its height.
/// Every visited descendant is marked non-canonical. `id` itself is left
/// untouched.
///
/// # Errors
///
/// Returns [`LookupError::NodeNotFound`] if `id` is not in the graph.
pub fn assign_offsets<N: LayoutNode, G>(
    graph: &mut ForkGraph<N, G>,
    id: &str,
    offset: i64,
    direction: i64,
) -> Result<(), LookupError> {
    let idx = graph.lookup(id)?;
    assign_offsets_at(graph, idx, offset, direction);
    Ok(())
}

pub(crate) fn assign_offsets_at<N: LayoutNode, G>(
    graph: &mut ForkGraph<N, G>,
    idx: NodeIndex,
    offset: i64,
    direction: i64,
) {
    let mut stack = vec![(idx, offset)];
    while let Some((current, current_offset)) = stack.pop() {
        let children = graph.children_at(current);
        if let [only] = children[..] {
            place(graph, only, current_offset);
            stack.push((only, current_offset));
            continue;
        }

        let mut ordered: Vec<(NodeIndex, u64, usize)> = children
            .into_iter()
            .map(|child| {
                (
                    child,
                    deepest_descendant_slot_at(graph, child),
                    branch_height_at(graph, child),
                )
            })
            .collect();
        ordered.sort_by(|a, b| {
            let (a_root, b_root) = (graph.at(a.0).block_root(), graph.at(b.0).block_root());
            (Reverse(a.1), Reverse(a.2), a_root).cmp(&(Reverse(b.1), Reverse(b.2), b_root))
        });

        let mut acc: i64 = 0;
        for (child, _, height) in ordered {
            let child_offset = current_offset + acc * direction;
            place(graph, child, child_offset);
            stack.push((child, child_offset));
            acc += i64::try_from(height).unwrap_or(i64::MAX);
        }
    }
}

fn place<N: LayoutNode, G>(graph: &mut ForkGraph<N, G>, idx: NodeIndex, offset: i64) {
    let node = graph.at_mut(idx);
    node.set_canonical(false);
    node.set_offset(offset);
}

/// Choose the root lane of every fork and record it in `forks[i].offset`.
///
/// Forks are first sorted by parent slot, then deepest slot (both
/// descending), then node id. Each fork only avoids the earlier forks whose
/// slot range overlaps its own:
///
/// - no overlap: lane −1
/// - one overlap: the opposite side of that fork, one lane out
/// - several: one lane beyond the less displaced edge of their combined
///   extent
pub fn fork_offsets(forks: &mut [ForkReference]) {
    forks.sort_by(|a, b| {
        (Reverse(a.parent_slot), Reverse(a.last_slot), &a.node_id).cmp(&(
            Reverse(b.parent_slot),
            Reverse(b.last_slot),
            &b.node_id,
        ))
    });

    for i in 0..forks.len() {
        let (placed, rest) = forks.split_at_mut(i);
        let fork = &mut rest[0];
        let overlapping: Vec<&ForkReference> = placed
            .iter()
            .rev()
            .filter(|other| other.parent_slot <= fork.last_slot && fork.parent_slot <= other.last_slot)
            .collect();

        fork.offset = match overlapping[..] {
            [] => -1,
            [only] => {
                if only.offset > 0 {
                    -1
                } else {
                    1
                }
            }
            _ => {
                let highest = overlapping.iter().map(|f| f.outer_lane()).max().unwrap_or(0).max(0);
                let lowest = overlapping.iter().map(|f| f.outer_lane()).min().unwrap_or(0).min(0);
                next_lane(highest, lowest)
            }
        };
    }
}

/// Lay out every fork branch and widen the lane bounds of any orphan whose
/// span overlaps a placed branch.
pub(crate) fn place_forks<N: LayoutNode, G>(
    graph: &mut ForkGraph<N, G>,
    forks: &mut [ForkReference],
    orphans: &mut [OrphanReference],
) {
    fork_offsets(forks);
    for fork in forks.iter() {
        let Ok(root) = graph.lookup(&fork.node_id) else {
            continue;
        };
        place(graph, root, fork.offset);
        assign_offsets_at(graph, root, fork.offset, direction_of(fork.offset));

        for orphan in orphans.iter_mut() {
            if orphan.overlaps(fork.slot, fork.last_slot) {
                orphan.reserve(fork.outer_lane());
            }
        }
    }
}
