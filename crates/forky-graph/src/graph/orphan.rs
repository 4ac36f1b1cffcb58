//! Lane placement for orphans: blocks whose parent is not in the graph.
//!
//! Orphans are placed after every fork branch, one lane beyond whatever is
//! already occupied over their slot range. Orphans sharing a slot stack
//! outward past each other's subtrees.

use petgraph::graph::NodeIndex;
use serde::Serialize;

use crate::graph::metrics::{branch_height_at, deepest_descendant_slot_at};
use crate::graph::offset::{assign_offsets_at, direction_of, next_lane};
use crate::graph::store::{ForkGraph, LayoutNode};

/// An orphan awaiting placement, with the lane bounds reserved around it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrphanReference {
    pub slot: u64,
    pub node_id: String,
    /// Deepest slot in the orphan's subtree.
    pub last_slot: u64,
    /// Lanes the orphan's subtree occupies.
    pub height: usize,
    /// Highest occupied lane above the centerline (>= 0).
    pub highest_offset: i64,
    /// Lowest occupied lane below the centerline (<= 0).
    pub lowest_offset: i64,
    /// Lane assigned to the orphan.
    pub offset: i64,
}

impl OrphanReference {
    pub(crate) fn at<N: LayoutNode, G>(graph: &ForkGraph<N, G>, idx: NodeIndex) -> Self {
        Self {
            slot: graph.at(idx).slot(),
            node_id: graph.id_at(idx).to_string(),
            last_slot: deepest_descendant_slot_at(graph, idx),
            height: branch_height_at(graph, idx),
            highest_offset: 0,
            lowest_offset: 0,
            offset: 0,
        }
    }

    /// Whether the orphan's subtree shares any slot with `[slot, last_slot]`.
    #[must_use]
    pub const fn overlaps(&self, slot: u64, last_slot: u64) -> bool {
        self.slot <= last_slot && slot <= self.last_slot
    }

    /// Widen the bounds to cover `lane`.
    pub fn reserve(&mut self, lane: i64) {
        if lane > 0 {
            self.highest_offset = self.highest_offset.max(lane);
        } else {
            self.lowest_offset = self.lowest_offset.min(lane);
        }
    }

    /// Lane just past `previous`'s subtree and this orphan's own bounds on
    /// `previous`'s side of the centerline.
    fn beyond(&self, previous: &Self) -> i64 {
        let direction = direction_of(previous.offset);
        let outermost = if direction > 0 {
            previous.outer_lane().max(self.highest_offset)
        } else {
            previous.outer_lane().min(self.lowest_offset)
        };
        outermost + direction
    }

    fn outer_lane(&self) -> i64 {
        let spread = i64::try_from(self.height.saturating_sub(1)).unwrap_or(i64::MAX);
        self.offset.saturating_add(spread.saturating_mul(direction_of(self.offset)))
    }
}

/// Assign a lane to every orphan and fan out its descendants.
///
/// Orphans are processed in slot order. One that shares its slot with the
/// previous orphan stays on that orphan's side, one lane beyond the
/// furthest lane reserved there; otherwise it takes the next free lane on
/// the less displaced side of its bounds.
pub(crate) fn place_orphans<N: LayoutNode, G>(graph: &mut ForkGraph<N, G>, orphans: &mut [OrphanReference]) {
    orphans.sort_by(|a, b| (a.slot, &a.node_id).cmp(&(b.slot, &b.node_id)));

    for i in 0..orphans.len() {
        let (placed, rest) = orphans.split_at_mut(i);
        let orphan = &mut rest[0];
        orphan.offset = match placed.last() {
            Some(previous) if previous.slot == orphan.slot => orphan.beyond(previous),
            _ => next_lane(orphan.highest_offset, orphan.lowest_offset),
        };

        if let Ok(idx) = graph.lookup(&orphan.node_id) {
            graph.at_mut(idx).set_offset(orphan.offset);
            graph.at_mut(idx).set_canonical(false);
            assign_offsets_at(graph, idx, orphan.offset, direction_of(orphan.offset));
        }

        let lane = orphan.outer_lane();
        let (slot, last_slot) = (orphan.slot, orphan.last_slot);
        for later in &mut rest[1..] {
            if later.overlaps(slot, last_slot) {
                later.reserve(lane);
            }
        }
    }
}
