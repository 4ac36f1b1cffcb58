//! Canonical chain selection and fork detection.
//!
//! Walks the graph in slot order. At every node with more than one child
//! the highest-ranked child keeps the parent's canonical status; siblings
//! of a canonical parent become fork branches and are marked non-canonical
//! along with their whole subtree.

use petgraph::graph::NodeIndex;

use crate::graph::attributes::ForkChoiceRank;
use crate::graph::metrics::{heaviest_at, mark_branch_non_canonical};
use crate::graph::offset::ForkReference;
use crate::graph::orphan::OrphanReference;
use crate::graph::store::{ForkGraph, LayoutNode};

/// A node with more than one child and the child that won.
#[derive(Debug, Clone)]
pub(crate) struct ForkPoint {
    pub heaviest: NodeIndex,
    pub siblings: Vec<NodeIndex>,
}

#[derive(Debug, Default)]
pub(crate) struct CanonicalSelection {
    /// Children counted at fork points, excluding the winner under a
    /// canonical parent.
    pub forks: usize,
    /// Branches that left the canonical chain.
    pub references: Vec<ForkReference>,
    pub fork_points: Vec<ForkPoint>,
}

pub(crate) fn select_canonical<N: LayoutNode + ForkChoiceRank, G>(
    graph: &mut ForkGraph<N, G>,
) -> CanonicalSelection {
    let mut selection = CanonicalSelection::default();
    let order: Vec<NodeIndex> = graph.indices().collect();

    for parent in order {
        let children = graph.children_at(parent);
        if children.len() < 2 {
            continue;
        }
        let Some(heaviest) = heaviest_at(graph, &children) else {
            continue;
        };
        let parent_canonical = graph.at(parent).canonical();

        let mut siblings = Vec::with_capacity(children.len() - 1);
        for child in children {
            if child == heaviest {
                if !parent_canonical {
                    selection.forks += 1;
                }
                continue;
            }
            selection.forks += 1;
            siblings.push(child);
            if parent_canonical {
                selection.references.push(ForkReference::at(graph, parent, child));
                mark_branch_non_canonical(graph, child);
            }
        }
        selection.fork_points.push(ForkPoint { heaviest, siblings });
    }

    selection
}

/// Mark every orphan and its subtree non-canonical so the fork walk does
/// not treat detached subtrees as part of the chain.
pub(crate) fn detach_orphans<N: LayoutNode, G>(graph: &mut ForkGraph<N, G>, orphans: &[OrphanReference]) {
    for orphan in orphans {
        if let Ok(idx) = graph.lookup(&orphan.node_id) {
            mark_branch_non_canonical(graph, idx);
        }
    }
}

/// Last canonical node in slot order.
pub(crate) fn canonical_head<N: LayoutNode, G>(graph: &ForkGraph<N, G>) -> Option<NodeIndex> {
    graph.indices().rev().find(|&idx| graph.at(idx).canonical())
}
