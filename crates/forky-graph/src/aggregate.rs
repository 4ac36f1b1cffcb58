//! Merge several single-snapshot graphs into one consensus view.
//!
//! # Overview
//!
//! Sources are merged in `(node name, snapshot id)` order so the result does
//! not depend on the order snapshots arrived in. Nodes are unified by
//! composite id; each [`AggregatedNode`] records which sources saw it, which
//! called it canonical, and the heaviest weight any source reported.
//!
//! Edges are the union of the sources' edges. A block orphaned in one source
//! is re-linked if any other source (or the merged set as a whole) contains
//! its parent. The usual layout passes then run with the aggregated
//! ranking: canonical votes, then weight, then visibility.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument};

use crate::graph::{
    AggregatedGraphAttributes, AggregatedNode, AggregatedSource, ForkGraph, GraphKind, LayoutNode,
    OrphanReference, lay_out,
};
use crate::view::ProcessedSnapshot;

/// Graph merged from several snapshots.
pub type AggregatedGraph = ForkGraph<AggregatedNode, AggregatedGraphAttributes>;

/// Merge `snapshots` into an [`AggregatedGraph`].
///
/// An empty input yields an empty graph.
#[must_use]
#[instrument(skip_all, fields(sources = snapshots.len()))]
pub fn aggregate(snapshots: &[ProcessedSnapshot]) -> AggregatedGraph {
    let mut sources: Vec<&ProcessedSnapshot> = snapshots.iter().collect();
    sources.sort_by(|a, b| {
        let (a, b) = (&a.snapshot.metadata, &b.snapshot.metadata);
        (&a.node, &a.id).cmp(&(&b.node, &b.id))
    });

    // Merge node attributes across sources, remembering each source's edges
    // and which of its nodes had no parent.
    let mut staged: Vec<(String, AggregatedNode)> = Vec::new();
    let mut position: HashMap<String, usize> = HashMap::new();
    let mut links: Vec<(String, String)> = Vec::new();
    let mut unlinked: Vec<String> = Vec::new();
    let mut roots: HashSet<String> = HashSet::new();

    for source in &sources {
        let name = source.snapshot.metadata.node.as_str();
        let graph = &source.graph;
        for (id, node) in graph.nodes() {
            let at = *position.entry(id.to_string()).or_insert_with(|| {
                staged.push((
                    id.to_string(),
                    AggregatedNode::new(node.slot, node.block_root.clone(), node.parent_root.clone()),
                ));
                staged.len() - 1
            });
            staged[at].1.merge(name, node);

            match graph.parent(id) {
                Ok(Some(parent)) => links.push((parent.to_string(), id.to_string())),
                _ if !node.orphaned => {
                    roots.insert(id.to_string());
                }
                _ => unlinked.push(id.to_string()),
            }
        }
    }

    staged.sort_by_key(|(_, node)| node.slot);
    let slot_start = staged.first().map_or(0, |(_, n)| n.slot);
    let slot_end = staged.last().map_or(0, |(_, n)| n.slot);

    let mut attributes = AggregatedGraphAttributes::default();
    attributes.base.kind = GraphKind::Aggregated;
    attributes.base.slot_start = slot_start;
    attributes.base.slot_end = slot_end;
    attributes.base.id = sources
        .iter()
        .map(|s| s.snapshot.metadata.id.as_str())
        .collect::<Vec<_>>()
        .join(",");
    let mut graph = AggregatedGraph::with_capacity(staged.len(), attributes);
    for (id, node) in staged {
        graph.add_node(id, node);
    }

    for (parent, child) in &links {
        let has_parent = graph.parent(child).is_ok_and(|p| p.is_some());
        if !has_parent {
            if let Err(err) = graph.add_edge(parent, child) {
                debug!(%parent, %child, %err, "source edge rejected");
            }
        }
    }

    let mut orphans = Vec::new();
    let mut seen = HashSet::new();
    for id in unlinked {
        if !seen.insert(id.clone()) || roots.contains(&id) {
            continue;
        }
        if graph.parent(&id).is_ok_and(|p| p.is_some()) {
            continue;
        }
        if !relink(&mut graph, &id) {
            if let Ok(idx) = graph.lookup(&id) {
                orphans.push(OrphanReference::at(&graph, idx));
            }
        }
    }

    let layout = lay_out(&mut graph, orphans);
    let head = aggregated_head(&graph, &sources).or(layout.head);

    let base = &mut graph.attributes_mut().base;
    base.forks = layout.forks;
    base.head = head;
    graph.attributes_mut().nodes = sources.iter().copied().map(source_entry).collect();

    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        forks = layout.forks,
        "aggregated graph"
    );
    graph
}

/// Try to attach `id` to a merged node carrying its parent root.
fn relink(graph: &mut AggregatedGraph, id: &str) -> bool {
    let Ok(node) = graph.node(id) else {
        return false;
    };
    let Some(parent_root) = node.parent_root.clone() else {
        return false;
    };
    let slot = node.slot;
    let parent = graph
        .nodes()
        .find(|(_, n)| n.block_root == parent_root && n.slot < slot)
        .map(|(pid, _)| pid.to_string());
    parent.is_some_and(|parent| graph.add_edge(&parent, id).is_ok())
}

/// The highest-slot source head that survived canonical selection.
fn aggregated_head(graph: &AggregatedGraph, sources: &[&ProcessedSnapshot]) -> Option<String> {
    let mut heads: Vec<(u64, &str)> = sources
        .iter()
        .filter_map(|s| s.graph.attributes().head.as_deref())
        .filter_map(|id| graph.node(id).ok().map(|n| (n.slot, id)))
        .collect();
    heads.sort_by_key(|&(slot, id)| Reverse((slot, id)));
    heads
        .into_iter()
        .find(|(_, id)| graph.node(id).is_ok_and(LayoutNode::canonical))
        .map(|(_, id)| id.to_string())
}

fn source_entry(source: &ProcessedSnapshot) -> AggregatedSource {
    let attributes = source.graph.attributes();
    AggregatedSource {
        metadata: source.snapshot.metadata.clone(),
        head: attributes
            .head
            .as_deref()
            .and_then(|id| source.graph.node(id).ok())
            .cloned(),
        justified_checkpoint: source.snapshot.data.justified_checkpoint.clone(),
        finalized_checkpoint: source.snapshot.data.finalized_checkpoint.clone(),
        forks: attributes.forks,
    }
}
