//! What the renderer draws: nothing, one snapshot, or a merge of several.

use serde::{Serialize, Serializer};

use crate::aggregate::{AggregatedGraph, aggregate};
use crate::config::LayoutConfig;
use crate::error::GraphError;
use crate::graph::{GraphAttributes, GraphKind};
use crate::layout::{Projection, project};
use crate::model::Snapshot;
use crate::weighted::{WeightedGraph, build_weighted_graph};

/// Id given to the graph shown when there is nothing to show.
pub const EMPTY_GRAPH_ID: &str = "empty";

/// A snapshot together with the graph built from it.
#[derive(Debug, Clone)]
pub struct ProcessedSnapshot {
    pub snapshot: Snapshot,
    pub graph: WeightedGraph,
}

impl ProcessedSnapshot {
    /// Build the weighted graph for `snapshot`. The graph id is the
    /// snapshot id.
    ///
    /// # Errors
    ///
    /// Propagates any [`GraphError`] from [`build_weighted_graph`].
    pub fn process(snapshot: Snapshot) -> Result<Self, GraphError> {
        let mut graph = build_weighted_graph(&snapshot.data)?;
        graph.attributes_mut().id.clone_from(&snapshot.metadata.id);
        Ok(Self { snapshot, graph })
    }
}

/// The graph selected for display.
///
/// Serializes as the graph's export (attributes, nodes, edges).
#[derive(Debug, Clone)]
pub enum ForkChoiceView {
    Empty(WeightedGraph),
    Weighted(WeightedGraph),
    Aggregated(AggregatedGraph),
}

impl Serialize for ForkChoiceView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Empty(graph) | Self::Weighted(graph) => graph.export().serialize(serializer),
            Self::Aggregated(graph) => graph.export().serialize(serializer),
        }
    }
}

impl ForkChoiceView {
    /// Zero snapshots give an empty graph, one gives its weighted graph,
    /// more than one are aggregated.
    #[must_use]
    pub fn from_processed(snapshots: &[ProcessedSnapshot]) -> Self {
        match snapshots {
            [] => {
                let mut attributes = GraphAttributes::new(GraphKind::Empty);
                attributes.id = EMPTY_GRAPH_ID.to_string();
                Self::Empty(WeightedGraph::new(attributes))
            }
            [single] => Self::Weighted(single.graph.clone()),
            many => Self::Aggregated(aggregate(many)),
        }
    }

    #[must_use]
    pub fn kind(&self) -> GraphKind {
        self.attributes().kind
    }

    #[must_use]
    pub fn attributes(&self) -> &GraphAttributes {
        match self {
            Self::Empty(graph) | Self::Weighted(graph) => graph.attributes(),
            Self::Aggregated(graph) => &graph.attributes().base,
        }
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        match self {
            Self::Empty(graph) | Self::Weighted(graph) => graph.node_count(),
            Self::Aggregated(graph) => graph.node_count(),
        }
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        match self {
            Self::Empty(graph) | Self::Weighted(graph) => graph.edge_count(),
            Self::Aggregated(graph) => graph.edge_count(),
        }
    }

    /// Screen positions for every node and edge.
    #[must_use]
    pub fn project(&self, config: &LayoutConfig) -> Projection {
        match self {
            Self::Empty(graph) | Self::Weighted(graph) => project(graph, config),
            Self::Aggregated(graph) => project(graph, config),
        }
    }
}
