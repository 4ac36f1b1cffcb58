//! Project a laid-out graph onto screen coordinates.
//!
//! Slots map to x and lanes map to y:
//!
//! ```text
//! x = (slot - slot_start) * spacing_x + spacing_x
//! y = offset * spacing_y - spacing_y
//! ```
//!
//! The projection is plain data for a renderer; nothing here depends on how
//! it is drawn.

#![allow(clippy::cast_precision_loss)]

use serde::Serialize;

use crate::config::LayoutConfig;
use crate::graph::{ForkGraph, GraphAttributes, LayoutNode};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedNode {
    pub id: String,
    pub x: f64,
    pub y: f64,
    /// The node's full attribute set.
    pub attributes: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeEnd {
    pub block_root: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedEdge {
    pub id: String,
    /// Canonical flag of the source (parent) node.
    pub canonical: bool,
    pub source: EdgeEnd,
    pub target: EdgeEnd,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub attributes: GraphAttributes,
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<PositionedEdge>,
    /// Lowest lane in use, never above 0.
    pub min_offset: i64,
    /// Highest lane in use, never below 0.
    pub max_offset: i64,
}

/// Compute positions for every node and edge of `graph`.
#[must_use]
pub fn project<N, G>(graph: &ForkGraph<N, G>, config: &LayoutConfig) -> Projection
where
    N: LayoutNode + Serialize,
    G: AsRef<GraphAttributes>,
{
    let attributes = graph.attributes().as_ref().clone();
    let position = |node: &N| {
        let column = node.slot().saturating_sub(attributes.slot_start) as f64;
        (
            column.mul_add(config.spacing_x, config.spacing_x),
            (node.offset() as f64).mul_add(config.spacing_y, -config.spacing_y),
        )
    };

    let mut min_offset = 0;
    let mut max_offset = 0;
    let nodes = graph
        .nodes()
        .map(|(id, node)| {
            min_offset = min_offset.min(node.offset());
            max_offset = max_offset.max(node.offset());
            let (x, y) = position(node);
            PositionedNode {
                id: id.to_string(),
                x,
                y,
                attributes: serde_json::to_value(node).unwrap_or(serde_json::Value::Null),
            }
        })
        .collect();

    let edges = graph
        .edges()
        .filter_map(|edge| {
            let source = graph.node(edge.source).ok()?;
            let target = graph.node(edge.target).ok()?;
            let end = |node: &N| {
                let (x, y) = position(node);
                EdgeEnd {
                    block_root: node.block_root().to_string(),
                    x,
                    y,
                }
            };
            Some(PositionedEdge {
                id: edge.id.to_string(),
                canonical: source.canonical(),
                source: end(source),
                target: end(target),
            })
        })
        .collect();

    Projection {
        attributes,
        nodes,
        edges,
        min_offset,
        max_offset,
    }
}
