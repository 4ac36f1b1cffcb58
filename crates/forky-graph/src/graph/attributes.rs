//! Node and graph attribute types carried by [`ForkGraph`](super::ForkGraph).
//!
//! Attributes serialize with camelCase names since they are the render
//! payload handed to the drawing layer, unlike the `snake_case` wire types in
//! [`crate::model`].

use std::cmp::Ordering;

use serde::Serialize;

use crate::graph::store::LayoutNode;
use crate::model::{Checkpoint, CheckpointKind, SnapshotMetadata, Weight};

/// Percentage given to nodes that never lost a fork comparison.
pub const FULL_WEIGHT_PERCENTAGE: f64 = 100.0;

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Ordering used to pick the canonical child at a fork point.
///
/// `Greater` means `self` should be preferred. Selection keeps the earlier
/// candidate on `Equal`.
pub trait ForkChoiceRank {
    fn rank_cmp(&self, other: &Self) -> Ordering;
}

// ---------------------------------------------------------------------------
// Graph-level attributes
// ---------------------------------------------------------------------------

/// Which builder produced a graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphKind {
    Weighted,
    Aggregated,
    #[default]
    Empty,
}

/// Attributes shared by every graph kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphAttributes {
    pub id: String,
    pub slot_start: u64,
    pub slot_end: u64,
    /// Number of fork branches found during canonical selection.
    pub forks: usize,
    /// Id of the canonical head, if one was found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<String>,
    #[serde(rename = "type")]
    pub kind: GraphKind,
}

impl GraphAttributes {
    #[must_use]
    pub fn new(kind: GraphKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }
}

impl AsRef<Self> for GraphAttributes {
    fn as_ref(&self) -> &Self {
        self
    }
}

/// Per-source entry of an aggregated graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedSource {
    pub metadata: SnapshotMetadata,
    /// Attributes of the source's own head, if it had one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<WeightedNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub justified_checkpoint: Option<Checkpoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finalized_checkpoint: Option<Checkpoint>,
    pub forks: usize,
}

/// Graph attributes of an aggregated graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregatedGraphAttributes {
    #[serde(flatten)]
    pub base: GraphAttributes,
    /// One entry per source, in merge order.
    pub nodes: Vec<AggregatedSource>,
}

impl AsRef<GraphAttributes> for AggregatedGraphAttributes {
    fn as_ref(&self) -> &GraphAttributes {
        &self.base
    }
}

// ---------------------------------------------------------------------------
// Weighted nodes
// ---------------------------------------------------------------------------

/// A block as seen by one source.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightedNode {
    pub slot: u64,
    pub block_root: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_root: Option<String>,
    pub offset: i64,
    pub canonical: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<CheckpointKind>,
    /// Lowercased validity label.
    pub validity: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub execution_block_hash: String,
    pub weight: Weight,
    pub weight_percentage_compared_to_heaviest_neighbor: f64,
    /// The parent could not be resolved within this snapshot.
    pub orphaned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<serde_json::Map<String, serde_json::Value>>,
}

impl WeightedNode {
    /// A canonical, valid node on the centerline.
    #[must_use]
    pub fn new(slot: u64, block_root: impl Into<String>, weight: Weight) -> Self {
        Self {
            slot,
            block_root: block_root.into(),
            parent_root: None,
            offset: 0,
            canonical: true,
            checkpoint: None,
            validity: crate::model::VALID.to_string(),
            execution_block_hash: String::new(),
            weight,
            weight_percentage_compared_to_heaviest_neighbor: FULL_WEIGHT_PERCENTAGE,
            orphaned: false,
            extra_data: None,
        }
    }
}

impl LayoutNode for WeightedNode {
    fn slot(&self) -> u64 {
        self.slot
    }

    fn block_root(&self) -> &str {
        &self.block_root
    }

    fn canonical(&self) -> bool {
        self.canonical
    }

    fn set_canonical(&mut self, canonical: bool) {
        self.canonical = canonical;
    }

    fn offset(&self) -> i64 {
        self.offset
    }

    fn set_offset(&mut self, offset: i64) {
        self.offset = offset;
    }
}

impl ForkChoiceRank for WeightedNode {
    fn rank_cmp(&self, other: &Self) -> Ordering {
        self.weight.cmp(&other.weight)
    }
}

// ---------------------------------------------------------------------------
// Aggregated nodes
// ---------------------------------------------------------------------------

/// Checkpoint label attributed to the source that reported it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SourceCheckpoint {
    pub node: String,
    pub checkpoint: CheckpointKind,
}

/// Validity label attributed to the source that reported it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SourceValidity {
    pub node: String,
    pub validity: String,
}

/// A block merged across every source that reported it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedNode {
    pub slot: u64,
    pub block_root: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_root: Option<String>,
    pub offset: i64,
    pub canonical: bool,
    pub checkpoints: Vec<SourceCheckpoint>,
    pub validities: Vec<SourceValidity>,
    /// Sources in which this block was orphaned.
    pub orphaned: Vec<String>,
    pub highest_weight: Weight,
    pub seen_by_nodes: Vec<String>,
    pub canonical_for_nodes: Vec<String>,
}

impl AggregatedNode {
    /// An unmerged node: no sources yet, zero weight.
    #[must_use]
    pub fn new(slot: u64, block_root: impl Into<String>, parent_root: Option<String>) -> Self {
        Self {
            slot,
            block_root: block_root.into(),
            parent_root,
            offset: 0,
            canonical: true,
            checkpoints: Vec::new(),
            validities: Vec::new(),
            orphaned: Vec::new(),
            highest_weight: Weight::zero(),
            seen_by_nodes: Vec::new(),
            canonical_for_nodes: Vec::new(),
        }
    }

    /// Fold one source's view of this block into the aggregate.
    ///
    /// List attributes are unions keyed by source name; the weight keeps
    /// the maximum seen.
    pub fn merge(&mut self, source: &str, node: &WeightedNode) {
        if let Some(checkpoint) = node.checkpoint {
            let entry = SourceCheckpoint {
                node: source.to_string(),
                checkpoint,
            };
            if !self.checkpoints.contains(&entry) {
                self.checkpoints.push(entry);
            }
        }
        let validity = SourceValidity {
            node: source.to_string(),
            validity: node.validity.clone(),
        };
        if !self.validities.contains(&validity) {
            self.validities.push(validity);
        }
        if node.orphaned {
            push_unique(&mut self.orphaned, source);
        }
        if node.canonical {
            push_unique(&mut self.canonical_for_nodes, source);
        }
        push_unique(&mut self.seen_by_nodes, source);
        if node.weight > self.highest_weight {
            self.highest_weight = node.weight.clone();
        }
    }

    /// Returns `true` if any source reported a non-valid label.
    #[must_use]
    pub fn has_invalid(&self) -> bool {
        self.validities
            .iter()
            .any(|v| !crate::model::is_valid(&v.validity))
    }
}

fn push_unique(list: &mut Vec<String>, source: &str) {
    if !list.iter().any(|s| s == source) {
        list.push(source.to_string());
    }
}

impl LayoutNode for AggregatedNode {
    fn slot(&self) -> u64 {
        self.slot
    }

    fn block_root(&self) -> &str {
        &self.block_root
    }

    fn canonical(&self) -> bool {
        self.canonical
    }

    fn set_canonical(&mut self, canonical: bool) {
        self.canonical = canonical;
    }

    fn offset(&self) -> i64 {
        self.offset
    }

    fn set_offset(&mut self, offset: i64) {
        self.offset = offset;
    }
}

impl ForkChoiceRank for AggregatedNode {
    /// Most sources agreeing it is canonical, then highest weight, then
    /// widest visibility, then block root (larger wins).
    fn rank_cmp(&self, other: &Self) -> Ordering {
        self.canonical_for_nodes
            .len()
            .cmp(&other.canonical_for_nodes.len())
            .then_with(|| self.highest_weight.cmp(&other.highest_weight))
            .then_with(|| self.seen_by_nodes.len().cmp(&other.seen_by_nodes.len()))
            .then_with(|| self.block_root.cmp(&other.block_root))
    }
}
