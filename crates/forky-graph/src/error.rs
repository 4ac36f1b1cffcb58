//! Error types for graph construction and graph queries.
//!
//! Three families, kept apart so callers can react to each differently:
//!
//! - [`GraphError`]: fatal construction errors. No partial graph is
//!   returned. Carries the offending [`BlockRecord`] when one exists so a UI
//!   can render a specific "invalid data" diagnostic.
//! - [`LookupError`]: a query named a node, edge or attribute that does not
//!   exist. Consumers degrade the affected row instead of failing a view.
//! - [`EdgeError`]: an edge insertion was refused. Builders treat this as a
//!   structural anomaly (the child becomes an orphan), never as fatal.

use crate::graph::store::EdgeId;
use crate::model::BlockRecord;

/// Fatal error raised while building a graph from a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// The block list is empty or a checkpoint is missing.
    #[error("Invalid data payload")]
    InvalidPayload,

    /// A record's slot is not a non-negative integer.
    #[error("Invalid slot {:?} for block {}", .0.slot, .0.block_root)]
    InvalidSlot(Box<BlockRecord>),

    /// A record's weight is not a non-negative decimal integer.
    #[error("Invalid weight {:?} for block {}", .0.weight, .0.block_root)]
    InvalidWeight(Box<BlockRecord>),
}

impl GraphError {
    /// Stable code identifier (`G####`) for machine parsing.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidPayload => "G1001",
            Self::InvalidSlot(_) => "G1002",
            Self::InvalidWeight(_) => "G1003",
        }
    }

    /// The raw record that caused the failure, if any.
    #[must_use]
    pub fn record(&self) -> Option<&BlockRecord> {
        match self {
            Self::InvalidPayload => None,
            Self::InvalidSlot(record) | Self::InvalidWeight(record) => Some(record),
        }
    }
}

/// A query referenced something the graph does not contain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("edge not found: {0}")]
    EdgeNotFound(EdgeId),

    #[error("attribute {name:?} not found on node {id}")]
    AttributeNotFound { id: String, name: String },

    #[error("no block with root {0} in graph")]
    BlockRootNotFound(String),
}

/// Reason an edge could not be inserted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EdgeError {
    #[error("edge endpoint not found: {0}")]
    MissingEndpoint(String),

    #[error("self loop on {0}")]
    SelfLoop(String),

    #[error("edge {parent} -> {child} already exists")]
    Exists { parent: String, child: String },

    /// The parent does not sit at a strictly lower slot than the child.
    #[error("parent {parent} (slot {parent_slot}) is not before child {child} (slot {child_slot})")]
    NotAscending {
        parent: String,
        parent_slot: u64,
        child: String,
        child_slot: u64,
    },
}
