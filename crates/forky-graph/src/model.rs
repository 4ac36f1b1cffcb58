//! Wire types for fork choice snapshots.
//!
//! These mirror the JSON produced by the snapshot API: `snake_case` field
//! names, and slots, epochs and weights encoded as decimal strings. Shape
//! validation is the importer's job; the graph builder re-validates the
//! fields it depends on (slot, weight, checkpoints).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Weight
// ---------------------------------------------------------------------------

/// Accumulated attestation weight of a block.
///
/// Values routinely exceed `u64`, so this wraps an arbitrary-precision
/// integer. Serialized as a decimal string.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Weight(BigUint);

impl Weight {
    #[must_use]
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// `self` as a percentage of `heaviest`, truncated to two decimals.
    ///
    /// Computed as `(self * 10000 / heaviest) / 100` in integer arithmetic so
    /// very large weights lose no precision before the final conversion.
    /// Returns `0.0` when `heaviest` is zero.
    #[must_use]
    pub fn percentage_of(&self, heaviest: &Self) -> f64 {
        if heaviest.is_zero() {
            return 0.0;
        }
        let scaled = (&self.0 * 10_000u32) / &heaviest.0;
        scaled.to_f64().unwrap_or(f64::MAX) / 100.0
    }
}

impl From<u64> for Weight {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl FromStr for Weight {
    type Err = num_bigint::ParseBigIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BigUint::from_str(s.trim()).map(Self)
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Serialize for Weight {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Weight {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Checkpoints
// ---------------------------------------------------------------------------

/// An epoch/root pair as reported by a beacon node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checkpoint {
    pub epoch: String,
    pub root: String,
}

/// Which checkpoint a block is, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointKind {
    Finalized,
    Justified,
}

impl CheckpointKind {
    /// Classify `block_root` against a snapshot's checkpoints.
    ///
    /// Finalized wins when both checkpoints name the same root.
    #[must_use]
    pub fn classify(block_root: &str, finalized: &Checkpoint, justified: &Checkpoint) -> Option<Self> {
        if block_root == finalized.root {
            Some(Self::Finalized)
        } else if block_root == justified.root {
            Some(Self::Justified)
        } else {
            None
        }
    }
}

impl fmt::Display for CheckpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finalized => f.write_str("finalized"),
            Self::Justified => f.write_str("justified"),
        }
    }
}

/// Canonical validity label. Anything else flags the block.
pub const VALID: &str = "valid";

/// Returns `true` when `validity` is the canonical valid label, ignoring case.
#[must_use]
pub fn is_valid(validity: &str) -> bool {
    validity.eq_ignore_ascii_case(VALID)
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One candidate block in a fork choice snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub slot: String,
    pub block_root: String,
    #[serde(default)]
    pub parent_root: String,
    #[serde(default)]
    pub justified_epoch: String,
    #[serde(default)]
    pub finalized_epoch: String,
    pub weight: String,
    #[serde(default)]
    pub validity: String,
    #[serde(default)]
    pub execution_block_hash: String,
    /// Client-specific fields, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<serde_json::Map<String, serde_json::Value>>,
}

impl BlockRecord {
    /// Parse the slot as a non-negative integer.
    #[must_use]
    pub fn parsed_slot(&self) -> Option<u64> {
        self.slot.trim().parse().ok()
    }

    /// Parse the weight as a non-negative big integer.
    #[must_use]
    pub fn parsed_weight(&self) -> Option<Weight> {
        self.weight.parse().ok()
    }
}

/// Fork choice dump of a single beacon node at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForkChoiceData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justified_checkpoint: Option<Checkpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalized_checkpoint: Option<Checkpoint>,
    #[serde(default)]
    pub fork_choice_nodes: Vec<BlockRecord>,
}

/// Where and when a snapshot was taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub id: String,
    /// Name of the source (beacon node) the snapshot came from.
    pub node: String,
    pub fetched_at: DateTime<Utc>,
    #[serde(default)]
    pub wall_clock_slot: u64,
    #[serde(default)]
    pub wall_clock_epoch: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

/// A snapshot as delivered by the fetch layer: metadata plus data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub metadata: SnapshotMetadata,
    pub data: ForkChoiceData,
}
