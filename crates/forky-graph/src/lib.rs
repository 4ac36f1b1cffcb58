#![forbid(unsafe_code)]
//! forky-graph library: fork choice snapshots in, laid-out block graphs out.
//!
//! # Overview
//!
//! - [`weighted::build_weighted_graph`] turns one snapshot into a graph with
//!   a canonical chain on lane 0 and fork branches stacked above and below.
//! - [`aggregate::aggregate`] merges several of those into one consensus
//!   graph.
//! - [`view::ForkChoiceView`] picks between empty, single and aggregated
//!   views; [`layout::project`] maps any of them to coordinates.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums ([`GraphError`], [`LookupError`],
//!   [`EdgeError`]) in library code; `anyhow::Result` only for config
//!   loading.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod error;
pub mod graph;
pub mod layout;
pub mod model;
pub mod summary;
pub mod view;
pub mod weighted;

pub use aggregate::{AggregatedGraph, aggregate};
pub use cache::{CacheError, SnapshotCache};
pub use config::{CacheConfig, ForkyConfig, LayoutConfig, load_config};
pub use error::{EdgeError, GraphError, LookupError};
pub use graph::{ForkGraph, GraphKind};
pub use layout::{Projection, project};
pub use model::{BlockRecord, Checkpoint, CheckpointKind, ForkChoiceData, Snapshot, SnapshotMetadata, Weight};
pub use summary::{BlockSummary, SourceSummary, block_summary, source_summaries};
pub use view::{ForkChoiceView, ProcessedSnapshot};
pub use weighted::{WeightedGraph, build_weighted_graph};
